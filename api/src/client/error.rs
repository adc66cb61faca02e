//! An error from the Sonar operator
use futures::executor::block_on;
use reqwest::StatusCode;

/// An error from the Sonar operator
#[derive(Debug)]
pub enum Error {
    /// An error response from a managed cluster's REST api
    Cluster {
        code: StatusCode,
        msg: Option<String>,
    },
    /// A generic error with a message
    Generic(String),
    /// An error from sending or recieving a request
    Reqwest(reqwest::Error),
    /// An IO Error
    IO(std::io::Error),
    /// An error from converting a value with serde
    Serde(serde_json::Error),
    /// An error from loading a config
    Config(config::ConfigError),
    /// An error from parsing a URL
    UrlParse(url::ParseError),
    /// An error casting bytes to a utf8 formatted string
    StringFromUtf8(std::string::FromUtf8Error),
    /// An error from the k8s client
    #[cfg(feature = "k8s")]
    K8s(kube::Error),
    /// An error from getting a k8s config
    #[cfg(feature = "k8s")]
    K8sConfig(kube::config::KubeconfigError),
}

impl Error {
    /// Create a new generic error
    ///
    /// # Arguments
    ///
    /// * `msg` - The error message to set
    pub fn new<T: Into<String>>(msg: T) -> Self {
        Error::Generic(msg.into())
    }

    /// Get the status code from this error if one exists
    pub fn status(&self) -> Option<StatusCode> {
        // get the status code from any error types that support it
        match self {
            Error::Cluster { code, .. } => Some(code.to_owned()),
            Error::Reqwest(err) => err.status(),
            #[cfg(feature = "k8s")]
            Error::K8s(err) => match err {
                kube::Error::Api(resp) => StatusCode::from_u16(resp.code).ok(),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the error message for this error if one exists
    pub fn msg(&self) -> Option<String> {
        // get the msg from any error types that support it
        match self {
            Error::Cluster { msg, .. } => msg.clone(),
            Error::Generic(msg) => Some(msg.clone()),
            Error::Reqwest(err) => Some(err.to_string()),
            Error::IO(err) => Some(err.to_string()),
            Error::Serde(err) => Some(err.to_string()),
            Error::Config(err) => Some(err.to_string()),
            Error::UrlParse(err) => Some(err.to_string()),
            Error::StringFromUtf8(err) => Some(err.to_string()),
            #[cfg(feature = "k8s")]
            Error::K8s(err) => Some(err.to_string()),
            #[cfg(feature = "k8s")]
            Error::K8sConfig(err) => Some(err.to_string()),
        }
    }

    /// get the kind of error as a str
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Cluster { .. } => "Cluster",
            Error::Generic(_) => "Generic",
            Error::Reqwest(_) => "Reqwest",
            Error::IO(_) => "IO",
            Error::Serde(_) => "Serde",
            Error::Config(_) => "Config",
            Error::UrlParse(_) => "UrlParse",
            Error::StringFromUtf8(_) => "StringFromUtf8",
            #[cfg(feature = "k8s")]
            Error::K8s(_) => "K8s",
            #[cfg(feature = "k8s")]
            Error::K8sConfig(_) => "K8sConf",
        }
    }
}

impl std::fmt::Display for Error {
    /// display this error in a easy readble format
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.status(), self.msg()) {
            (Some(code), Some(msg)) => write!(f, "Code: {} Error: {}", code, msg),
            (None, Some(msg)) => write!(f, "Error: {}", msg),
            (Some(code), None) => write!(f, "Code: {}", code),
            (None, None) => write!(f, "Kind: {}", self.kind()),
        }
    }
}

// mark that this is an error struct
impl std::error::Error for Error {}

impl From<reqwest::Response> for Error {
    fn from(resp: reqwest::Response) -> Self {
        Error::Cluster {
            code: resp.status(),
            msg: block_on(resp.text()).ok().filter(|s| !s.is_empty()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Reqwest(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Serde(error)
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Error::UrlParse(error)
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(error: std::string::FromUtf8Error) -> Self {
        Error::StringFromUtf8(error)
    }
}

#[cfg(feature = "k8s")]
impl From<kube::Error> for Error {
    fn from(error: kube::Error) -> Self {
        Error::K8s(error)
    }
}

#[cfg(feature = "k8s")]
impl From<kube::config::KubeconfigError> for Error {
    fn from(error: kube::config::KubeconfigError) -> Self {
        Error::K8sConfig(error)
    }
}
