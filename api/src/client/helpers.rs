//! Helper macros for the clients in Sonar

/// Send a request and if its successful deserialize the response body
#[doc(hidden)]
#[macro_export]
macro_rules! send_build {
    ($client:expr, $req:expr, $build:ty) => {
        // attempt to send request
        match $client.execute($req.build()?).await {
            // response was received
            Ok(resp) => {
                // check if a response has an error status or not
                if resp.status().is_success() {
                    // attempt to build this response or return an error
                    match resp.json::<$build>().await {
                        // successfully built object
                        Ok(val) => Ok(val),
                        // failed to build object create error
                        Err(e) => Err(Error::from(e)),
                    }
                } else {
                    // the response had an error status
                    Err(Error::from(resp))
                }
            }
            Err(e) => Err(Error::from(e)),
        }
    };
}
