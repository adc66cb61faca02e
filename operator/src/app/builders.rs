//! Adapters onto the builder that owns a cluster's workloads and services
//!
//! The builder constructs the statefulsets, services, and secrets behind a
//! managed cluster; the operator only derives names, urls, and credentials
//! from what it built.

use sonar::conf::GatewaySettings;
use sonar::models::NodePool;
use sonar::Error;

use crate::k8s::clusters::ClusterMeta;

/// The stock admin user for clusters without a credentials secret
const DEFAULT_USERNAME: &str = "admin";

/// The stock admin password for clusters without a credentials secret
const DEFAULT_PASSWORD: &str = "admin";

/// Get the name of the workload backing a node pool
///
/// # Arguments
///
/// * `cluster` - The name of the cluster the pool belongs to
/// * `pool` - The node pool to name the workload for
pub fn workload_name(cluster: &str, pool: &NodePool) -> String {
    format!("{}-{}", cluster, pool.component)
}

/// Build the url a managed cluster's REST api can be reached at
///
/// # Arguments
///
/// * `meta` - The cluster client and metadata
/// * `settings` - The gateway settings to apply
pub fn cluster_url(meta: &ClusterMeta, settings: &GatewaySettings) -> String {
    let general = &meta.cluster.spec.general;
    format!(
        "{}://{}.{}.svc.cluster.local:{}",
        settings.scheme, general.service_name, meta.namespace, general.http_port
    )
}

/// Look up the admin credentials for a managed cluster
///
/// # Arguments
///
/// * `meta` - The cluster client and metadata
pub async fn username_and_password(meta: &ClusterMeta) -> Result<(String, String), Error> {
    // clusters without a credentials secret use the stock admin user
    let secret_name = match &meta.cluster.spec.general.credentials_secret {
        Some(name) => name,
        None => return Ok((DEFAULT_USERNAME.to_owned(), DEFAULT_PASSWORD.to_owned())),
    };
    // read the secret the builder created for this cluster
    let secret = meta.secret_api.get(secret_name).await?;
    let data = secret.data.unwrap_or_default();
    // pull out the username and password keys
    let username = match data.get("username") {
        Some(raw) => String::from_utf8(raw.0.clone())?,
        None => {
            return Err(Error::new(format!(
                "Secret {} has no username key",
                secret_name
            )));
        }
    };
    let password = match data.get("password") {
        Some(raw) => String::from_utf8(raw.0.clone())?,
        None => {
            return Err(Error::new(format!(
                "Secret {} has no password key",
                secret_name
            )));
        }
    };
    Ok((username, password))
}
