//! Metadata wrappers for the SonarCluster resources being operated

use k8s_openapi::api::{apps::v1::StatefulSet, core::v1::Secret};
use kube::{Api, Client};
use sonar::Error;
use std::sync::Arc;

use super::crds::SonarCluster;

/// Wrapper for SonarCluster metadata
#[derive(Clone)]
pub struct ClusterMeta {
    /// namespace in k8s
    pub namespace: String,
    /// name of the SonarCluster instance
    pub name: String,
    /// kube api client
    pub client: Client,
    /// the cluster custom resource being operated
    pub cluster: Arc<SonarCluster>,
    /// k8s api instance for SonarClusters
    pub clusters_api: Api<SonarCluster>,
    /// k8s api instance for StatefulSets
    pub sts_api: Api<StatefulSet>,
    /// k8s api instance for Secrets
    pub secret_api: Api<Secret>,
}

impl ClusterMeta {
    /// Build a new wrapper for cluster metadata
    ///
    /// # Arguments
    ///
    /// * `cluster` - The SonarCluster being operated
    /// * `client` - The kube api client to use
    pub async fn new(cluster: &Arc<SonarCluster>, client: &Client) -> Result<Self, Error> {
        // grab the cluster name from the SonarCluster metadata
        let name = match cluster.metadata.name.as_ref() {
            Some(cluster_name) => cluster_name.clone(),
            None => {
                return Err(Error::new(
                    "Could not get SonarCluster name from metadata".to_owned(),
                ));
            }
        };
        // grab the namespace from the SonarCluster metadata
        let namespace = match cluster.metadata.namespace.as_ref() {
            Some(cluster_namespace) => cluster_namespace.clone(),
            None => {
                return Err(Error::new(
                    "Could not get SonarCluster namespace from metadata".to_owned(),
                ));
            }
        };
        // build the kube api handles scoped to this namespace
        let clusters_api: Api<SonarCluster> = Api::namespaced(client.clone(), &namespace);
        let sts_api: Api<StatefulSet> = Api::namespaced(client.clone(), &namespace);
        let secret_api: Api<Secret> = Api::namespaced(client.clone(), &namespace);
        // return the built cluster meta
        Ok(ClusterMeta {
            namespace,
            name,
            client: client.clone(),
            cluster: cluster.clone(),
            clusters_api,
            sts_api,
            secret_api,
        })
    }
}
