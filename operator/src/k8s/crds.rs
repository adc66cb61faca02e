//! The SonarCluster custom resource definition

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{Api, Patch, PatchParams},
    core::CustomResourceExt,
    runtime::{conditions, wait::await_condition},
    Client,
};
use kube_derive::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sonar::models::{ClusterStatus, GeneralSettings, NodePool};
use sonar::Error;
use tracing::{event, Level};

pub const CRD_NAME: &str = "sonarclusters.sonar.io";

/// SonarCluster CRD definition
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "sonar.io",
    version = "v1",
    kind = "SonarCluster",
    namespaced,
    status = "ClusterStatus",
    doc = "Custom resource representing a managed search cluster"
)]
pub struct SonarClusterSpec {
    /// Settings shared by the whole cluster
    pub general: GeneralSettings,
    /// The node pools making up this cluster
    #[serde(default, rename = "nodePools")]
    pub node_pools: Vec<NodePool>,
}

/// Create or update the SonarCluster CRD
///
/// # Arguments
///
/// * `client` - The kube client to apply the CRD with
pub async fn create_or_update(client: &Client) -> Result<(), Error> {
    let params = PatchParams::apply("sonar_cluster_apply").force();
    let crd_api: Api<CustomResourceDefinition> = Api::all(client.clone());
    // create the CRD for this operator version or patch it if it already exists
    crd_api
        .patch(CRD_NAME, &params, &Patch::Apply(SonarCluster::crd()))
        .await?;
    // wait for crd to be setup
    let established = await_condition(crd_api, CRD_NAME, conditions::is_crd_established());
    // timeout if CRD isn't setup in N seconds
    let result = tokio::time::timeout(tokio::time::Duration::from_secs(30), established).await;
    // ensure CRD is established before continuing on
    match result {
        Ok(_) => {
            event!(Level::INFO, "SonarCluster CRD applied");
            Ok(())
        }
        Err(_) => Err(Error::new(
            "Timed out waiting for SonarCluster CRD to be established".to_owned(),
        )),
    }
}
