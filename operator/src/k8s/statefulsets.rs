//! Reads and resizes the stateful workloads backing node pools

use k8s_openapi::api::apps::v1::StatefulSet;
use kube::api::{Patch, PatchParams};
use sonar::models::{NodePool, WorkloadRef};
use sonar::Error;

use super::clusters::ClusterMeta;
use crate::app::builders;

/// Get the observed statefulset backing a node pool
///
/// The statefulset itself is built by the cluster builder; the scaler only
/// reads it and adjusts its replica target.
///
/// # Arguments
///
/// * `meta` - The cluster client and metadata
/// * `pool` - The node pool to get the workload for
pub async fn get(meta: &ClusterMeta, pool: &NodePool) -> Result<StatefulSet, Error> {
    // node pool workloads are named after their cluster and component
    let name = builders::workload_name(&meta.name, pool);
    Ok(meta.sts_api.get(&name).await?)
}

/// Persist a workload's replica target
///
/// # Arguments
///
/// * `meta` - The cluster client and metadata
/// * `workload` - The workload reference carrying the new replica target
pub async fn set_replicas(meta: &ClusterMeta, workload: &WorkloadRef) -> Result<(), Error> {
    // only the replica count is patched; everything else belongs to the builder
    let patch = serde_json::json!({
        "spec": {
            "replicas": workload.current_replicas
        }
    });
    meta.sts_api
        .patch(&workload.name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}
