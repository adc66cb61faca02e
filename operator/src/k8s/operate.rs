//! Applies spec changes to managed search clusters

use kube::runtime::controller::Action;
use sonar::models::WorkloadRef;
use sonar::{Conf, Error};
use tokio::time::Duration;
use tracing::{event, instrument, Level};

use super::clusters::ClusterMeta;
use super::orchestrator::K8sOrchestrator;
use super::scaler::{Orchestrator, Scaler};
use super::statefulsets;

/// Reconcile one tick for a managed cluster
///
/// Every node pool advances at most one step per tick; a resize that needs
/// more steps picks back up from its persisted status on the next tick.
///
/// # Arguments
///
/// * `meta` - The cluster client and metadata being operated
/// * `conf` - The operator config
#[instrument(name = "operate::apply", skip_all, fields(cluster = %meta.name), err(Debug))]
pub async fn apply(meta: &ClusterMeta, conf: &Conf) -> Result<Action, Error> {
    // snapshot the persisted statuses; they are the only record of progress
    let mut statuses = meta.cluster.status.clone().unwrap_or_default();
    // build the collaborators the scalers drive
    let mut ops = K8sOrchestrator::new(meta, conf).await?;
    let mut deltas = Vec::new();
    // walk this cluster's pools in group order
    for (group, pool) in meta.cluster.spec.node_pools.iter().enumerate() {
        // read the workload observed for this pool
        let sts = statefulsets::get(meta, pool).await?;
        let workload = WorkloadRef::try_from(&sts)?;
        // advance this pool a single step
        let mut scaler = Scaler::new(group, pool, workload, &mut statuses, &mut ops);
        deltas.extend(scaler.reconcile().await?);
    }
    // write the folded statuses back once for the whole tick
    if !deltas.is_empty() {
        ops.update_statuses(&statuses).await?;
    }
    Ok(Action::requeue(Duration::from_secs(conf.operator.requeue)))
}

/// Tear down operator state for a deleted cluster
///
/// The builder owns the workloads and services behind a cluster and the
/// scaler keeps no state outside the resource status being deleted with it.
///
/// # Arguments
///
/// * `meta` - The cluster client and metadata being deleted
pub async fn cleanup(meta: &ClusterMeta) -> Result<Action, Error> {
    event!(
        Level::INFO,
        "Cleaned up SonarCluster {} in namespace {}",
        meta.name,
        meta.namespace
    );
    Ok(Action::await_change())
}
