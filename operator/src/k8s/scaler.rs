//! Scales the node pools of a managed search cluster one replica at a time
//!
//! Growing a pool is a mechanical resize. Shrinking walks a persisted state
//! machine instead: the highest ordinal node is first excluded from shard
//! allocation, then observed until the cluster has drained it, and only then
//! is the workload shrunk. The persisted component status is the only record
//! of where that walk is; every tick rederives its step from it.

use async_trait::async_trait;
use sonar::models::{ClusterStatus, ComponentPhase, ComponentStatus, NodePool, WorkloadRef};
use sonar::{Error, Gateway};
use tracing::{event, instrument, Level};

/// The reasons attached to the events the scaler emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleReason {
    /// A node was added to a pool
    AddedNode,
    /// A node could not be added to a pool
    FailedToAddNode,
    /// A node was excluded from shard allocation ahead of removal
    ExcludedNode,
    /// The cluster rejected an exclusion
    FailedToExcludeNode,
    /// An excluded node still holds shards
    DrainingNode,
    /// An excluded node has been observed shard free
    NodeHasDrained,
    /// A pool was shrunk by one node
    DecreaseNode,
    /// A pool could not be shrunk
    FailedToRemoveNode,
    /// A node's exclusion could not be lifted
    FailedToRemoveNodeExclude,
}

impl ScaleReason {
    /// Get this reason as a str
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleReason::AddedNode => "added node",
            ScaleReason::FailedToAddNode => "failed to add node",
            ScaleReason::ExcludedNode => "excluded node",
            ScaleReason::FailedToExcludeNode => "failed to exclude node",
            ScaleReason::DrainingNode => "draining node",
            ScaleReason::NodeHasDrained => "node has drained",
            ScaleReason::DecreaseNode => "decrease node",
            ScaleReason::FailedToRemoveNode => "failed to remove node",
            ScaleReason::FailedToRemoveNodeExclude => "failed to remove node exclude",
        }
    }

    /// Whether events with this reason warn instead of inform
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ScaleReason::FailedToAddNode
                | ScaleReason::FailedToExcludeNode
                | ScaleReason::FailedToRemoveNode
                | ScaleReason::FailedToRemoveNodeExclude
        )
    }
}

/// The capabilities the scaler needs from its orchestrator
///
/// The scaler never talks to k8s or the managed cluster directly; everything
/// flows through these injected collaborators so tests can swap in memory
/// fakes for all of them.
#[async_trait]
pub trait Orchestrator {
    /// The gateway type used to talk to the managed cluster's REST api
    type Gateway: Gateway + Send + Sync;

    /// Persist a new replica target for a node pool workload
    ///
    /// # Arguments
    ///
    /// * `workload` - The workload reference carrying the new target
    async fn update_workload(&mut self, workload: &WorkloadRef) -> Result<(), Error>;

    /// Persist the component statuses on the managed resource
    ///
    /// # Arguments
    ///
    /// * `statuses` - The status collection to persist
    async fn update_statuses(&mut self, statuses: &ClusterStatus) -> Result<(), Error>;

    /// Build a gateway to the managed cluster's REST api
    async fn gateway(&self) -> Result<Self::Gateway, Error>;

    /// Emit an advisory event
    ///
    /// Events are best effort; scaling correctness never depends on them.
    ///
    /// # Arguments
    ///
    /// * `reason` - The reason for this event
    /// * `msg` - The message describing this event
    async fn emit(&mut self, reason: ScaleReason, msg: String);
}

/// Reconciles one node pool of a managed cluster towards its desired size
pub struct Scaler<'a, O: Orchestrator> {
    /// The index of the node pool this scaler is bound to
    group: usize,
    /// The desired spec for this pool
    pool: &'a NodePool,
    /// The observed workload backing this pool
    workload: WorkloadRef,
    /// The persisted component statuses for this cluster
    statuses: &'a mut ClusterStatus,
    /// The injected orchestrator capabilities
    ops: &'a mut O,
}

impl<'a, O: Orchestrator> Scaler<'a, O> {
    /// Bind a scaler to one node pool for a single tick
    ///
    /// # Arguments
    ///
    /// * `group` - The index of the node pool being scaled
    /// * `pool` - The desired spec for this pool
    /// * `workload` - The observed workload backing this pool
    /// * `statuses` - The persisted component statuses for this cluster
    /// * `ops` - The orchestrator capabilities to scale with
    pub fn new(
        group: usize,
        pool: &'a NodePool,
        workload: WorkloadRef,
        statuses: &'a mut ClusterStatus,
        ops: &'a mut O,
    ) -> Self {
        Scaler {
            group,
            pool,
            workload,
            statuses,
            ops,
        }
    }

    /// Get the tag identifying this scaler's group in statuses and events
    fn group_tag(&self) -> String {
        format!("Group-{}", self.group)
    }

    /// Get the name of the highest ordinal replica in this pool
    ///
    /// This is always the node subject to removal on a shrink.
    fn last_node(&self) -> String {
        format!("{}-{}", self.workload.name, self.workload.current_replicas - 1)
    }

    /// Advance this pool one step towards its desired size
    ///
    /// Returns the status records written this tick so the driver can fold
    /// them into its view; either an empty or a single element list.
    #[instrument(name = "Scaler::reconcile", skip_all, fields(group = self.group), err(Debug))]
    pub async fn reconcile(&mut self) -> Result<Vec<ComponentStatus>, Error> {
        // how far the observed workload is from the desired spec
        let diff = self.workload.current_replicas - self.pool.replicas;
        let tag = self.group_tag();
        // find the persisted scaler record for this group
        let current = self
            .statuses
            .find(|status| status.component == "Scaler" && status.description == tag)
            .cloned();
        match current {
            // a shrink is mid flight; keep walking it even if the desired
            // size has changed again since
            Some(current) if current.status == ComponentPhase::Excluded => {
                self.drain_node(current).await
            }
            Some(current) if current.status == ComponentPhase::Drained => {
                self.remove_node(current).await
            }
            // no resize in flight; a Running record only marks a rejected
            // exclusion and does not block a new attempt
            _ => {
                if diff > 0 {
                    self.exclude_node().await
                } else if diff < 0 {
                    self.add_node().await
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    /// Grow this pool by a single replica
    async fn add_node(&mut self) -> Result<Vec<ComponentStatus>, Error> {
        let tag = self.group_tag();
        // grow by one and persist the new target
        self.workload.current_replicas += 1;
        let node = format!("{}-{}", self.workload.name, self.workload.current_replicas);
        if let Err(error) = self.ops.update_workload(&self.workload).await {
            self.ops
                .emit(
                    ScaleReason::FailedToAddNode,
                    format!("{} . failed to add node {}", tag, node),
                )
                .await;
            return Err(error);
        }
        self.ops
            .emit(
                ScaleReason::AddedNode,
                format!("{} . added node {}", tag, node),
            )
            .await;
        Ok(Vec::new())
    }

    /// Start a shrink by excluding the highest ordinal node from allocation
    ///
    /// The workload is written through with its replica target unchanged;
    /// the target only drops once the node has been observed shard free.
    async fn exclude_node(&mut self) -> Result<Vec<ComponentStatus>, Error> {
        let tag = self.group_tag();
        let node = self.last_node();
        // ask the cluster to migrate shards off of the node being removed
        let gateway = self.ops.gateway().await?;
        let excluded = gateway.append_exclusion(&node).await?;
        // push the workload through unchanged before any status lands; if
        // this write fails the tick aborts with no status written and the
        // next tick reissues the idempotent exclusion
        self.ops.update_workload(&self.workload).await?;
        // record how far this shrink got; a rejected exclusion is marked so
        // other subsystems can still see a resize is pending
        let status = if excluded {
            self.ops
                .emit(
                    ScaleReason::ExcludedNode,
                    format!("{} . excluded node {}", tag, node),
                )
                .await;
            ComponentStatus::scaler(ComponentPhase::Excluded, tag.clone())
        } else {
            self.ops
                .emit(
                    ScaleReason::FailedToExcludeNode,
                    format!("{} . failed to exclude node {}", tag, node),
                )
                .await;
            ComponentStatus::scaler(ComponentPhase::Running, tag.clone())
        };
        // swap out any prior record for this group and persist
        let probe = ComponentStatus::scaler(ComponentPhase::Unset, tag);
        self.statuses.replace(&probe, status.clone());
        if let Err(error) = self.ops.update_statuses(self.statuses).await {
            // the exclusion is already in place and idempotent so the next
            // tick can safely retry from the workload state
            event!(
                Level::WARN,
                node = node,
                error = error.to_string(),
                "failed to persist scaler status"
            );
            return Err(error);
        }
        Ok(vec![status])
    }

    /// Check whether an excluded node has finished draining
    ///
    /// # Arguments
    ///
    /// * `current` - The persisted record for this group
    async fn drain_node(&mut self, current: ComponentStatus) -> Result<Vec<ComponentStatus>, Error> {
        let tag = self.group_tag();
        let node = self.last_node();
        let gateway = self.ops.gateway().await?;
        // the cluster only migrates shards while the node is live and excluded
        if gateway.has_shards_on_node(&node).await? {
            self.ops
                .emit(
                    ScaleReason::DrainingNode,
                    format!("{} . draining node {}", tag, node),
                )
                .await;
            return Ok(Vec::new());
        }
        // the node is empty; lift the exclusion before its slot disappears so
        // stale exclusions never pile up across scale downs
        if !gateway.remove_exclusion(&node).await? {
            self.ops
                .emit(
                    ScaleReason::FailedToRemoveNodeExclude,
                    format!(
                        "{} . node {} is empty but is still excluded from allocation",
                        tag, node
                    ),
                )
                .await;
            return Ok(Vec::new());
        }
        self.ops
            .emit(
                ScaleReason::NodeHasDrained,
                format!("{} . node {} has drained", tag, node),
            )
            .await;
        // mark this node drained and persist
        let status = ComponentStatus::scaler(ComponentPhase::Drained, tag);
        self.statuses.replace(&current, status.clone());
        if let Err(error) = self.ops.update_statuses(self.statuses).await {
            event!(
                Level::WARN,
                node = node,
                error = error.to_string(),
                "failed to persist scaler status"
            );
            return Err(error);
        }
        Ok(vec![status])
    }

    /// Finish a shrink by dropping the drained node from the workload
    ///
    /// # Arguments
    ///
    /// * `current` - The persisted record for this group
    async fn remove_node(
        &mut self,
        current: ComponentStatus,
    ) -> Result<Vec<ComponentStatus>, Error> {
        let tag = self.group_tag();
        // shrink by one and persist the new target
        self.workload.current_replicas -= 1;
        // the node that drained is now the ordinal past the new count
        let node = format!("{}-{}", self.workload.name, self.workload.current_replicas);
        if let Err(error) = self.ops.update_workload(&self.workload).await {
            self.ops
                .emit(
                    ScaleReason::FailedToRemoveNode,
                    format!("{} . failed to remove node {}", tag, node),
                )
                .await;
            return Err(error);
        }
        self.ops
            .emit(
                ScaleReason::DecreaseNode,
                format!("{} . removed node {}", tag, node),
            )
            .await;
        // this shrink is resolved so drop its record in the same status write
        self.statuses.remove(&current);
        if let Err(error) = self.ops.update_statuses(self.statuses).await {
            self.ops
                .emit(
                    ScaleReason::FailedToRemoveNodeExclude,
                    format!("{} . failed to remove node exclude {}", tag, node),
                )
                .await;
            return Err(error);
        }
        // lift the exclusion once more in case the earlier removal raced a
        // failed status write; the gateway keeps this idempotent
        let gateway = match self.ops.gateway().await {
            Ok(gateway) => gateway,
            Err(error) => {
                self.ops
                    .emit(
                        ScaleReason::FailedToRemoveNodeExclude,
                        format!("{} . failed to remove node exclude {}", tag, node),
                    )
                    .await;
                return Err(error);
            }
        };
        match gateway.remove_exclusion(&node).await {
            Ok(true) => (),
            Ok(false) => {
                self.ops
                    .emit(
                        ScaleReason::FailedToRemoveNodeExclude,
                        format!("{} . failed to remove node exclude {}", tag, node),
                    )
                    .await;
            }
            Err(error) => {
                self.ops
                    .emit(
                        ScaleReason::FailedToRemoveNodeExclude,
                        format!("{} . failed to remove node exclude {}", tag, node),
                    )
                    .await;
                return Err(error);
            }
        }
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::{Orchestrator, ScaleReason, Scaler};
    use async_trait::async_trait;
    use sonar::models::{ClusterStatus, ComponentPhase, ComponentStatus, NodePool, WorkloadRef};
    use sonar::{Error, Gateway};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// The shared state behind a fake gateway
    #[derive(Default)]
    struct GatewayState {
        /// The nodes currently excluded from allocation
        exclusions: Vec<String>,
        /// The nodes that still hold shards
        occupied: HashSet<String>,
        /// Whether settings updates should be rejected
        reject: bool,
        /// Whether every call should fail outright
        down: bool,
        /// How many exclusion removals have been requested
        removals: usize,
    }

    /// An in memory stand in for a managed cluster's REST api
    #[derive(Clone, Default)]
    struct FakeGateway {
        state: Arc<Mutex<GatewayState>>,
    }

    #[async_trait]
    impl Gateway for FakeGateway {
        async fn append_exclusion(&self, node: &str) -> Result<bool, Error> {
            let mut state = self.state.lock().unwrap();
            if state.down {
                return Err(Error::new("gateway is down"));
            }
            if state.reject {
                return Ok(false);
            }
            if !state.exclusions.iter().any(|name| name == node) {
                state.exclusions.push(node.to_owned());
            }
            Ok(true)
        }

        async fn remove_exclusion(&self, node: &str) -> Result<bool, Error> {
            let mut state = self.state.lock().unwrap();
            if state.down {
                return Err(Error::new("gateway is down"));
            }
            state.removals += 1;
            if state.reject {
                return Ok(false);
            }
            state.exclusions.retain(|name| name != node);
            Ok(true)
        }

        async fn has_shards_on_node(&self, node: &str) -> Result<bool, Error> {
            let state = self.state.lock().unwrap();
            if state.down {
                return Err(Error::new("gateway is down"));
            }
            Ok(state.occupied.contains(node))
        }
    }

    /// An in memory stand in for the k8s backed orchestrator
    #[derive(Default)]
    struct FakeOrchestrator {
        /// The fake cluster this orchestrator hands out gateways to
        gateway: FakeGateway,
        /// The replica targets persisted by the scaler
        workloads: Vec<WorkloadRef>,
        /// The status collections persisted by the scaler
        statuses: Vec<ClusterStatus>,
        /// The events emitted by the scaler
        events: Vec<(ScaleReason, String)>,
        /// Whether workload updates should fail
        fail_workloads: bool,
    }

    #[async_trait]
    impl Orchestrator for FakeOrchestrator {
        type Gateway = FakeGateway;

        async fn update_workload(&mut self, workload: &WorkloadRef) -> Result<(), Error> {
            if self.fail_workloads {
                return Err(Error::new("workload update rejected"));
            }
            self.workloads.push(workload.clone());
            Ok(())
        }

        async fn update_statuses(&mut self, statuses: &ClusterStatus) -> Result<(), Error> {
            self.statuses.push(statuses.clone());
            Ok(())
        }

        async fn gateway(&self) -> Result<FakeGateway, Error> {
            Ok(self.gateway.clone())
        }

        async fn emit(&mut self, reason: ScaleReason, msg: String) {
            self.events.push((reason, msg));
        }
    }

    /// Build a node pool spec
    fn pool(component: &str, replicas: i32) -> NodePool {
        NodePool {
            component: component.to_owned(),
            replicas,
            roles: vec!["data".to_owned()],
        }
    }

    /// Build an observed workload reference
    fn workload(name: &str, current_replicas: i32) -> WorkloadRef {
        WorkloadRef {
            name: name.to_owned(),
            current_replicas,
        }
    }

    #[tokio::test]
    async fn grows_a_pool_by_one() {
        let pool = pool("nodes", 4);
        let mut statuses = ClusterStatus::default();
        let mut ops = FakeOrchestrator::default();
        // one tick should bump the workload from 3 to 4
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 3), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(ops.workloads, vec![workload("cluster-test-nodes", 4)]);
        // growing never writes a scaler status
        assert!(statuses.components_status.is_empty());
        assert!(ops.statuses.is_empty());
        // one added node event naming the new node
        assert_eq!(ops.events.len(), 1);
        assert_eq!(ops.events[0].0, ScaleReason::AddedNode);
        assert!(ops.events[0].1.contains("cluster-test-nodes-4"));
    }

    #[tokio::test]
    async fn shrinks_a_pool_across_ticks() {
        let pool = pool("nodes", 3);
        let mut statuses = ClusterStatus::default();
        let mut ops = FakeOrchestrator::default();
        // the doomed node still holds shards at first
        ops.gateway
            .state
            .lock()
            .unwrap()
            .occupied
            .insert("cluster-test-nodes-3".to_owned());
        // tick 1: the node gets excluded; the workload is written through
        // but its replica target stays at 4
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta[0].status, ComponentPhase::Excluded);
        assert_eq!(ops.workloads, vec![workload("cluster-test-nodes", 4)]);
        assert_eq!(
            ops.gateway.state.lock().unwrap().exclusions,
            vec!["cluster-test-nodes-3"]
        );
        // tick 2: still draining; nothing changes but a draining event
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(ops.events.last().unwrap().0, ScaleReason::DrainingNode);
        assert_eq!(statuses.components_status[0].status, ComponentPhase::Excluded);
        // tick 3: the node is empty so the exclusion lifts and we mark drained
        ops.gateway.state.lock().unwrap().occupied.clear();
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert_eq!(delta[0].status, ComponentPhase::Drained);
        assert!(ops.gateway.state.lock().unwrap().exclusions.is_empty());
        // tick 4: the workload shrinks and the scaler record is dropped
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(ops.workloads.last(), Some(&workload("cluster-test-nodes", 3)));
        assert!(statuses.components_status.is_empty());
        // the exclusion was removed once on drain and once as race defense
        assert_eq!(ops.gateway.state.lock().unwrap().removals, 2);
        // tick 5: converged; nothing left to do
        let events = ops.events.len();
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 3), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(ops.events.len(), events);
    }

    #[tokio::test]
    async fn marks_rejected_exclusions_and_retries() {
        let pool = pool("nodes", 3);
        let mut statuses = ClusterStatus::default();
        let mut ops = FakeOrchestrator::default();
        ops.gateway.state.lock().unwrap().reject = true;
        // a rejected exclusion writes the Running sentinel and leaves the
        // replica target alone
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert_eq!(delta[0].status, ComponentPhase::Running);
        assert_eq!(ops.workloads, vec![workload("cluster-test-nodes", 4)]);
        assert_eq!(ops.events.last().unwrap().0, ScaleReason::FailedToExcludeNode);
        // the sentinel does not block the retry once the cluster recovers
        ops.gateway.state.lock().unwrap().reject = false;
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert_eq!(delta[0].status, ComponentPhase::Excluded);
        // the retry replaced the sentinel instead of stacking a second record
        assert_eq!(statuses.components_status.len(), 1);
        assert_eq!(statuses.components_status[0].status, ComponentPhase::Excluded);
    }

    #[tokio::test]
    async fn surfaces_gateway_errors_without_corrupting_state() {
        let pool = pool("nodes", 3);
        let mut statuses = ClusterStatus {
            components_status: vec![ComponentStatus::scaler(ComponentPhase::Excluded, "Group-0")],
        };
        let mut ops = FakeOrchestrator::default();
        {
            let mut state = ops.gateway.state.lock().unwrap();
            state.exclusions.push("cluster-test-nodes-3".to_owned());
            state.down = true;
        }
        // the drain check fails but the excluded record survives untouched
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        assert!(scaler.reconcile().await.is_err());
        assert_eq!(statuses.components_status[0].status, ComponentPhase::Excluded);
        assert!(ops.workloads.is_empty());
        assert!(ops.statuses.is_empty());
        // once the gateway recovers the drain completes normally
        ops.gateway.state.lock().unwrap().down = false;
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert_eq!(delta[0].status, ComponentPhase::Drained);
    }

    #[tokio::test]
    async fn pools_progress_independently() {
        let master = pool("master", 2);
        let nodes = pool("nodes", 4);
        let mut statuses = ClusterStatus {
            components_status: vec![ComponentStatus::scaler(ComponentPhase::Excluded, "Group-0")],
        };
        let mut ops = FakeOrchestrator::default();
        ops.gateway
            .state
            .lock()
            .unwrap()
            .occupied
            .insert("cluster-test-master-2".to_owned());
        // pool 0 keeps draining its doomed master node
        let mut scaler = Scaler::new(0, &master, workload("cluster-test-master", 3), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert!(delta.is_empty());
        // pool 1 grows in the same tick
        let mut scaler = Scaler::new(1, &nodes, workload("cluster-test-nodes", 3), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert!(delta.is_empty());
        assert_eq!(ops.workloads, vec![workload("cluster-test-nodes", 4)]);
        // only the shrinking pool carries a scaler record and it kept its tag
        assert_eq!(statuses.components_status.len(), 1);
        assert_eq!(statuses.components_status[0].description, "Group-0");
        assert_eq!(statuses.components_status[0].status, ComponentPhase::Excluded);
    }

    #[tokio::test]
    async fn converged_pools_are_a_noop() {
        let pool = pool("nodes", 3);
        let mut statuses = ClusterStatus::default();
        let mut ops = FakeOrchestrator::default();
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 3), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        // zero side effects of any kind
        assert!(delta.is_empty());
        assert!(ops.workloads.is_empty());
        assert!(ops.statuses.is_empty());
        assert!(ops.events.is_empty());
        assert!(ops.gateway.state.lock().unwrap().exclusions.is_empty());
    }

    #[tokio::test]
    async fn failed_workload_updates_surface_on_grow() {
        let pool = pool("nodes", 4);
        let mut statuses = ClusterStatus::default();
        let mut ops = FakeOrchestrator {
            fail_workloads: true,
            ..FakeOrchestrator::default()
        };
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 3), &mut statuses, &mut ops);
        assert!(scaler.reconcile().await.is_err());
        // nothing was persisted and the failure was reported
        assert!(ops.workloads.is_empty());
        assert!(statuses.components_status.is_empty());
        assert_eq!(ops.events.last().unwrap().0, ScaleReason::FailedToAddNode);
    }

    #[tokio::test]
    async fn failed_workload_updates_surface_on_shrink() {
        let pool = pool("nodes", 3);
        let mut statuses = ClusterStatus::default();
        let mut ops = FakeOrchestrator {
            fail_workloads: true,
            ..FakeOrchestrator::default()
        };
        // the exclusion lands but the workload write through fails the tick
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        assert!(scaler.reconcile().await.is_err());
        assert_eq!(
            ops.gateway.state.lock().unwrap().exclusions,
            vec!["cluster-test-nodes-3"]
        );
        // no status of any phase was written
        assert!(statuses.components_status.is_empty());
        assert!(ops.statuses.is_empty());
        // the next tick still sees a shrink and reissues the exclusion
        ops.fail_workloads = false;
        let mut scaler = Scaler::new(0, &pool, workload("cluster-test-nodes", 4), &mut statuses, &mut ops);
        let delta = scaler.reconcile().await.unwrap();
        assert_eq!(delta[0].status, ComponentPhase::Excluded);
        assert_eq!(
            ops.gateway.state.lock().unwrap().exclusions,
            vec!["cluster-test-nodes-3"]
        );
    }
}
