//! Models for managed search clusters and their node pools

use schemars::JsonSchema;

#[cfg(feature = "k8s")]
use crate::client::Error;

/// Helps serde default the cluster REST api port to 9200
fn default_http_port() -> u16 {
    9200
}

/// Settings shared by all node pools in a managed cluster
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
pub struct GeneralSettings {
    /// The name of the service fronting this cluster's REST api
    #[serde(rename = "serviceName")]
    pub service_name: String,
    /// The port the cluster's REST api listens on
    #[serde(default = "default_http_port", rename = "httpPort")]
    pub http_port: u16,
    /// The secret holding the admin credentials for this cluster if any
    #[serde(default, rename = "credentialsSecret")]
    pub credentials_secret: Option<String>,
}

/// A homogeneous replicated set of cluster nodes sharing a role
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
pub struct NodePool {
    /// The stable identifier for this pool within its cluster
    pub component: String,
    /// The number of replicas this pool should converge to
    pub replicas: i32,
    /// The roles the nodes in this pool take on
    #[serde(default)]
    pub roles: Vec<String>,
}

/// The phase a component of a managed cluster is in
#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq, Default)]
pub enum ComponentPhase {
    /// No phase has been recorded yet
    #[default]
    #[serde(rename = "")]
    Unset,
    /// A node has been excluded from shard allocation ahead of removal
    Excluded,
    /// An excluded node has been observed shard free and its exclusion lifted
    Drained,
    /// The last exclusion attempt was rejected by the cluster
    Running,
}

impl std::fmt::Display for ComponentPhase {
    /// Allow a component phase to be displayed
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ComponentPhase::Unset => write!(f, ""),
            ComponentPhase::Excluded => write!(f, "Excluded"),
            ComponentPhase::Drained => write!(f, "Drained"),
            ComponentPhase::Running => write!(f, "Running"),
        }
    }
}

/// The persisted status of one subsystem acting on a managed cluster
///
/// A record is identified by its component and description pair; at most one
/// record with a given identity exists in a cluster's status at any instant.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
pub struct ComponentStatus {
    /// The subsystem that owns this record
    pub component: String,
    /// The phase that subsystem is in
    #[serde(default)]
    pub status: ComponentPhase,
    /// The target this record describes (the group tag for the scaler)
    pub description: String,
}

impl ComponentStatus {
    /// Build a scaler status record for a node pool group
    ///
    /// # Arguments
    ///
    /// * `status` - The phase the scaler is in
    /// * `description` - The group tag for the pool being scaled
    pub fn scaler<T: Into<String>>(status: ComponentPhase, description: T) -> Self {
        ComponentStatus {
            component: "Scaler".to_owned(),
            status,
            description: description.into(),
        }
    }

    /// Check whether another record shares this record's identity
    ///
    /// Identity is the component and description pair, never the phase.
    ///
    /// # Arguments
    ///
    /// * `other` - The record to compare identities with
    pub fn same_identity(&self, other: &ComponentStatus) -> bool {
        self.component == other.component && self.description == other.description
    }
}

/// The persisted status of a managed cluster
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq, Eq, Default)]
pub struct ClusterStatus {
    /// The status records for the subsystems acting on this cluster
    #[serde(default, rename = "componentsStatus")]
    pub components_status: Vec<ComponentStatus>,
}

impl ClusterStatus {
    /// Find the first status record matching a predicate
    ///
    /// # Arguments
    ///
    /// * `pred` - The predicate records must match
    pub fn find<F>(&self, pred: F) -> Option<&ComponentStatus>
    where
        F: Fn(&ComponentStatus) -> bool,
    {
        self.components_status.iter().find(|status| pred(status))
    }

    /// Replace the first record sharing a record's identity or append the new one
    ///
    /// # Arguments
    ///
    /// * `old` - The record whose identity is being replaced
    /// * `new` - The record to write in its place
    pub fn replace(&mut self, old: &ComponentStatus, new: ComponentStatus) {
        match self
            .components_status
            .iter_mut()
            .find(|status| status.same_identity(old))
        {
            Some(slot) => *slot = new,
            None => self.components_status.push(new),
        }
    }

    /// Remove the first record sharing a record's identity if one exists
    ///
    /// # Arguments
    ///
    /// * `target` - The record whose identity is being removed
    pub fn remove(&mut self, target: &ComponentStatus) {
        if let Some(index) = self
            .components_status
            .iter()
            .position(|status| status.same_identity(target))
        {
            self.components_status.remove(index);
        }
    }
}

/// A reference to the stateful workload backing a node pool
///
/// Writing `current_replicas` back through the orchestrator is the act that
/// changes the workload's replica target.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WorkloadRef {
    /// The name of this workload
    pub name: String,
    /// The replica count as last written
    pub current_replicas: i32,
}

#[cfg(feature = "k8s")]
impl TryFrom<&k8s_openapi::api::apps::v1::StatefulSet> for WorkloadRef {
    type Error = Error;

    /// Build a workload reference from an observed statefulset
    ///
    /// # Arguments
    ///
    /// * `sts` - The statefulset backing a node pool
    fn try_from(sts: &k8s_openapi::api::apps::v1::StatefulSet) -> Result<Self, Self::Error> {
        // node names are derived from the workload name so it has to be set
        let name = match sts.metadata.name.as_ref() {
            Some(name) => name.clone(),
            None => return Err(Error::new("Could not get workload name from metadata")),
        };
        // an unset replica count means a single replica in k8s
        let current_replicas = sts.spec.as_ref().and_then(|spec| spec.replicas).unwrap_or(1);
        Ok(WorkloadRef {
            name,
            current_replicas,
        })
    }
}
