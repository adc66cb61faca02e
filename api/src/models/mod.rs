//! The models shared between the Sonar operator components

mod clusters;

pub use clusters::{
    ClusterStatus, ComponentPhase, ComponentStatus, GeneralSettings, NodePool, WorkloadRef,
};
