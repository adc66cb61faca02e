//! The k8s facing pieces of the Sonar operator

pub mod clusters;
pub mod controller;
pub mod crds;
pub mod operate;
pub mod orchestrator;
pub mod scaler;
pub mod statefulsets;
