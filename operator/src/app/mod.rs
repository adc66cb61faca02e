//! The non k8s application logic for the Sonar operator

pub mod builders;
