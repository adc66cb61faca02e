//! Clients for the REST apis of managed search clusters

mod cluster;
mod error;
mod helpers;

pub use cluster::{ClusterClient, Gateway};
pub use error::Error;
