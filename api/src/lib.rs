//! The shared models, config, and clients for Sonar

#[macro_use]
extern crate serde_derive;

pub mod client;
pub mod conf;
pub mod models;
pub mod utils;

pub use client::{ClusterClient, Error, Gateway};
pub use conf::Conf;
