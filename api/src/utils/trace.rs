//! Sets up tracing for Sonar on stdout/stderr

use tracing::{event, Level};
use tracing_subscriber::prelude::*;

use crate::conf::Tracing;

/// Setup our tracers/subscribers
///
/// # Arguments
///
/// * `name` - The name of the service to trace
/// * `trace_conf` - The tracing settings to apply
pub fn setup(name: &str, trace_conf: &Tracing) {
    // build our local stdout layer at the configured level
    let local = tracing_subscriber::fmt::layer().with_filter(trace_conf.local.level.to_filter());
    // init our tracing registry
    tracing_subscriber::registry()
        .with(local)
        .try_init()
        .expect("Failed to register stdout registry");
    // log that local tracing is enabled
    event!(
        Level::INFO,
        "Sending {} traces for {} to stdout",
        trace_conf.local.level,
        name
    );
}
