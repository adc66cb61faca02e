//! Shared utilities for the Sonar operator

pub mod trace;
