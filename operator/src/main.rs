//! Operate managed search clusters in k8s
mod app;
mod args;
mod k8s;

use clap::Parser;
use k8s::controller;

#[tokio::main]
async fn main() {
    // install a crypto provider for rustls
    // Rustls will complain if this is not run but we can ignore any errors
    // https://github.com/rustls/rustls/issues/1938
    let _ = rustls::crypto::ring::default_provider().install_default();
    // load command line args
    let args = args::Args::parse();
    // execute the right handler
    match &args.cmd {
        // start reconciling clusters
        args::SubCommands::Operate(operate_args) => controller::run(operate_args).await,
    }
}
