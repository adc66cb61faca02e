/// The arguments for operating managed search clusters
use clap::Parser;

/// The arguments for the operator
#[derive(Parser, Debug, Clone)]
#[clap(version, author)]
pub struct Args {
    /// The sub command to execute
    #[clap(subcommand)]
    pub cmd: SubCommands,
}

/// The sub commands for cluster operation
#[derive(Parser, Debug, Clone)]
pub enum SubCommands {
    /// Operate managed search clusters in k8s
    Operate(OperateClusters),
}

/// Operate managed search clusters arguments
#[derive(Parser, Debug, Clone)]
pub struct OperateClusters {
    /// The path to load the config file from
    #[clap(short, long, default_value = "sonar.yml")]
    pub config: String,
}
