//! Gateway CLI entry point.

use clap::{Parser, Subcommand};
use eyre::Result;

use meshgate_node::{GatewayConfig, LogArgs, NodeArgs};

/// Meshgate - packet-radio mesh gateway
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Logging configuration.
    #[command(flatten)]
    pub logs: LogArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Gateway commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the gateway node.
    Node(NodeArgs),
}

/// Load configuration and apply CLI overrides.
pub fn load_config(args: &NodeArgs) -> Result<GatewayConfig> {
    let mut config = GatewayConfig::load(args.config.as_deref())?;
    config.apply_args(args);
    Ok(config)
}
