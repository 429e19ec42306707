//! CLI argument groups, flattened into the binary's parser.

use std::path::PathBuf;

use clap::Args;

/// Logging configuration (applies to all subcommands).
#[derive(Debug, Args)]
pub struct LogArgs {
    /// Increase verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only show errors.
    #[arg(long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,

    /// Additional tracing filter directives (comma separated).
    #[arg(long = "log.filter", global = true, value_name = "DIRECTIVES")]
    pub filter: Option<String>,
}

/// Arguments for the 'node' command.
#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Path to the TOML configuration file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Radio adapter address (host:port).
    #[arg(long = "adapter", value_name = "ADDR")]
    pub adapter_addr: Option<String>,

    /// REST API bind address.
    #[arg(long = "rest.addr", value_name = "ADDR")]
    pub rest_addr: Option<String>,

    /// REST API port.
    #[arg(long = "rest.port", value_name = "PORT")]
    pub rest_port: Option<u16>,

    /// Disable the REST API entirely.
    #[arg(long = "rest.disable")]
    pub rest_disable: bool,

    /// Event store path.
    #[arg(long = "db", value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}
