//! Mesh gateway binary.

mod cli;

use clap::Parser;

use meshgate_node::Node;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();
    meshgate_node::init_logging(&cli.logs)?;

    let cli::Commands::Node(args) = cli.command;
    let config = cli::load_config(&args)?;

    Node::launch(config).await?.wait_for_shutdown().await
}
