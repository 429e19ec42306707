//! Node launch wiring.
//!
//! Connects the transport once, spawns the long-lived service tasks
//! (dispatch, event logger, ingestion, REST), and hands back a handle
//! that waits for the operator interrupt.

use std::sync::Arc;

use eyre::WrapErr;
use tokio::sync::mpsc;
use tracing::info;

use meshgate_gateway::{
    spawn_dispatcher, CommandInterpreter, EventLogger, HttpProviders, IngestService,
    NodeDirectory,
};
use meshgate_rest::{ApiState, RestServer};
use meshgate_storage::RedbEventLog;
use meshgate_transport::{MeshTransport, TcpTransport};

use crate::config::GatewayConfig;

/// The assembled gateway node.
pub struct Node;

impl Node {
    /// Launch every component from a configuration.
    pub async fn launch(config: GatewayConfig) -> eyre::Result<NodeHandle> {
        // Transport first: without a link there is nothing to run.
        let (transport, packet_rx) = TcpTransport::connect(&config.transport.adapter_addr)
            .await
            .wrap_err_with(|| {
                format!(
                    "failed to connect to radio adapter at {}",
                    config.transport.adapter_addr
                )
            })?;
        let transport: Arc<dyn MeshTransport> = transport;

        // Single outbound path for every origin.
        let dispatcher = spawn_dispatcher(transport.clone());

        // Event pipeline.
        let sink = Arc::new(
            RedbEventLog::open(&config.storage.path)
                .wrap_err("failed to open event store")?,
        );
        let (record_tx, record_rx) = mpsc::unbounded_channel();
        tokio::spawn(EventLogger::new(record_rx, sink).run());

        // Command interpreter over the configured providers.
        let providers =
            Arc::new(HttpProviders::new(config.provider_endpoints())
                .wrap_err("failed to build provider client")?);
        let interpreter = Arc::new(CommandInterpreter::new(
            providers,
            dispatcher.clone(),
            config.pacing(),
        ));

        // Ingestion loop.
        let directory = NodeDirectory::new(transport.node_table().clone());
        tokio::spawn(IngestService::new(packet_rx, directory, record_tx, interpreter).run());

        // REST ingress.
        let rest = if config.rest.enabled {
            let server = RestServer::new(
                config.rest_socket_addr()?,
                ApiState {
                    dispatcher: dispatcher.clone(),
                    transport: transport.clone(),
                },
            );
            server.start().await?;
            Some(server)
        } else {
            info!("REST API disabled");
            None
        };

        Ok(NodeHandle { rest })
    }
}

/// Handle to a launched node.
pub struct NodeHandle {
    rest: Option<RestServer>,
}

impl NodeHandle {
    /// Block until the operator interrupts, then stop the servers.
    ///
    /// The transport link and service tasks wind down when the process
    /// exits; no state needs flushing, since the event store commits
    /// per write.
    pub async fn wait_for_shutdown(self) -> eyre::Result<()> {
        tokio::signal::ctrl_c()
            .await
            .wrap_err("failed to listen for shutdown signal")?;
        info!("Shutdown requested");

        if let Some(rest) = &self.rest {
            rest.shutdown();
        }
        Ok(())
    }
}
