//! REST ingress for the mesh gateway.
//!
//! Exposes the two mutating operations of the whole core,
//! `POST /SendMessage` (channel broadcast) and `POST /SendDirectMessage`
//! (direct to a node), plus a liveness probe. Requests are validated at
//! the boundary and forwarded to the outbound dispatcher; the server
//! never queues messages for a disconnected transport.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use meshgate_gateway::DispatcherHandle;
use meshgate_transport::MeshTransport;

mod error;
mod routes;

pub use error::ApiError;

/// Shared state for the request handlers.
#[derive(Clone)]
pub struct ApiState {
    /// The single outbound send path.
    pub dispatcher: DispatcherHandle,
    /// Consulted only for its connection flag.
    pub transport: Arc<dyn MeshTransport>,
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/SendMessage", post(routes::send_message))
        .route("/SendDirectMessage", post(routes::send_direct_message))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// REST server with graceful shutdown.
pub struct RestServer {
    addr: SocketAddr,
    state: ApiState,
    shutdown_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl RestServer {
    /// Create a new server.
    pub fn new(addr: SocketAddr, state: ApiState) -> Self {
        Self {
            addr,
            state,
            shutdown_tx: Arc::new(Mutex::new(None)),
        }
    }

    /// Bind and start serving in a background task.
    pub async fn start(&self) -> eyre::Result<()> {
        let app = router(self.state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        {
            let mut lock = self.shutdown_tx.lock();
            *lock = Some(shutdown_tx);
        }

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("REST API listening on {}", self.addr);

        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });

        tokio::spawn(async move {
            if let Err(err) = server.await {
                tracing::error!("REST server error: {}", err);
            }
        });

        Ok(())
    }

    /// Signal the server to drain and stop.
    pub fn shutdown(&self) {
        let tx = {
            let mut lock = self.shutdown_tx.lock();
            lock.take()
        };

        if let Some(tx) = tx {
            let _ = tx.send(());
            info!("REST server shutdown signal sent");
        }
    }
}
