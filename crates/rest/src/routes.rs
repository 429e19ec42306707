//! Request handlers for the message-sending API.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use meshgate_gateway::{SendOrigin, SendRequest};
use meshgate_primitives::{NodeId, MAX_TEXT_CHARS};
use meshgate_transport::SendTarget;

use crate::error::ApiError;
use crate::ApiState;

/// Body of `POST /SendMessage`.
#[derive(Debug, Deserialize)]
pub(crate) struct SendMessageRequest {
    /// Channel index to broadcast on; 0 is the primary channel.
    pub channel: u32,
    /// UTF-8 message, at most 200 characters.
    pub message: String,
}

/// Body of `POST /SendDirectMessage`.
#[derive(Debug, Deserialize)]
pub(crate) struct SendDirectMessageRequest {
    /// Destination node (`!xxxxxxxx` or bare hex).
    pub destination_id: String,
    /// UTF-8 message, at most 200 characters.
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageResponse {
    status: String,
    channel: u32,
    message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendDirectMessageResponse {
    status: String,
    destination: String,
    message: String,
}

/// Broadcast a message on a channel.
pub(crate) async fn send_message(
    State(state): State<ApiState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    validate_message(&request.message)?;
    ensure_connected(&state)?;

    state
        .dispatcher
        .send(SendRequest {
            text: request.message.clone(),
            target: SendTarget::Channel(request.channel),
            origin: SendOrigin::Rest,
        })
        .await?;

    info!(channel = request.channel, "REST broadcast sent");
    Ok(Json(SendMessageResponse {
        status: "Mensaje Enviado!".to_string(),
        channel: request.channel,
        message: request.message,
    }))
}

/// Send a message directly to one node.
pub(crate) async fn send_direct_message(
    State(state): State<ApiState>,
    Json(request): Json<SendDirectMessageRequest>,
) -> Result<Json<SendDirectMessageResponse>, ApiError> {
    validate_message(&request.message)?;
    let destination: NodeId = request
        .destination_id
        .parse()
        .map_err(|_| ApiError::BadDestination(request.destination_id.clone()))?;
    ensure_connected(&state)?;

    state
        .dispatcher
        .send(SendRequest {
            text: request.message.clone(),
            target: SendTarget::Node(destination),
            origin: SendOrigin::Rest,
        })
        .await?;

    info!(%destination, "REST direct message sent");
    Ok(Json(SendDirectMessageResponse {
        status: "ok".to_string(),
        destination: request.destination_id,
        message: request.message,
    }))
}

/// Liveness probe.
pub(crate) async fn health() -> impl IntoResponse {
    "OK"
}

/// Oversize messages are rejected at the boundary, never forwarded.
fn validate_message(message: &str) -> Result<(), ApiError> {
    if message.chars().count() > MAX_TEXT_CHARS {
        return Err(ApiError::MessageTooLong);
    }
    Ok(())
}

/// Without a mesh link the request is refused up front, not queued.
fn ensure_connected(state: &ApiState) -> Result<(), ApiError> {
    if !state.transport.is_connected() {
        return Err(ApiError::NotConnected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;

    use meshgate_gateway::spawn_dispatcher;
    use meshgate_transport::MemoryTransport;

    use super::*;

    fn state() -> (ApiState, Arc<MemoryTransport>) {
        let (transport, _rx) = MemoryTransport::new();
        let dispatcher = spawn_dispatcher(transport.clone());
        (
            ApiState {
                dispatcher,
                transport: transport.clone(),
            },
            transport,
        )
    }

    #[tokio::test]
    async fn broadcast_reaches_the_channel() {
        let (state, transport) = state();

        let response = send_message(
            State(state),
            Json(SendMessageRequest {
                channel: 2,
                message: "Hola mesh".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.status, "Mensaje Enviado!");
        assert_eq!(response.0.channel, 2);
        assert_eq!(
            transport.sent(),
            vec![("Hola mesh".to_string(), SendTarget::Channel(2))]
        );
    }

    #[tokio::test]
    async fn direct_message_parses_destination() {
        let (state, transport) = state();

        let response = send_direct_message(
            State(state),
            Json(SendDirectMessageRequest {
                destination_id: "!abcd1234".into(),
                message: "Ping directo".into(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.0.status, "ok");
        assert_eq!(response.0.destination, "!abcd1234");
        assert_eq!(
            transport.sent(),
            vec![(
                "Ping directo".to_string(),
                SendTarget::Node(NodeId::new(0xabcd1234))
            )]
        );
    }

    #[tokio::test]
    async fn oversize_message_is_rejected_before_the_transport() {
        let (state, transport) = state();

        let err = send_message(
            State(state),
            Json(SendMessageRequest {
                channel: 0,
                message: "x".repeat(201),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn exactly_200_chars_is_accepted() {
        let (state, transport) = state();

        let _ = send_message(
            State(state),
            Json(SendMessageRequest {
                channel: 0,
                message: "x".repeat(200),
            }),
        )
        .await
        .unwrap();
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn disconnected_transport_yields_service_unavailable() {
        let (state, transport) = state();
        transport.set_connected(false);

        let err = send_message(
            State(state.clone()),
            Json(SendMessageRequest {
                channel: 0,
                message: "hola".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);

        let err = send_direct_message(
            State(state),
            Json(SendDirectMessageRequest {
                destination_id: "!00000001".into(),
                message: "hola".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn bad_destination_is_a_client_error() {
        let (state, transport) = state();

        let err = send_direct_message(
            State(state),
            Json(SendDirectMessageRequest {
                destination_id: "nodo-nueve".into(),
                message: "hola".into(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(transport.sent().is_empty());
    }
}
