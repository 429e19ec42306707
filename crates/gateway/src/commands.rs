//! Command grammar over text messages.
//!
//! A text message whose trimmed text starts with `/` is a candidate
//! command. Matching is substring containment on the lowercased text,
//! checked in a fixed priority order; the first hit wins and at most one
//! command runs per message. That ordering is contract: a message
//! containing both `/cortes` and `/ping` always resolves to `cortes`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use meshgate_primitives::{truncate_chars, NodeId, MAX_TEXT_CHARS};
use meshgate_transport::SendTarget;

use crate::dispatch::{DispatcherHandle, SendOrigin, SendRequest};
use crate::providers::ContentProviders;

/// The recognized commands, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Outage report, one reply per utility company.
    Cortes,
    /// Grid demand summary.
    Demanda,
    /// Subway status summary.
    Subte,
    /// Liveness check.
    Ping,
}

impl Command {
    /// First matching command in priority order, if any.
    pub fn match_in(text: &str) -> Option<Command> {
        let lower = text.to_lowercase();
        if lower.contains("/cortes") {
            Some(Command::Cortes)
        } else if lower.contains("/demanda") {
            Some(Command::Demanda)
        } else if lower.contains("/subte") {
            Some(Command::Subte)
        } else if lower.contains("/ping") {
            Some(Command::Ping)
        } else {
            None
        }
    }
}

/// Executes commands and replies to the sender through the dispatcher.
pub struct CommandInterpreter<P> {
    providers: Arc<P>,
    dispatcher: DispatcherHandle,
    /// Delay between successive replies of one multi-message sequence,
    /// respecting the transport's duty-cycle constraints.
    pacing: Duration,
}

impl<P: ContentProviders> CommandInterpreter<P> {
    /// Create an interpreter.
    pub fn new(providers: Arc<P>, dispatcher: DispatcherHandle, pacing: Duration) -> Self {
        Self {
            providers,
            dispatcher,
            pacing,
        }
    }

    /// Handle one command-candidate text from `sender`.
    ///
    /// Replies that the transport cannot deliver are dropped silently;
    /// command handling never propagates an error into ingestion.
    pub async fn handle(&self, text: &str, sender: NodeId) {
        let Some(command) = Command::match_in(text) else {
            debug!(%sender, text, "Unrecognized command, ignoring");
            return;
        };

        metrics::counter!("meshgate_commands_total").increment(1);

        match command {
            Command::Cortes => {
                let messages = match self.providers.outage_report().await {
                    Ok(messages) => messages,
                    Err(e) => vec![format!("Error: {e}")],
                };
                self.reply_sequence(messages, sender).await;
            }
            Command::Demanda => {
                let message = self
                    .providers
                    .demand_summary()
                    .await
                    .unwrap_or_else(|e| format!("Error: {e}"));
                self.reply(message, sender).await;
            }
            Command::Subte => {
                let message = self
                    .providers
                    .transit_status()
                    .await
                    .unwrap_or_else(|e| format!("Error: {e}"));
                self.reply(message, sender).await;
            }
            Command::Ping => {
                self.reply("pong".to_string(), sender).await;
            }
        }
    }

    /// Send each message in turn, pacing between successive sends (but
    /// not after the last).
    async fn reply_sequence(&self, messages: Vec<String>, sender: NodeId) {
        let total = messages.len();
        for (index, message) in messages.into_iter().enumerate() {
            info!(reply = index + 1, of = total, text = %message, "Command reply");
            self.reply(message, sender).await;
            if index + 1 < total {
                sleep(self.pacing).await;
            }
        }
    }

    async fn reply(&self, text: String, sender: NodeId) {
        let request = SendRequest {
            text: truncate_chars(&text, MAX_TEXT_CHARS),
            target: SendTarget::Node(sender),
            origin: SendOrigin::CommandReply,
        };
        if let Err(e) = self.dispatcher.send(request).await {
            // Undeliverable replies are dropped; the mesh user simply
            // does not hear back.
            debug!(%sender, error = %e, "Command reply dropped");
        }
    }
}
