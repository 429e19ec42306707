//! Gateway core: packet classification and dual-ingress/egress dispatch.
//!
//! Everything with real concurrency or protocol shape lives here:
//!
//! - [`classify`](classify::classify) turns a raw packet into a
//!   storable, JSON-clean event record. Pure and infallible.
//! - [`NodeDirectory`](directory::NodeDirectory) renders peer identities.
//! - [`CommandInterpreter`](commands::CommandInterpreter) recognizes the
//!   slash-command grammar in text messages and produces replies.
//! - The [`dispatch`] actor is the single serialization point for every
//!   outbound send, whatever its origin.
//! - [`EventLogger`](logger::EventLogger) feeds the event sink without
//!   ever letting a sink failure touch ingestion.
//! - [`IngestService`](ingest::IngestService) ties the inbound side
//!   together: one packet at a time, command handling spawned off so a
//!   slow provider never stalls the feed.

pub mod classify;
pub mod commands;
pub mod directory;
pub mod dispatch;
pub mod ingest;
pub mod logger;
pub mod providers;

pub use classify::{classify, EventRecord};
pub use commands::{Command, CommandInterpreter};
pub use directory::NodeDirectory;
pub use dispatch::{
    spawn_dispatcher, DispatchError, DispatcherHandle, SendOrigin, SendRequest,
};
pub use ingest::IngestService;
pub use logger::EventLogger;
pub use providers::{ContentProviders, HttpProviders, ProviderEndpoints, ProviderError};
