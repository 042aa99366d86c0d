//! # a3s-relay
//!
//! Client for the Realplexor push-notification relay.
//!
//! ## Overview
//!
//! `a3s-relay` lets a backend publish JSON messages to subscriber ids,
//! query which ids are currently connected, and watch the changelog of
//! online/offline events. Every call is a single HTTP POST to the relay's
//! IN line; the response is validated and parsed into typed results.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a3s_relay::{PublishTargets, RelayClient, RelayConfig};
//!
//! # async fn example() -> a3s_relay::Result<()> {
//! let config = RelayConfig::new("relay.internal", 10010).with_namespace("chat_");
//! let client = RelayClient::new(config)?;
//!
//! // Publish to two ids; `alice` only receives messages after cursor 42
//! let targets = PublishTargets::from([("alice", Some(42)), ("bob", None)]);
//! let cursors = client
//!     .send(targets, &serde_json::json!({"text": "hello"}))
//!     .await?;
//! println!("alice is at {:?}", cursors.get("alice"));
//!
//! // Who is online in the namespace?
//! let online = client.online(&[]).await?;
//! println!("{} ids online", online.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **command**: encodes publish/online/watch/stats requests
//! - **http**: minimal HTTP/1.1 request framing and response validation
//! - **response**: lenient line parsers for relay replies
//! - **Namespace**: tenant prefix applied to every identifier
//! - **Transport** trait: one request/response exchange; TCP/TLS and
//!   in-memory implementations
//! - **RelayClient**: ties the pieces together

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod http;
pub mod namespace;
pub mod response;
pub mod transport;
pub mod types;

// Re-export core types
pub use client::RelayClient;
pub use config::{Credentials, RelayConfig, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS, TLS_PORT};
pub use error::{RelayError, Result};
pub use namespace::Namespace;
pub use transport::{MemoryTransport, TcpTransport, Transport};
pub use types::{
    Cursor, CursorMap, OnlineCounters, PublishTargets, SendOptions, WatchEvent,
};
