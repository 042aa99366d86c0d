//! Transport trait: the byte pipe between the client and the relay
//!
//! The relay protocol is one request per connection: open, write the whole
//! request, signal end of write, read until the relay closes. Transports
//! implement exactly that exchange and nothing more; framing and parsing
//! stay in the client.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

pub mod memory;
pub mod tcp;

pub use memory::{relay_response, MemoryTransport};
pub use tcp::{TcpTransport, MAX_RESPONSE_BYTES};

/// One request/response exchange with the relay
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write `request`, half-close, and return everything the relay sent
    /// back before closing the connection
    async fn send(&self, request: &[u8]) -> Result<Bytes>;

    /// Transport name (e.g., "tcp", "tls", "memory")
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        (**self).send(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
