//! In-memory transport for testing
//!
//! Records every request and answers from a queue of scripted responses,
//! or from a handler closure when one is set. With nothing scripted it
//! behaves like a relay that closes without writing (empty response).

use super::Transport;
use crate::error::{RelayError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Handler function type for computed responses
type ResponseHandler = Box<dyn Fn(&[u8]) -> Result<Bytes> + Send + Sync>;

/// Build a well-formed `200 OK` relay response around `body`
pub fn relay_response(body: &str) -> Bytes {
    Bytes::from(format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    ))
}

/// Scripted transport that never touches the network
pub struct MemoryTransport {
    responses: Mutex<VecDeque<Result<Bytes>>>,
    requests: Mutex<Vec<Bytes>>,
    handler: Option<ResponseHandler>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            handler: None,
        }
    }

    /// Answer every request through `handler`
    ///
    /// Scripted responses still take precedence while queued.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Bytes> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new()
        }
    }

    /// Queue raw response bytes for the next request
    pub async fn push_raw(&self, raw: impl Into<Bytes>) {
        self.responses.lock().await.push_back(Ok(raw.into()));
    }

    /// Queue a `200 OK` response carrying `body`
    pub async fn push_body(&self, body: &str) {
        self.push_raw(relay_response(body)).await;
    }

    /// Queue a transport failure for the next request
    pub async fn push_error(&self, error: RelayError) {
        self.responses.lock().await.push_back(Err(error));
    }

    /// All requests sent so far, oldest first
    pub async fn requests(&self) -> Vec<Bytes> {
        self.requests.lock().await.clone()
    }

    /// Most recent request as text
    pub async fn last_request(&self) -> Option<String> {
        self.requests
            .lock()
            .await
            .last()
            .map(|r| String::from_utf8_lossy(r).into_owned())
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: &[u8]) -> Result<Bytes> {
        self.requests
            .lock()
            .await
            .push(Bytes::copy_from_slice(request));

        if let Some(response) = self.responses.lock().await.pop_front() {
            return response;
        }

        match &self.handler {
            Some(handler) => handler(request),
            None => Ok(Bytes::new()),
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}
