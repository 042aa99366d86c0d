//! High-level relay client
//!
//! `RelayClient` runs one request/response exchange per call: encode the
//! command, frame it as HTTP, hand it to the transport, validate the HTTP
//! envelope, then parse the body with the namespace stripped from ids.

use crate::command::{self, Command};
use crate::config::{Credentials, RelayConfig};
use crate::error::Result;
use crate::http;
use crate::namespace::Namespace;
use crate::response;
use crate::transport::{TcpTransport, Transport};
use crate::types::{CursorMap, OnlineCounters, PublishTargets, SendOptions, WatchEvent};
use serde::Serialize;
use std::fmt;

/// Client for the relay IN line
///
/// Request methods take `&self` and may run concurrently; `logon` takes
/// `&mut self`, so credentials never change under an in-flight request.
pub struct RelayClient {
    config: RelayConfig,
    transport: Box<dyn Transport>,
}

impl RelayClient {
    /// Create a client that talks to the relay over TCP (TLS on port 443)
    pub fn new(config: RelayConfig) -> Result<Self> {
        let transport = TcpTransport::new(&config)?;
        Ok(Self {
            config,
            transport: Box::new(transport),
        })
    }

    /// Create a client over a custom transport
    pub fn with_transport(config: RelayConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Namespace currently applied to identifiers
    pub fn namespace(&self) -> &Namespace {
        &self.config.namespace
    }

    /// Get a reference to the underlying transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Set login and password for the relay
    ///
    /// Credentials are not checked here. The namespace becomes
    /// `login_` + namespace; calling this again prefixes once more.
    pub fn logon(&mut self, login: impl Into<String>, password: impl Into<String>) {
        self.config
            .apply_credentials(Credentials::new(login, password));

        tracing::info!(
            namespace = %self.config.namespace,
            "Relay credentials set"
        );
    }

    /// Publish `message` to `targets`
    ///
    /// Returns the cursor the relay assigned to each target id.
    pub async fn send<T>(&self, targets: impl Into<PublishTargets>, message: &T) -> Result<CursorMap>
    where
        T: Serialize + ?Sized,
    {
        self.send_with_options(targets, message, &SendOptions::default())
            .await
    }

    /// Publish `message` to `targets` with a visibility filter
    pub async fn send_with_options<T>(
        &self,
        targets: impl Into<PublishTargets>,
        message: &T,
        opts: &SendOptions,
    ) -> Result<CursorMap>
    where
        T: Serialize + ?Sized,
    {
        let targets = targets.into();
        let command = command::encode_publish(&targets, message, opts, &self.config.namespace)?;
        let body = self.execute(&command).await?;
        let cursors = response::parse_publish_result(&body, &self.config.namespace);

        tracing::debug!(
            targets = targets.len(),
            visibility = opts.show_only_for.len(),
            acked = cursors.len(),
            "Message published"
        );

        Ok(cursors)
    }

    /// Online ids and the number of connected subscribers for each
    ///
    /// "Online" means connected just now; the relay's view is approximate.
    /// With no prefixes, every id in the namespace is considered.
    pub async fn online_with_counters(&self, prefixes: &[&str]) -> Result<OnlineCounters> {
        let command = command::encode_online(prefixes, &self.config.namespace);
        let body = self.execute(&command).await?;
        Ok(response::parse_online_result(&body, &self.config.namespace))
    }

    /// Online ids, sorted
    pub async fn online(&self, prefixes: &[&str]) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .online_with_counters(prefixes)
            .await?
            .into_keys()
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Presence events (online/offline changes) after `from_pos`
    pub async fn watch<P>(&self, from_pos: P, prefixes: &[&str]) -> Result<Vec<WatchEvent>>
    where
        P: TryInto<u64> + fmt::Display + Copy,
    {
        let command = command::encode_watch(from_pos, prefixes, &self.config.namespace)?;
        let body = self.execute(&command).await?;
        Ok(response::parse_watch_result(&body, &self.config.namespace))
    }

    /// Raw relay debug statistics
    ///
    /// The relay only answers this for guest access; with credentials set
    /// the result is empty.
    pub async fn stats(&self) -> Result<String> {
        self.execute(&command::encode_stats()).await
    }

    async fn execute(&self, command: &Command) -> Result<String> {
        let request = http::build_request(
            &self.config.host,
            &self.config.identifier,
            self.config.credentials(),
            &command.identifier,
            &command.body,
        )?;

        let raw = self.transport.send(&request).await?;
        let body = http::parse_response(&raw)?;

        tracing::debug!(
            command = %command,
            transport = self.transport.name(),
            request_bytes = request.len(),
            response_bytes = raw.len(),
            "Relay request completed"
        );

        Ok(body)
    }
}

impl fmt::Debug for RelayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayClient")
            .field("config", &self.config)
            .field("transport", &self.transport.name())
            .finish()
    }
}
