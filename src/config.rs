//! Relay connection configuration

use crate::error::{RelayError, Result};
use crate::namespace::Namespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default port of the relay's IN line
pub const DEFAULT_PORT: u16 = 10010;

/// Port on which the relay is reached over TLS
pub const TLS_PORT: u16 = 443;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Login and password passed to the relay with every request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// Relay client configuration
///
/// Built once and handed to `RelayClient`. Attaching credentials rewrites
/// the namespace to `login_` + namespace, because the relay only lets a
/// login address ids under its own prefix. Deserialized configs go through
/// the same rewrite; credentials are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawRelayConfig")]
pub struct RelayConfig {
    /// Host of the IN line
    pub host: String,

    /// Port of the IN line (443 means TLS)
    pub port: u16,

    /// Prefix applied to every identifier
    pub namespace: Namespace,

    /// Marker placed before `=` in the X-Realplexor header
    pub identifier: String,

    /// Bound on connect + write + read of a single request
    pub timeout_secs: u64,

    /// Optional login/password, set through `with_credentials`
    #[serde(skip_serializing)]
    credentials: Option<Credentials>,
}

/// On-disk shape of `RelayConfig`, before credentials are applied
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelayConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    namespace: Namespace,
    #[serde(default = "default_identifier")]
    identifier: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default)]
    credentials: Option<Credentials>,
}

impl From<RawRelayConfig> for RelayConfig {
    fn from(raw: RawRelayConfig) -> Self {
        let mut config = Self {
            host: raw.host,
            port: raw.port,
            namespace: raw.namespace,
            identifier: raw.identifier,
            timeout_secs: raw.timeout_secs,
            credentials: None,
        };
        if let Some(credentials) = raw.credentials {
            config.apply_credentials(credentials);
        }
        config
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_identifier() -> String {
    "identifier".to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Reject values that would break out of their HTTP header line
pub(crate) fn check_header_value(field: &str, value: &str) -> Result<()> {
    if value.chars().any(|c| c.is_control()) {
        return Err(RelayError::Config(format!(
            "{} must not contain control characters",
            field
        )));
    }
    Ok(())
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            namespace: Namespace::default(),
            identifier: default_identifier(),
            timeout_secs: default_timeout_secs(),
            credentials: None,
        }
    }
}

impl RelayConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<Namespace>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Attach credentials and move the namespace under the login prefix
    ///
    /// Credentials are not checked here; the relay rejects bad ones with
    /// a non-200 status. Calling this twice compounds the prefix.
    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.apply_credentials(Credentials::new(login, password));
        self
    }

    pub(crate) fn apply_credentials(&mut self, credentials: Credentials) {
        self.namespace = self.namespace.logon(&credentials.login);
        self.credentials = Some(credentials);
    }

    /// Login and password sent with every request, if set
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Whether requests go over TLS
    pub fn is_secure(&self) -> bool {
        self.port == TLS_PORT
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `host:port` used to open connections
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RelayError::Config("host must not be empty".to_string()));
        }
        if self.identifier.is_empty() {
            return Err(RelayError::Config(
                "identifier marker must not be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(RelayError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        check_header_value("host", &self.host)?;
        check_header_value("identifier marker", &self.identifier)?;
        if let Some(creds) = &self.credentials {
            check_header_value("login", &creds.login)?;
            check_header_value("password", &creds.password)?;
        }
        Ok(())
    }
}
