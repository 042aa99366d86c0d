//! Tenant namespacing of identifiers
//!
//! Every identifier travels over the wire as `namespace + id`. The relay
//! uses the prefix to partition identifier spaces between tenants, so the
//! client qualifies ids before sending and strips the prefix from ids it
//! receives back.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prefix applied to outgoing identifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace from its prefix (may be empty)
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    /// Raw prefix
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prefix an identifier with the namespace
    pub fn qualify(&self, id: &str) -> String {
        format!("{}{}", self.0, id)
    }

    /// Strip the namespace from an identifier received from the relay
    ///
    /// Identifiers that do not start with the namespace (or any identifier
    /// when the namespace is empty) are returned unchanged.
    pub fn unqualify(&self, id: &str) -> String {
        if self.0.is_empty() {
            return id.to_string();
        }
        id.strip_prefix(self.0.as_str()).unwrap_or(id).to_string()
    }

    /// Namespace used once credentials are attached: `login_` + current
    ///
    /// Applying this twice compounds the prefix.
    pub fn logon(&self, login: &str) -> Self {
        Self(format!("{}_{}", login, self.0))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Namespace {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

impl From<String> for Namespace {
    fn from(prefix: String) -> Self {
        Self(prefix)
    }
}
