//! Core request and result types for the relay client
//!
//! All serializable types use camelCase JSON for wire compatibility with
//! the rest of the A3S ecosystem.

use crate::error::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Position in a per-identifier message stream
pub type Cursor = u64;

/// Publish acknowledgement: identifier → cursor assigned by the relay
pub type CursorMap = HashMap<String, Cursor>;

/// Online identifiers and the number of connected subscribers for each
pub type OnlineCounters = HashMap<String, u64>;

/// Identifiers a message is published to, each with an optional cursor
///
/// A target without a cursor is delivered unconditionally. Order is kept
/// as given, which is also the order of the ids on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishTargets {
    entries: Vec<(String, Option<Cursor>)>,
}

impl PublishTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets from bare identifiers, all without cursor
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: ids.into_iter().map(|id| (id.into(), None)).collect(),
        }
    }

    /// Add a target
    pub fn with(mut self, id: impl Into<String>, cursor: Option<Cursor>) -> Self {
        self.push(id, cursor);
        self
    }

    pub fn push(&mut self, id: impl Into<String>, cursor: Option<Cursor>) {
        self.entries.push((id.into(), cursor));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<Cursor>)> {
        self.entries.iter().map(|(id, cursor)| (id.as_str(), *cursor))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for PublishTargets {
    fn from(ids: Vec<String>) -> Self {
        Self::ids(ids)
    }
}

impl From<Vec<&str>> for PublishTargets {
    fn from(ids: Vec<&str>) -> Self {
        Self::ids(ids)
    }
}

impl From<&[&str]> for PublishTargets {
    fn from(ids: &[&str]) -> Self {
        Self::ids(ids.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for PublishTargets {
    fn from(ids: [&str; N]) -> Self {
        Self::ids(ids)
    }
}

impl From<Vec<(String, Option<Cursor>)>> for PublishTargets {
    fn from(entries: Vec<(String, Option<Cursor>)>) -> Self {
        Self { entries }
    }
}

impl From<Vec<(&str, Option<Cursor>)>> for PublishTargets {
    fn from(entries: Vec<(&str, Option<Cursor>)>) -> Self {
        entries.into_iter().collect()
    }
}

impl<const N: usize> From<[(&str, Option<Cursor>); N]> for PublishTargets {
    fn from(entries: [(&str, Option<Cursor>); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl From<HashMap<String, Option<Cursor>>> for PublishTargets {
    fn from(map: HashMap<String, Option<Cursor>>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, Option<Cursor>>> for PublishTargets {
    fn from(map: BTreeMap<String, Option<Cursor>>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<Cursor>)> for PublishTargets {
    fn from_iter<I: IntoIterator<Item = (K, Option<Cursor>)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(id, cursor)| (id.into(), cursor))
                .collect(),
        }
    }
}

/// Targets from loosely typed JSON: `["a", "b"]` or `{"a": 5, "b": null}`
impl TryFrom<&serde_json::Value> for PublishTargets {
    type Error = RelayError;

    fn try_from(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        match value {
            Value::Array(items) => {
                let mut targets = Self::new();
                for item in items {
                    match item {
                        Value::String(id) => targets.push(id.clone(), None),
                        other => return Err(RelayError::InvalidIdentifier(display_value(other))),
                    }
                }
                Ok(targets)
            }
            Value::Object(map) => {
                let mut targets = Self::new();
                for (id, cursor) in map {
                    let cursor = match cursor {
                        Value::Null => None,
                        Value::Number(n) => Some(
                            n.as_u64()
                                .ok_or_else(|| RelayError::InvalidCursor(n.to_string()))?,
                        ),
                        other => return Err(RelayError::InvalidCursor(display_value(other))),
                    };
                    targets.push(id.clone(), cursor);
                }
                Ok(targets)
            }
            other => Err(RelayError::InvalidTargets(display_value(other))),
        }
    }
}

impl TryFrom<serde_json::Value> for PublishTargets {
    type Error = RelayError;

    fn try_from(value: serde_json::Value) -> Result<Self> {
        Self::try_from(&value)
    }
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Options for publishing messages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOptions {
    /// Deliver only to subscribers that also listen to one of these ids
    ///
    /// Give each client a unique id and list them here to keep a message
    /// within a closed group. Empty means no restriction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub show_only_for: Vec<String>,
}

impl SendOptions {
    /// Restrict visibility to listeners of any of `ids`
    pub fn show_only_for<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            show_only_for: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// A presence change reported by the `watch` command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchEvent {
    /// Event kind as sent by the relay (`online`, `offline`, ...)
    pub event: String,

    /// Changelog position of this event
    pub pos: u64,

    /// Identifier, namespace already stripped
    pub id: String,
}

impl WatchEvent {
    pub fn new(event: impl Into<String>, pos: u64, id: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            pos,
            id: id.into(),
        }
    }

    pub fn is_online(&self) -> bool {
        self.event == "online"
    }

    pub fn is_offline(&self) -> bool {
        self.event == "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_targets_from_ids() {
        let targets = PublishTargets::from(vec!["a", "b"]);
        let entries: Vec<_> = targets.iter().collect();
        assert_eq!(entries, vec![("a", None), ("b", None)]);
    }

    #[test]
    fn test_targets_keep_order() {
        let targets = PublishTargets::from([("z", Some(1)), ("a", None), ("m", Some(3))]);
        let ids: Vec<_> = targets.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_targets_builder() {
        let targets = PublishTargets::new().with("a", Some(5)).with("b", None);
        assert_eq!(targets.len(), 2);
        assert!(!targets.is_empty());
        assert!(PublishTargets::new().is_empty());
    }

    #[test]
    fn test_targets_from_map() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), None);
        map.insert("a".to_string(), Some(7));
        let targets = PublishTargets::from(map);
        let entries: Vec<_> = targets.iter().collect();
        assert_eq!(entries, vec![("a", Some(7)), ("b", None)]);
    }

    #[test]
    fn test_targets_from_json_list() {
        let targets = PublishTargets::try_from(json!(["x", "y"])).unwrap();
        assert_eq!(targets, PublishTargets::ids(["x", "y"]));
    }

    #[test]
    fn test_targets_from_json_map() {
        let targets = PublishTargets::try_from(json!({"a": 5, "b": null})).unwrap();
        let entries: Vec<_> = targets.iter().collect();
        assert_eq!(entries, vec![("a", Some(5)), ("b", None)]);
    }

    #[test]
    fn test_targets_from_json_rejects_bad_cursor() {
        let err = PublishTargets::try_from(json!({"a": "five"})).unwrap_err();
        assert!(matches!(err, RelayError::InvalidCursor(ref c) if c == "five"));

        let err = PublishTargets::try_from(json!({"a": -1})).unwrap_err();
        assert!(matches!(err, RelayError::InvalidCursor(ref c) if c == "-1"));

        let err = PublishTargets::try_from(json!({"a": 1.5})).unwrap_err();
        assert!(matches!(err, RelayError::InvalidCursor(_)));
    }

    #[test]
    fn test_targets_from_json_rejects_non_string_id() {
        let err = PublishTargets::try_from(json!(["a", 3])).unwrap_err();
        assert!(matches!(err, RelayError::InvalidIdentifier(ref id) if id == "3"));
    }

    #[test]
    fn test_targets_from_json_rejects_scalar() {
        let err = PublishTargets::try_from(json!("a")).unwrap_err();
        assert!(matches!(err, RelayError::InvalidTargets(_)));
    }

    #[test]
    fn test_send_options_serialization() {
        let opts = SendOptions::show_only_for(["v1", "v2"]);
        let json = serde_json::to_string(&opts).unwrap();
        assert_eq!(json, r#"{"showOnlyFor":["v1","v2"]}"#);

        let empty = serde_json::to_string(&SendOptions::default()).unwrap();
        assert_eq!(empty, "{}");
    }

    #[test]
    fn test_watch_event_serialization() {
        let event = WatchEvent::new("online", 5, "a");
        assert!(event.is_online());
        assert!(!event.is_offline());

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"online","pos":5,"id":"a"}"#);

        let parsed: WatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
