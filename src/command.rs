//! Relay command encoding
//!
//! Turns typed requests into the payload the relay expects:
//!
//! - **publish**: no command keyword; the target list goes into the
//!   `X-Realplexor` header (`[cursor:]id,...,*id`) and the body is the
//!   JSON-serialized message
//! - **online**: `online [prefix ...]\n`
//! - **watch**: `watch <pos> <prefix> [prefix ...]\n`
//! - **stats**: `stats\n`
//!
//! Plain commands carry an empty header identifier.

use crate::error::{RelayError, Result};
use crate::namespace::Namespace;
use crate::types::{PublishTargets, SendOptions};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

/// Cached regex for identifier validation
fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\w+$").unwrap())
}

/// Check an identifier is a non-empty run of word characters
pub fn validate_identifier(id: &str) -> Result<()> {
    if identifier_regex().is_match(id) {
        Ok(())
    } else {
        Err(RelayError::InvalidIdentifier(id.to_string()))
    }
}

/// An encoded request, ready for HTTP framing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name, for logging
    pub name: &'static str,

    /// Value placed after `<marker>=` in the X-Realplexor header
    pub identifier: String,

    /// Request body
    pub body: String,
}

impl Command {
    fn plain(name: &'static str, line: String) -> Self {
        Self {
            name,
            identifier: String::new(),
            body: format!("{}\n", line),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Encode a publish request
pub fn encode_publish<T>(
    targets: &PublishTargets,
    message: &T,
    opts: &SendOptions,
    namespace: &Namespace,
) -> Result<Command>
where
    T: Serialize + ?Sized,
{
    let mut pairs = Vec::with_capacity(targets.len() + opts.show_only_for.len());

    for (id, cursor) in targets.iter() {
        validate_identifier(id)?;
        let full_id = namespace.qualify(id);
        match cursor {
            Some(cursor) => pairs.push(format!("{}:{}", cursor, full_id)),
            None => pairs.push(full_id),
        }
    }

    for id in &opts.show_only_for {
        validate_identifier(id)?;
        pairs.push(format!("*{}", namespace.qualify(id)));
    }

    let body = serde_json::to_string(message)?;

    Ok(Command {
        name: "publish",
        identifier: pairs.join(","),
        body,
    })
}

/// Encode an `online` query
///
/// No prefixes means "everything under the namespace".
pub fn encode_online(prefixes: &[&str], namespace: &Namespace) -> Command {
    let qualified: Vec<String> = qualify_prefixes(prefixes, namespace)
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();

    if qualified.is_empty() {
        Command::plain("online", "online".to_string())
    } else {
        Command::plain("online", format!("online {}", qualified.join(" ")))
    }
}

/// Encode a `watch` request for events after `from_pos`
pub fn encode_watch<P>(from_pos: P, prefixes: &[&str], namespace: &Namespace) -> Result<Command>
where
    P: TryInto<u64> + fmt::Display + Copy,
{
    let pos: u64 = from_pos
        .try_into()
        .map_err(|_| RelayError::InvalidPosition(from_pos.to_string()))?;

    let qualified = qualify_prefixes(prefixes, namespace);
    Ok(Command::plain(
        "watch",
        format!("watch {} {}", pos, qualified.join(" ")),
    ))
}

/// Encode a `stats` request (relay debug dump, guest access only)
pub fn encode_stats() -> Command {
    Command::plain("stats", "stats".to_string())
}

fn qualify_prefixes(prefixes: &[&str], namespace: &Namespace) -> Vec<String> {
    if prefixes.is_empty() {
        vec![namespace.qualify("")]
    } else {
        prefixes.iter().map(|p| namespace.qualify(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ns(prefix: &str) -> Namespace {
        Namespace::new(prefix)
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("abc_123").is_ok());
        assert!(validate_identifier("ÄÖ").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("bad id").is_err());
        assert!(validate_identifier("a,b").is_err());
        assert!(validate_identifier("a\n").is_err());
    }

    #[test]
    fn test_publish_cursors_and_namespace() {
        let targets = PublishTargets::from([("a", Some(5)), ("b", None)]);
        let cmd = encode_publish(&targets, &json!({"x": 1}), &SendOptions::default(), &ns("ns_"))
            .unwrap();

        assert_eq!(cmd.name, "publish");
        assert_eq!(cmd.identifier, "5:ns_a,ns_b");
        assert_eq!(cmd.body, r#"{"x":1}"#);
    }

    #[test]
    fn test_publish_visibility_filter() {
        let targets = PublishTargets::from([("a", Some(5)), ("b", None)]);
        let opts = SendOptions::show_only_for(["v1"]);
        let cmd = encode_publish(&targets, &json!({"x": 1}), &opts, &ns("ns_")).unwrap();

        assert_eq!(cmd.identifier, "5:ns_a,ns_b,*ns_v1");
    }

    #[test]
    fn test_publish_without_namespace() {
        let targets = PublishTargets::ids(["alpha", "beta"]);
        let cmd = encode_publish(&targets, "hello", &SendOptions::default(), &ns("")).unwrap();

        assert_eq!(cmd.identifier, "alpha,beta");
        assert_eq!(cmd.body, "\"hello\"");
    }

    #[test]
    fn test_publish_rejects_bad_identifier() {
        let targets = PublishTargets::ids(["ok", "bad id"]);
        let err = encode_publish(&targets, &json!(null), &SendOptions::default(), &ns(""))
            .unwrap_err();

        assert!(matches!(err, RelayError::InvalidIdentifier(ref id) if id == "bad id"));
        assert!(err.to_string().contains("\"bad id\""));
    }

    #[test]
    fn test_publish_rejects_bad_visibility_identifier() {
        let targets = PublishTargets::ids(["ok"]);
        let opts = SendOptions::show_only_for(["no-dash"]);
        let err = encode_publish(&targets, &json!(1), &opts, &ns("")).unwrap_err();

        assert!(matches!(err, RelayError::InvalidIdentifier(ref id) if id == "no-dash"));
    }

    #[test]
    fn test_publish_nested_message() {
        let message = json!({"list": [1, 2, {"deep": true}], "text": "héllo"});
        let cmd = encode_publish(
            &PublishTargets::ids(["a"]),
            &message,
            &SendOptions::default(),
            &ns(""),
        )
        .unwrap();

        let back: serde_json::Value = serde_json::from_str(&cmd.body).unwrap();
        assert_eq!(back, message);
        assert!(!cmd.body.ends_with('\n'));
    }

    #[test]
    fn test_online_no_prefixes() {
        assert_eq!(encode_online(&[], &ns("")).body, "online\n");
        assert_eq!(encode_online(&[], &ns("ns_")).body, "online ns_\n");
    }

    #[test]
    fn test_online_with_prefixes() {
        let cmd = encode_online(&["chat", "room"], &ns("ns_"));
        assert_eq!(cmd.name, "online");
        assert!(cmd.identifier.is_empty());
        assert_eq!(cmd.body, "online ns_chat ns_room\n");

        assert_eq!(encode_online(&["a", "b"], &ns("")).body, "online a b\n");
    }

    #[test]
    fn test_watch_encoding() {
        let cmd = encode_watch(10, &["a"], &ns("ns_")).unwrap();
        assert_eq!(cmd.name, "watch");
        assert!(cmd.identifier.is_empty());
        assert_eq!(cmd.body, "watch 10 ns_a\n");

        assert_eq!(encode_watch(0u64, &[], &ns("ns_")).unwrap().body, "watch 0 ns_\n");
        assert_eq!(encode_watch(3, &[], &ns("")).unwrap().body, "watch 3 \n");
        assert_eq!(
            encode_watch(7, &["x", "y"], &ns("")).unwrap().body,
            "watch 7 x y\n"
        );
    }

    #[test]
    fn test_watch_rejects_negative_position() {
        let err = encode_watch(-1i64, &[], &ns("")).unwrap_err();
        assert!(matches!(err, RelayError::InvalidPosition(ref p) if p == "-1"));
    }

    #[test]
    fn test_stats_encoding() {
        let cmd = encode_stats();
        assert_eq!(cmd.body, "stats\n");
        assert!(cmd.identifier.is_empty());
        assert_eq!(cmd.to_string(), "stats");
    }
}
