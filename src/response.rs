//! Parsing of relay response bodies
//!
//! Bodies are newline-separated records. Parsing is lenient: a line that
//! does not have the expected shape is skipped, never escalated, since the
//! relay may include partial or informational lines.

use crate::namespace::Namespace;
use crate::types::{CursorMap, OnlineCounters, WatchEvent};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn watch_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\s+(\d+):(\S+)\s*$").unwrap())
}

/// Parse a publish acknowledgement: `id cursor` per line
pub fn parse_publish_result(body: &str, namespace: &Namespace) -> CursorMap {
    parse_id_number_lines(body, namespace)
}

/// Parse an `online` reply: `id counter` per line
pub fn parse_online_result(body: &str, namespace: &Namespace) -> OnlineCounters {
    parse_id_number_lines(body, namespace)
}

/// Parse a `watch` reply: `kind pos:id` per line, order preserved
pub fn parse_watch_result(body: &str, namespace: &Namespace) -> Vec<WatchEvent> {
    body.lines()
        .filter_map(|line| {
            let event = parse_watch_line(line, namespace);
            if event.is_none() {
                skipped(line);
            }
            event
        })
        .collect()
}

fn parse_id_number_lines(body: &str, namespace: &Namespace) -> HashMap<String, u64> {
    body.lines()
        .filter_map(|line| {
            let pair = parse_id_number_line(line, namespace);
            if pair.is_none() {
                skipped(line);
            }
            pair
        })
        .collect()
}

fn parse_id_number_line(line: &str, namespace: &Namespace) -> Option<(String, u64)> {
    let mut tokens = line.split_whitespace();
    let id = tokens.next()?;
    let number = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some((namespace.unqualify(id), number))
}

fn parse_watch_line(line: &str, namespace: &Namespace) -> Option<WatchEvent> {
    let caps = watch_line_regex().captures(line)?;
    let pos = caps[2].parse().ok()?;
    Some(WatchEvent::new(&caps[1], pos, namespace.unqualify(&caps[3])))
}

fn skipped(line: &str) {
    if !line.trim().is_empty() {
        tracing::trace!(line = %line, "Skipping malformed relay response line");
    }
}
