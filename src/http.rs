//! Minimal HTTP/1.1 framing for the relay IN line
//!
//! The relay speaks just enough HTTP to be reachable through proxies: the
//! client sends a single POST with an `X-Realplexor` header, and the relay
//! answers with a status line, a `Content-Length` header and a body before
//! closing the connection.

use crate::config::{check_header_value, Credentials};
use crate::error::{RelayError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use std::sync::OnceLock;

/// Header that carries the identifier marker, credentials and target ids
pub const RELAY_HEADER: &str = "X-Realplexor";

fn header_split_regex() -> &'static BytesRegex {
    static RE: OnceLock<BytesRegex> = OnceLock::new();
    RE.get_or_init(|| BytesRegex::new(r"\r?\n\r?\n").unwrap())
}

fn status_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^HTTP/[\d.]+\s+((\d+)[^\r\n]*)").unwrap())
}

fn content_length_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^Content-Length:\s*(\d+)").unwrap())
}

/// Value of the `X-Realplexor` header: `<marker>=[<login>:<password>@]<identifier>`
pub fn header_value(marker: &str, credentials: Option<&Credentials>, identifier: &str) -> String {
    match credentials {
        Some(creds) => format!(
            "{}={}:{}@{}",
            marker, creds.login, creds.password, identifier
        ),
        None => format!("{}={}", marker, identifier),
    }
}

/// Build the raw POST request sent to the relay
///
/// Fails with `Config` when the host, marker or credentials contain
/// control characters.
pub fn build_request(
    host: &str,
    marker: &str,
    credentials: Option<&Credentials>,
    identifier: &str,
    body: &str,
) -> Result<Bytes> {
    check_header_value("host", host)?;
    check_header_value("identifier marker", marker)?;
    if let Some(creds) = credentials {
        check_header_value("login", &creds.login)?;
        check_header_value("password", &creds.password)?;
    }

    let head = format!(
        "POST / HTTP/1.1\r\nHost: {}\r\nContent-Length: {}\r\n{}: {}\r\n\r\n",
        host,
        body.len(),
        RELAY_HEADER,
        header_value(marker, credentials, identifier),
    );

    let mut buf = BytesMut::with_capacity(head.len() + body.len());
    buf.put_slice(head.as_bytes());
    buf.put_slice(body.as_bytes());
    Ok(buf.freeze())
}

/// Validate a raw relay response and return its body
///
/// An empty response (the relay closed without writing) is an empty body.
pub fn parse_response(raw: &[u8]) -> Result<String> {
    if raw.is_empty() {
        return Ok(String::new());
    }

    let split = header_split_regex()
        .find(raw)
        .ok_or_else(|| RelayError::NonHttpResponse(String::from_utf8_lossy(raw).into_owned()))?;

    let headers = String::from_utf8_lossy(&raw[..split.start()]);
    let body = &raw[split.end()..];

    let caps = status_line_regex()
        .captures(&headers)
        .ok_or_else(|| RelayError::NonHttpResponse(String::from_utf8_lossy(raw).into_owned()))?;

    if &caps[2] != "200" {
        return Err(RelayError::RequestFailed {
            status: caps[1].to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    // Digits only, so a failed parse is an overflow; no body can be that long
    let expected: usize = content_length_regex()
        .captures(&headers)
        .map(|c| c[1].parse().unwrap_or(usize::MAX))
        .ok_or_else(|| RelayError::MissingContentLength(headers.to_string()))?;

    if body.len() != expected {
        return Err(RelayError::LengthMismatch {
            actual: body.len(),
            expected,
        });
    }

    Ok(String::from_utf8_lossy(body).into_owned())
}
