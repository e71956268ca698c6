//! Outcome classification and log record formatting.
//!
//! The record is a single pipe-delimited line with a fixed field order.
//! These files get grepped by downstream tooling, so reordering or renaming
//! fields is a breaking change.

use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Local};
use std::fmt;

use crate::types::LogTask;

/// Timestamp layout for the record's leading field.
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity of a completed request, derived from the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeLevel {
    Success,
    Error,
}

impl OutcomeLevel {
    /// Client and server errors both count as `Error`; everything below
    /// 400 is `Success`. The boundary is a compatibility contract.
    pub fn from_status(status: StatusCode) -> Self {
        if status.as_u16() >= 400 {
            Self::Error
        } else {
            Self::Success
        }
    }
}

impl fmt::Display for OutcomeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        })
    }
}

/// Builds the record line for one completed request.
pub(crate) fn format_record(task: &LogTask, level: OutcomeLevel, timestamp: DateTime<Local>) -> String {
    let snapshot = &task.snapshot;
    format!(
        "TIMESTAMP: {} | LOG-LEVEL: {} | USER-AGENT: {} | URL: {} | IP-CLIENT: {} | METHOD: {} | HTTP-CODE: {} | REQUEST-HEADER: {} | QUERY-PARAMS: {} | REQUEST-BODY: {} | RESPONSE: {}",
        timestamp.format(TIMESTAMP_FORMAT),
        level,
        snapshot.user_agent(),
        snapshot.uri,
        snapshot.client_addr,
        snapshot.method,
        task.status.as_u16(),
        render_headers(&snapshot.headers),
        render_query(&snapshot.query),
        String::from_utf8_lossy(&snapshot.body),
        String::from_utf8_lossy(&task.response_body),
    )
}

/// `{name: [v1, v2], ...}` in header-map order. Deterministic per run.
fn render_headers(headers: &HeaderMap) -> String {
    let mut out = String::from("{");
    for (i, name) in headers.keys().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let values: Vec<_> = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .collect();
        out.push_str(name.as_str());
        out.push_str(": [");
        out.push_str(&values.join(", "));
        out.push(']');
    }
    out.push('}');
    out
}

/// Decoded `key=value` pairs joined with `&`, repeats kept in order.
fn render_query(query: &[(String, Vec<String>)]) -> String {
    let mut pairs = Vec::new();
    for (key, values) in query {
        for value in values {
            pairs.push(format!("{key}={value}"));
        }
    }
    pairs.join("&")
}
