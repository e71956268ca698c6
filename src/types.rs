//! Captured request and response state for a single intercepted exchange.
//!
//! Both captures buffer the full body in memory: the snapshot puts an
//! identical body back on the request so the wrapped handler sees an intact
//! stream, and the captured response is rebuilt byte-for-byte when released
//! to the caller.

use axum::body::{Body, Bytes};
use axum::extract::{ConnectInfo, Request};
use axum::http::response::Parts;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use http_body_util::BodyExt;
use std::net::SocketAddr;

use crate::logger::HostLogger;

/// Immutable copy of an inbound request, taken before the wrapped handler
/// runs.
///
/// The client address is whatever the transport layer supplied via
/// [`ConnectInfo`] — no DNS lookups, no proxy-header interpretation. It is
/// empty when the server was not set up with connect info.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    pub method: Method,
    /// Full request URI including the query string.
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Decoded query pairs grouped by key, first-seen order, repeats kept.
    pub query: Vec<(String, Vec<String>)>,
    pub body: Bytes,
    pub client_addr: String,
}

impl RequestSnapshot {
    /// Buffers the request body and restores an identical copy, leaving the
    /// request as if it had never been read.
    ///
    /// A body read failure is reported through `logger` and degrades to an
    /// empty captured body; the request itself keeps flowing.
    pub async fn capture(request: &mut Request, logger: &dyn HostLogger) -> Self {
        let method = request.method().clone();
        let uri = request.uri().clone();
        let headers = request.headers().clone();
        let query = parse_query(uri.query());
        let client_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.to_string())
            .unwrap_or_default();

        let body = std::mem::replace(request.body_mut(), Body::empty());
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                logger.error(&format!("failed to read request body: {err}"));
                Bytes::new()
            }
        };
        *request.body_mut() = Body::from(body.clone());

        Self {
            method,
            uri,
            headers,
            query,
            body,
            client_addr,
        }
    }

    /// Request path without the query string; drives the log file name.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// First `User-Agent` value, empty when the client sent none.
    pub fn user_agent(&self) -> &str {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}

fn parse_query(query: Option<&str>) -> Vec<(String, Vec<String>)> {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    let Some(query) = query else {
        return grouped;
    };
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match grouped.iter_mut().find(|(k, _)| k.as_str() == key.as_ref()) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((key.into_owned(), vec![value.into_owned()])),
        }
    }
    grouped
}

/// The wrapped handler's response, buffered whole and awaiting release.
///
/// The head keeps whatever status the handler set (200 when it never set
/// one, as `http` defaults). [`release`](Self::release) consumes `self`, so
/// the buffered response can reach the caller exactly once.
#[derive(Debug)]
pub struct CapturedResponse {
    parts: Parts,
    body: Bytes,
}

impl CapturedResponse {
    /// Consumes the response and accumulates its entire body.
    pub async fn capture(response: Response, logger: &dyn HostLogger) -> Self {
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                logger.error(&format!("failed to read response body: {err}"));
                Bytes::new()
            }
        };
        Self { parts, body }
    }

    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    /// Cheap handle on the buffered body.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }

    /// Rebuilds the exact response the wrapped handler produced: status,
    /// then body, in that order.
    pub fn release(self) -> Response {
        Response::from_parts(self.parts, Body::from(self.body))
    }
}

/// Work item handed to the background recording task.
#[derive(Debug)]
pub(crate) struct LogTask {
    pub(crate) snapshot: RequestSnapshot,
    pub(crate) status: StatusCode,
    pub(crate) response_body: Bytes,
}
