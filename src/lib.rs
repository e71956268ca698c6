//! # http-logger
//!
//! Axum middleware that records every request/response pair travelling
//! through a wrapped handler to per-endpoint, per-day log files, without
//! altering what the handler or its caller observe.
//!
//! ## How it works
//!
//! - The request body is buffered and restored, so the wrapped handler sees
//!   an intact stream.
//! - The wrapped handler runs exactly once; its response is buffered,
//!   inspected, and released to the caller byte-for-byte.
//! - Classification, formatting, and file persistence happen on a single
//!   background task, off the response path. The single consumer keeps
//!   records for the same file in completion order.
//! - Records append to `<LOG_PATH>/http-logger<sanitized-path>-<date>.log`;
//!   every I/O failure is reported through the injected [`HostLogger`] and
//!   swallowed.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use http_logger::{HttpLoggerLayer, TracingLogger};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // The block a host runtime hands over from its extra-config file.
//!     let extra = json!({
//!         "http-logger": { "is_show_on_stdout": false }
//!     });
//!     let layer = HttpLoggerLayer::register(&extra, Arc::new(TracingLogger)).unwrap();
//!
//!     let app = Router::new()
//!         .route("/hello", get(|| async { "Hello, World!" }))
//!         .layer(layer);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! ## Configuration
//!
//! The plugin reads its block under the [`PLUGIN_NAME`] key of the host's
//! extra-config mapping. A missing or malformed block declines registration
//! and the host keeps its unwrapped handler.
//!
//! | key | type | default | effect |
//! |-----|------|---------|--------|
//! | `is_show_on_stdout` | bool | `false` | echo each record through the injected logger's debug channel |
//!
//! The log directory comes from the `LOG_PATH` environment variable, read
//! on every write; unset means the current directory.

pub mod env;
pub mod logger;
pub mod record;
pub mod sink;
pub mod types;

pub use logger::{HostLogger, NoopLogger, TracingLogger};
pub use record::OutcomeLevel;
pub use sink::LOG_PATH_ENV;
pub use types::{CapturedResponse, RequestSnapshot};

use axum::extract::Request;
use axum::response::Response;
use chrono::Local;
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tower::{Layer, Service};
use tracing::{debug, instrument};
use types::LogTask;

/// Name the host runtime registers this plugin under; also the prefix of
/// every log file it writes.
pub const PLUGIN_NAME: &str = "http-logger";

/// Plugin configuration, validated once at registration time.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct HttpLoggerConfig {
    /// Echo every record through the injected logger's debug channel.
    #[serde(default)]
    pub is_show_on_stdout: bool,
}

impl HttpLoggerConfig {
    /// Pulls this plugin's block out of the host's extra-config mapping.
    ///
    /// The block must exist under [`PLUGIN_NAME`] and be an object; anything
    /// else is a registration error, and the host should fall back to the
    /// unwrapped handler.
    pub fn from_extra_config(extra: &serde_json::Value) -> Result<Self, ConfigError> {
        let block = extra.get(PLUGIN_NAME).ok_or(ConfigError::MissingBlock)?;
        Ok(serde_json::from_value(block.clone())?)
    }
}

/// Registration failure. Never produced at request time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration block `http-logger` not found")]
    MissingBlock,
    #[error("invalid `http-logger` configuration: {0}")]
    InvalidBlock(#[from] serde_json::Error),
}

/// Tower layer wrapping a handler with request/response recording.
///
/// Construction spawns the background recording task, so the layer must be
/// created within a Tokio runtime. Cloning the layer (or its services)
/// shares the one recording channel.
#[derive(Clone)]
pub struct HttpLoggerLayer {
    logger: Arc<dyn HostLogger>,
    tx: mpsc::UnboundedSender<LogTask>,
}

impl HttpLoggerLayer {
    /// Registration entry point for a host runtime.
    ///
    /// `extra` is the host's whole extra-config mapping; `logger` is the
    /// host's leveled log sink (use [`NoopLogger`] when there is none). An
    /// `Err` means the host should keep serving with the unwrapped handler.
    pub fn register(
        extra: &serde_json::Value,
        logger: Arc<dyn HostLogger>,
    ) -> Result<Self, ConfigError> {
        let config = HttpLoggerConfig::from_extra_config(extra)?;
        logger.debug(&format!(
            "[PLUGIN: {PLUGIN_NAME}] show log on terminal {}",
            config.is_show_on_stdout
        ));
        Ok(Self::new(config, logger))
    }

    /// Builds the layer from an already-validated configuration.
    pub fn new(config: HttpLoggerConfig, logger: Arc<dyn HostLogger>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LogTask>();
        let worker_logger = logger.clone();

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                let now = Local::now();
                let level = OutcomeLevel::from_status(task.status);
                let line = record::format_record(&task, level, now);
                if config.is_show_on_stdout {
                    worker_logger.debug(&line);
                }
                sink::write_record(
                    task.snapshot.path(),
                    &line,
                    now.date_naive(),
                    worker_logger.as_ref(),
                );
            }
        });

        Self { logger, tx }
    }
}

impl<S> Layer<S> for HttpLoggerLayer {
    type Service = HttpLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpLoggerService {
            inner,
            logger: self.logger.clone(),
            tx: self.tx.clone(),
        }
    }
}

/// Service produced by [`HttpLoggerLayer`].
///
/// Per request: snapshot → inner call → capture → queue record → release.
/// The captured response is released to the caller exactly once, whatever
/// happens on the recording side.
#[derive(Clone)]
pub struct HttpLoggerService<S> {
    inner: S,
    logger: Arc<dyn HostLogger>,
    tx: mpsc::UnboundedSender<LogTask>,
}

impl<S> Service<Request> for HttpLoggerService<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    #[instrument(skip_all)]
    fn call(&mut self, mut request: Request) -> Self::Future {
        // https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let logger = self.logger.clone();
        let tx = self.tx.clone();

        Box::pin(async move {
            let snapshot = RequestSnapshot::capture(&mut request, logger.as_ref()).await;
            debug!(method = %snapshot.method, path = snapshot.path(), "request snapshot taken");

            let response = inner.call(request).await?;
            let captured = CapturedResponse::capture(response, logger.as_ref()).await;

            let task = LogTask {
                snapshot,
                status: captured.status(),
                response_body: captured.body(),
            };
            if tx.send(task).is_err() {
                logger.error("recording task is gone, request not logged");
            }

            Ok(captured.release())
        })
    }
}
