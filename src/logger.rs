//! Logger capability injected by the host runtime.
//!
//! The host owns the real logging backend; this crate only needs a leveled
//! sink for its own diagnostics and for the optional record echo enabled by
//! `is_show_on_stdout`. Until the host injects one, [`NoopLogger`] keeps
//! every call silent. [`TracingLogger`] adapts the interface onto the
//! `tracing` ecosystem for hosts that run a `tracing` subscriber.

/// Leveled logging interface supplied by the host at registration time.
///
/// Messages are pre-formatted strings; callers use `format!` where the host
/// side would pass a value list.
pub trait HostLogger: Send + Sync + 'static {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
    fn critical(&self, message: &str);
    fn fatal(&self, message: &str);
}

/// Default logger: discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl HostLogger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn critical(&self, _message: &str) {}
    fn fatal(&self, _message: &str) {}
}

/// Forwards host log calls to `tracing` macros.
///
/// `critical` and `fatal` have no direct `tracing` level and map to
/// `error` with a marker field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl HostLogger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }

    fn critical(&self, message: &str) {
        tracing::error!(critical = true, "{message}");
    }

    fn fatal(&self, message: &str) {
        tracing::error!(fatal = true, "{message}");
    }
}
