use crate::http::ApiError;

/// Fire-and-forget exception sink.
pub trait ErrorReporter: Send + Sync {
    fn capture_exception(&self, err: &ApiError);
}

/// Reports exceptions as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn capture_exception(&self, err: &ApiError) {
        tracing::error!(
            kind = ?err.kind(),
            status = err.status(),
            "captured exception: {err}"
        );
    }
}
