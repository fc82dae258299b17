pub mod csrf;
pub mod http;
pub mod report;

// Re-exports for convenience
pub use csrf::csrf_token_from_cookies;
pub use http::{default_http_client, ApiClient, ApiError, ApiErrorKind, HttpApiClient};
pub use report::{ErrorReporter, TracingReporter};
