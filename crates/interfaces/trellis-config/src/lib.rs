//! Central configuration constants for endpoints, session storage and defaults.

/// Backend used when no `--api-base` is given.
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Prefix shared by every REST endpoint.
pub const API_PREFIX: &str = "/apis/v1";

pub const USERS_ENDPOINT: &str = "/apis/v1/users/";
pub const CURRENT_USER_ENDPOINT: &str = "/apis/v1/users/get_current/";
pub const TOGGLE_DARK_MODE_ENDPOINT: &str = "/apis/v1/users/toggle_dark_mode/";
pub const WORKFLOWS_ENDPOINT: &str = "/apis/v1/workflows/";
pub const RUNS_ENDPOINT: &str = "/apis/v1/runs/";
pub const NOTIFICATIONS_ENDPOINT: &str = "/apis/v1/notifications/";

/// Cookie holding the anti-forgery token issued by the backend.
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Header the token is echoed back in on mutating requests.
pub const CSRF_HEADER_NAME: &str = "X-CSRFToken";

/// Session storage key the store snapshot is written under.
pub const SNAPSHOT_KEY: &str = "trellis.store";

/// Snapshot layout version. Bump when `RootState` changes incompatibly.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Request timeout for the HTTP client (seconds).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where unauthenticated visitors are sent when auth is enforced.
pub const LOGIN_PATH: &str = "/login/";

/// Environment variable naming a session storage directory.
pub const SESSION_DIR_ENV: &str = "TRELLIS_SESSION_DIR";

/// Environment variable naming the directory that holds per-session
/// directories created by id.
pub const SESSIONS_ROOT_ENV: &str = "TRELLIS_SESSIONS_ROOT";

/// Environment variable naming the session id to resume.
pub const SESSION_ID_ENV: &str = "TRELLIS_SESSION";

/// Path of a single run record.
pub fn run_endpoint(id: &str) -> String {
    format!("{RUNS_ENDPOINT}{id}/")
}

/// Login redirect target carrying the originally requested path.
pub fn login_redirect(next: &str) -> String {
    format!("{LOGIN_PATH}?next={next}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_share_prefix() {
        for ep in [
            USERS_ENDPOINT,
            CURRENT_USER_ENDPOINT,
            WORKFLOWS_ENDPOINT,
            RUNS_ENDPOINT,
            NOTIFICATIONS_ENDPOINT,
        ] {
            assert!(ep.starts_with(API_PREFIX), "{ep}");
            assert!(ep.ends_with('/'), "{ep}");
        }
        assert_eq!(run_endpoint("42"), "/apis/v1/runs/42/");
    }

    #[test]
    fn login_redirect_keeps_next() {
        assert_eq!(login_redirect("/users/bob"), "/login/?next=/users/bob");
    }
}
