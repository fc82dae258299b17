pub mod commands;

use camino::Utf8PathBuf;
use clap::ValueEnum;
use trellis_app_core::Resource;
use trellis_core::AuthGate;

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum CliResource {
    Users,
    CurrentUser,
    Workflows,
    Runs,
    Notifications,
}

impl From<CliResource> for Resource {
    fn from(r: CliResource) -> Self {
        match r {
            CliResource::Users => Resource::Users,
            CliResource::CurrentUser => Resource::CurrentUser,
            CliResource::Workflows => Resource::Workflows,
            CliResource::Runs => Resource::Runs,
            CliResource::Notifications => Resource::Notifications,
        }
    }
}

/// Connection and session settings shared by every command.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub api_base: String,
    pub cookie: Option<String>,
    /// Explicit snapshot directory. Wins over `session`.
    pub session_dir: Option<Utf8PathBuf>,
    /// Session id resolved under `sessions_root`.
    pub session: Option<String>,
    pub sessions_root: Option<Utf8PathBuf>,
    pub enforce_auth: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            api_base: trellis_config::DEFAULT_API_BASE.to_string(),
            cookie: None,
            session_dir: None,
            session: None,
            sessions_root: None,
            enforce_auth: false,
        }
    }
}

impl SessionOptions {
    pub fn gate(&self) -> AuthGate {
        if self.enforce_auth {
            AuthGate::Enforce
        } else {
            AuthGate::Inert
        }
    }
}
