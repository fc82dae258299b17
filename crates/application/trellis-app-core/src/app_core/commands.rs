use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Users,
    CurrentUser,
    Workflows,
    Runs,
    Notifications,
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    // Navigation
    Navigate(String),

    // Loads
    Load(Resource),
    LoadRun(String),

    // Runs
    /// Starts a run from the given workflow payload.
    SubmitRun(Value),

    // Session
    ToggleDarkMode,
    LogOut,

    // Notifications
    MarkNotificationRead(String),
    DismissNotification(String),
}
