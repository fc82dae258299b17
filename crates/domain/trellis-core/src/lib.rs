use serde::{Deserialize, Serialize};

pub mod navigation;
pub mod routes;

pub use navigation::{
    login_redirect_for, AuthGate, Interceptor, NavigationContext, NavigationDecision, NavigationMeta,
    SessionProbe,
};
pub use routes::{Params, PathPattern, ResolvedRoute, RouteDef, RouteTable};

/// Label of the first crumb on every trail.
pub const HOME_CRUMB_TEXT: &str = "trellis";

/// A single breadcrumb entry. Crumbs without `href` render as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl Crumb {
    pub fn link(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: Some(href.into()),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: None,
        }
    }

    pub fn home() -> Self {
        Self::link(HOME_CRUMB_TEXT, "/")
    }
}

/// Static per-route metadata. Never mutated once the table is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteMeta {
    pub title: String,
    pub crumbs: Vec<Crumb>,
    #[serde(default)]
    pub requires_auth: bool,
}

impl RouteMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            crumbs: Vec::new(),
            requires_auth: false,
        }
    }

    /// Metadata whose trail starts at the home crumb and ends at `(text, href)`.
    pub fn section(title: impl Into<String>, text: &str, href: &str) -> Self {
        Self::new(title)
            .crumb(Crumb::home())
            .crumb(Crumb::link(text, href))
    }

    pub fn crumb(mut self, crumb: Crumb) -> Self {
        self.crumbs.push(crumb);
        self
    }

    pub fn requiring_auth(mut self) -> Self {
        self.requires_auth = true;
        self
    }
}

/// What a route shows. Navigation rules are keyed on this, not on names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteKind {
    Home,
    Guide,
    Docs,
    Login,
    Logout,
    Data,
    Flows,
    /// Single workflow, parameterized by `owner` and `name`.
    FlowDetail,
    Runs,
    /// Single run, parameterized by `id`.
    RunDetail,
    Users,
    /// Single user, parameterized by `username`.
    UserDetail,
    NotFound,
}

impl RouteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RouteKind::Home => "home",
            RouteKind::Guide => "guide",
            RouteKind::Docs => "docs",
            RouteKind::Login => "login",
            RouteKind::Logout => "logout",
            RouteKind::Data => "data",
            RouteKind::Flows => "flows",
            RouteKind::FlowDetail => "flow-detail",
            RouteKind::Runs => "runs",
            RouteKind::RunDetail => "run-detail",
            RouteKind::Users => "users",
            RouteKind::UserDetail => "user-detail",
            RouteKind::NotFound => "not-found",
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
