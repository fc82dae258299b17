//! Per-navigation title and breadcrumb computation.
//!
//! The interceptor runs once before a navigation is committed. It never
//! mutates the route table: every call builds a fresh trail from the target
//! route's static crumbs and then applies the rule registered for its kind.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Serialize;

use crate::routes::ResolvedRoute;
use crate::{Crumb, RouteKind};

/// Characters escaped when a path is carried in the login `next` parameter.
/// Slashes stay readable; anything that would end or split the value does not.
const NEXT_PARAM: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Login page URL that returns to `path` afterwards.
pub fn login_redirect_for(path: &str) -> String {
    trellis_config::login_redirect(&utf8_percent_encode(path, NEXT_PARAM).to_string())
}

/// Href prefix of the crumbs appended for a single workflow.
pub const WORKFLOW_CRUMB_PREFIX: &str = "/workflows/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum NavigationDecision {
    Proceed,
    Redirect(String),
    Abort,
}

/// How routes flagged `requires_auth` are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthGate {
    /// The flag is carried but never acted on.
    #[default]
    Inert,
    /// Unauthenticated visitors are redirected to the login page.
    Enforce,
}

/// Answers "is somebody logged in" for the auth gate.
pub trait SessionProbe {
    fn logged_in(&self) -> bool;
}

impl SessionProbe for bool {
    fn logged_in(&self) -> bool {
        *self
    }
}

/// Title and trail computed for one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationMeta {
    pub title: String,
    pub crumbs: Vec<Crumb>,
    /// False when the target route is unnamed; the document title stays as is.
    pub apply_title: bool,
}

pub struct NavigationContext<'a> {
    pub to: &'a ResolvedRoute,
    pub from: Option<&'a ResolvedRoute>,
}

type TrailRule = fn(&mut Vec<Crumb>, &ResolvedRoute);
type TitleRule = fn(&ResolvedRoute) -> Option<String>;

fn trail_rule(kind: RouteKind) -> Option<TrailRule> {
    match kind {
        RouteKind::FlowDetail => Some(flow_detail_rule as TrailRule),
        RouteKind::RunDetail => Some(run_detail_rule as TrailRule),
        RouteKind::UserDetail => Some(user_detail_rule as TrailRule),
        _ => None,
    }
}

fn title_rule(kind: RouteKind) -> Option<TitleRule> {
    match kind {
        RouteKind::FlowDetail => Some(flow_detail_title as TitleRule),
        RouteKind::RunDetail => Some(run_detail_title as TitleRule),
        RouteKind::UserDetail => Some(user_detail_title as TitleRule),
        _ => None,
    }
}

fn flow_detail_rule(trail: &mut Vec<Crumb>, to: &ResolvedRoute) {
    if let (Some(owner), Some(name)) = (to.param("owner"), to.param("name")) {
        workflow_detail_trail(trail, owner, name);
    }
}

fn run_detail_rule(trail: &mut Vec<Crumb>, to: &ResolvedRoute) {
    if let Some(id) = to.param("id") {
        run_detail_trail(trail, id);
    }
}

fn user_detail_rule(trail: &mut Vec<Crumb>, to: &ResolvedRoute) {
    if let Some(username) = to.param("username") {
        user_detail_trail(trail, username);
    }
}

fn flow_detail_title(to: &ResolvedRoute) -> Option<String> {
    to.param("name").map(|name| format!("flow {name}"))
}

fn run_detail_title(to: &ResolvedRoute) -> Option<String> {
    to.param("id").map(|id| format!("run {id}"))
}

fn user_detail_title(to: &ResolvedRoute) -> Option<String> {
    to.param("username").map(|username| format!("user {username}"))
}

/// Appends owner and name crumbs, first dropping a workflow suffix left by an
/// earlier application so repeated calls never grow the trail.
pub fn workflow_detail_trail(trail: &mut Vec<Crumb>, owner: &str, name: &str) {
    if has_workflow_suffix(trail) {
        trail.truncate(trail.len() - 2);
    }
    trail.push(Crumb::link(owner, format!("{WORKFLOW_CRUMB_PREFIX}{owner}")));
    trail.push(Crumb::link(
        name,
        format!("{WORKFLOW_CRUMB_PREFIX}{owner}/{name}"),
    ));
}

fn has_workflow_suffix(trail: &[Crumb]) -> bool {
    trail.len() >= 2
        && trail[trail.len() - 2..].iter().all(|c| {
            c.href
                .as_deref()
                .is_some_and(|h| h.starts_with(WORKFLOW_CRUMB_PREFIX))
        })
}

pub fn run_detail_trail(trail: &mut Vec<Crumb>, id: &str) {
    trail.truncate(1);
    trail.push(Crumb::link("runs", "/runs/"));
    trail.push(Crumb::link(id, format!("/runs/{id}")));
}

pub fn user_detail_trail(trail: &mut Vec<Crumb>, username: &str) {
    trail.truncate(1);
    trail.push(Crumb::link("users", "/users/"));
    trail.push(Crumb::link(username, format!("/users/{username}")));
}

/// Computes the title and trail for `to` without side effects.
pub fn compute_meta(to: &ResolvedRoute) -> NavigationMeta {
    let meta = to.meta();
    let mut crumbs = meta.crumbs.clone();
    if let Some(rule) = trail_rule(to.kind()) {
        rule(&mut crumbs, to);
    }
    let title = title_rule(to.kind())
        .and_then(|rule| rule(to))
        .unwrap_or_else(|| meta.title.clone());

    NavigationMeta {
        title,
        crumbs,
        apply_title: to.name().is_some(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Interceptor {
    gate: AuthGate,
}

impl Interceptor {
    pub fn new(gate: AuthGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> AuthGate {
        self.gate
    }

    /// Computes navigation metadata and hands the decision to `next`.
    ///
    /// `next` is `FnOnce` and is called on every path, so each navigation
    /// attempt is committed, redirected or aborted exactly once.
    pub fn before_each<F>(
        &self,
        ctx: NavigationContext<'_>,
        session: &dyn SessionProbe,
        next: F,
    ) -> NavigationMeta
    where
        F: FnOnce(NavigationDecision),
    {
        let meta = compute_meta(ctx.to);

        tracing::debug!(
            to = ctx.to.full_path.as_str(),
            from = ctx.from.map(|f| f.full_path.as_str()),
            title = meta.title.as_str(),
            "before navigation"
        );

        next(self.decide(ctx.to, session));
        meta
    }

    fn decide(&self, to: &ResolvedRoute, session: &dyn SessionProbe) -> NavigationDecision {
        match self.gate {
            AuthGate::Inert => NavigationDecision::Proceed,
            AuthGate::Enforce if to.meta().requires_auth && !session.logged_in() => {
                NavigationDecision::Redirect(login_redirect_for(&to.full_path))
            }
            AuthGate::Enforce => NavigationDecision::Proceed,
        }
    }
}
