//! Owns the navigation state a browser would keep: the current route, the
//! document title and the rendered breadcrumb trail.

use serde::Serialize;
use trellis_core::{
    AuthGate, Crumb, Interceptor, NavigationContext, NavigationDecision, ResolvedRoute,
    RouteKind, RouteTable, SessionProbe, HOME_CRUMB_TEXT,
};

/// Redirect hops followed by [`Navigator::navigate_following`] before giving up.
pub const MAX_REDIRECTS: usize = 4;

/// What one navigation attempt produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationOutcome {
    pub path: String,
    pub route: Option<String>,
    pub kind: RouteKind,
    pub title: String,
    pub crumbs: Vec<Crumb>,
    #[serde(flatten)]
    pub decision: NavigationDecision,
}

#[derive(Debug)]
pub struct Navigator {
    table: RouteTable,
    interceptor: Interceptor,
    current: Option<ResolvedRoute>,
    document_title: String,
    crumbs: Vec<Crumb>,
}

impl Navigator {
    pub fn new(table: RouteTable, gate: AuthGate) -> Self {
        Self {
            table,
            interceptor: Interceptor::new(gate),
            current: None,
            document_title: HOME_CRUMB_TEXT.to_string(),
            crumbs: Vec::new(),
        }
    }

    pub fn standard(gate: AuthGate) -> Self {
        Self::new(RouteTable::standard(), gate)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current(&self) -> Option<&ResolvedRoute> {
        self.current.as_ref()
    }

    pub fn document_title(&self) -> &str {
        &self.document_title
    }

    pub fn crumbs(&self) -> &[Crumb] {
        &self.crumbs
    }

    /// Runs the interceptor for `path`. The document title is updated whenever
    /// the target route is named; the trail and current route only when the
    /// navigation proceeds.
    pub fn navigate(&mut self, path: &str, session: &dyn SessionProbe) -> NavigationOutcome {
        let to = self.table.resolve(path);
        let mut decision = NavigationDecision::Abort;

        let meta = self.interceptor.before_each(
            NavigationContext {
                to: &to,
                from: self.current.as_ref(),
            },
            session,
            |d| decision = d,
        );

        if meta.apply_title {
            self.document_title = meta.title.clone();
        }
        if decision == NavigationDecision::Proceed {
            self.crumbs = meta.crumbs.clone();
        }

        let outcome = NavigationOutcome {
            path: to.full_path.clone(),
            route: to.name().map(str::to_string),
            kind: to.kind(),
            title: meta.title,
            crumbs: meta.crumbs,
            decision,
        };
        if outcome.decision == NavigationDecision::Proceed {
            self.current = Some(to);
        }
        outcome
    }

    /// Navigates to `path` and follows redirects, returning every attempt.
    pub fn navigate_following(
        &mut self,
        path: &str,
        session: &dyn SessionProbe,
    ) -> Vec<NavigationOutcome> {
        let mut outcomes = Vec::new();
        let mut target = path.to_string();
        loop {
            let outcome = self.navigate(&target, session);
            let next = match &outcome.decision {
                NavigationDecision::Redirect(to) => Some(to.clone()),
                _ => None,
            };
            outcomes.push(outcome);

            match next {
                Some(to) if outcomes.len() <= MAX_REDIRECTS => target = to,
                Some(to) => {
                    tracing::warn!(from = path, to, "too many redirects, stopping");
                    break;
                }
                None => break,
            }
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{RouteDef, RouteMeta};

    #[test]
    fn unnamed_route_keeps_previous_title() {
        let table = RouteTable::new(vec![
            RouteDef::new("/runs/:id", "run", RouteKind::RunDetail, RouteMeta::new("run")),
            RouteDef::unnamed("/data", RouteKind::Data, RouteMeta::new("data")),
        ]);
        let mut nav = Navigator::new(table, AuthGate::Inert);

        nav.navigate("/runs/r1", &false);
        assert_eq!(nav.document_title(), "run r1");

        let outcome = nav.navigate("/data", &false);
        assert_eq!(outcome.title, "data");
        assert_eq!(nav.document_title(), "run r1");
        assert_eq!(nav.current().map(|r| r.kind()), Some(RouteKind::Data));
    }

    #[test]
    fn redirected_navigation_keeps_previous_trail() {
        let mut nav = Navigator::standard(AuthGate::Enforce);
        nav.navigate("/runs/", &false);
        let before = nav.crumbs().to_vec();

        let outcome = nav.navigate("/users/alice", &false);
        assert_eq!(
            outcome.decision,
            NavigationDecision::Redirect("/login/?next=/users/alice".into())
        );
        assert_eq!(nav.crumbs(), before.as_slice());
        assert_eq!(nav.current().map(|r| r.kind()), Some(RouteKind::Runs));
    }

    #[test]
    fn redirects_are_followed_to_login() {
        let mut nav = Navigator::standard(AuthGate::Enforce);
        let outcomes = nav.navigate_following("/users/alice", &false);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].kind, RouteKind::Login);
        assert_eq!(outcomes[1].decision, NavigationDecision::Proceed);
        assert_eq!(nav.current().map(|r| r.kind()), Some(RouteKind::Login));
        assert_eq!(nav.document_title(), "log in");
    }

    #[test]
    fn logged_in_session_reaches_user_page() {
        let mut nav = Navigator::standard(AuthGate::Enforce);
        let outcomes = nav.navigate_following("/users/alice", &true);

        assert_eq!(outcomes.len(), 1);
        assert_eq!(nav.document_title(), "user alice");
        assert_eq!(
            nav.crumbs().last(),
            Some(&Crumb::link("alice", "/users/alice"))
        );
    }
}
