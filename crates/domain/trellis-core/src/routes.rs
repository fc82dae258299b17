use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::percent_decode_str;

use crate::{Crumb, RouteKind, RouteMeta};

pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    /// Matches the remainder of the path, including nothing.
    CatchAll,
}

/// A parsed route pattern such as `/flows/:owner/:name` or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(raw: &str) -> Self {
        let segments = path_segments(raw)
            .map(|s| {
                if s == "*" {
                    Segment::CatchAll
                } else if let Some(name) = s.strip_prefix(':') {
                    Segment::Param(name.to_string())
                } else {
                    Segment::Static(s.to_string())
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_catch_all(&self) -> bool {
        self.segments.contains(&Segment::CatchAll)
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn matches(&self, path: &[&str]) -> Option<Params> {
        let mut params = Params::new();
        for (ix, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::CatchAll => return Some(params),
                Segment::Static(lit) => {
                    if path.get(ix) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = path.get(ix)?;
                    params.insert(
                        name.clone(),
                        percent_decode_str(value).decode_utf8_lossy().into_owned(),
                    );
                }
            }
        }
        (path.len() == self.segments.len()).then_some(params)
    }

    /// Higher ranks win when several patterns match the same path.
    fn rank(&self) -> (bool, usize) {
        let statics = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count();
        (!self.is_catch_all(), statics)
    }
}

/// Splits a URL path into non-empty segments, ignoring query and fragment.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    strip_query(path).split('/').filter(|s| !s.is_empty())
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDef {
    pub pattern: PathPattern,
    /// `None` marks a route whose title must not be applied to the document.
    pub name: Option<String>,
    pub kind: RouteKind,
    pub meta: RouteMeta,
}

impl RouteDef {
    pub fn new(pattern: &str, name: &str, kind: RouteKind, meta: RouteMeta) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            name: Some(name.to_string()),
            kind,
            meta,
        }
    }

    pub fn unnamed(pattern: &str, kind: RouteKind, meta: RouteMeta) -> Self {
        Self {
            pattern: PathPattern::parse(pattern),
            name: None,
            kind,
            meta,
        }
    }

    fn not_found() -> Self {
        Self::new(
            "*",
            "404",
            RouteKind::NotFound,
            RouteMeta::new("Not Found")
                .crumb(Crumb::home())
                .crumb(Crumb::text("404")),
        )
    }
}

/// A route definition matched against a concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub route: Arc<RouteDef>,
    pub params: Params,
    /// The requested path as given, query string included.
    pub full_path: String,
}

impl ResolvedRoute {
    pub fn kind(&self) -> RouteKind {
        self.route.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.route.name.as_deref()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn meta(&self) -> &RouteMeta {
        &self.route.meta
    }
}

/// Ordered route definitions. The last resort is always a catch-all.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Arc<RouteDef>>,
}

impl RouteTable {
    /// Builds a table, appending a not-found catch-all when none is declared.
    pub fn new(routes: Vec<RouteDef>) -> Self {
        let mut routes: Vec<Arc<RouteDef>> = routes.into_iter().map(Arc::new).collect();
        if !routes.iter().any(|r| r.pattern.is_catch_all()) {
            routes.push(Arc::new(RouteDef::not_found()));
        }
        Self { routes }
    }

    /// The application's route surface.
    pub fn standard() -> Self {
        let login_crumb = Crumb::link("log in", trellis_config::login_redirect("/workflows/"));
        Self::new(vec![
            RouteDef::new("/", "home", RouteKind::Home, RouteMeta::new("home")),
            RouteDef::new(
                "/guide",
                "guide",
                RouteKind::Guide,
                RouteMeta::section("guide", "guide", "/guide"),
            ),
            RouteDef::new(
                "/docs",
                "docs",
                RouteKind::Docs,
                RouteMeta::section("docs", "docs", "/docs"),
            ),
            RouteDef::new(
                "/login",
                "login",
                RouteKind::Login,
                RouteMeta::new("log in")
                    .crumb(Crumb::home())
                    .crumb(login_crumb),
            ),
            RouteDef::new(
                "/logout",
                "logout",
                RouteKind::Logout,
                RouteMeta::section("log out", "log out", "/logout"),
            ),
            RouteDef::new(
                "/data",
                "data",
                RouteKind::Data,
                RouteMeta::section("data", "data", "/data"),
            ),
            RouteDef::new(
                "/flows",
                "flows",
                RouteKind::Flows,
                RouteMeta::section("flows", "flows", "/flows"),
            ),
            RouteDef::new(
                "/flows/:owner/:name",
                "flow",
                RouteKind::FlowDetail,
                RouteMeta::section("flow", "flows", "/flows"),
            ),
            RouteDef::new(
                "/runs",
                "runs",
                RouteKind::Runs,
                RouteMeta::section("runs", "runs", "/runs"),
            ),
            RouteDef::new(
                "/runs/:id",
                "run",
                RouteKind::RunDetail,
                RouteMeta::section("run", "runs", "/runs"),
            ),
            RouteDef::new(
                "/users",
                "users",
                RouteKind::Users,
                RouteMeta::section("users", "users", "/users"),
            ),
            RouteDef::new(
                "/users/:username",
                "user",
                RouteKind::UserDetail,
                RouteMeta::section("user", "users", "/users").requiring_auth(),
            ),
            RouteDef::not_found(),
        ])
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteDef> {
        self.routes.iter().map(|r| r.as_ref())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RouteDef> {
        self.routes()
            .find(|r| r.name.as_deref() == Some(name))
    }

    /// Resolves `path` to the most specific matching route. Equal ranks go to
    /// the earliest declaration; unmatched paths land on the catch-all.
    pub fn resolve(&self, path: &str) -> ResolvedRoute {
        let segments: Vec<&str> = path_segments(path).collect();

        let mut best: Option<(&Arc<RouteDef>, Params)> = None;
        for route in &self.routes {
            let Some(params) = route.pattern.matches(&segments) else {
                continue;
            };
            let better = match &best {
                Some((current, _)) => route.pattern.rank() > current.pattern.rank(),
                None => true,
            };
            if better {
                best = Some((route, params));
            }
        }

        // `new` guarantees a catch-all, so `best` is always set here.
        let (route, params) = match best {
            Some((route, params)) => (route.clone(), params),
            None => (Arc::new(RouteDef::not_found()), Params::new()),
        };

        tracing::debug!(path, route = route.pattern.as_str(), "resolved route");
        ResolvedRoute {
            route,
            params,
            full_path: path.to_string(),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_params() {
        let table = RouteTable::standard();
        let r = table.resolve("/flows/alice/flow1");
        assert_eq!(r.kind(), RouteKind::FlowDetail);
        assert_eq!(r.param("owner"), Some("alice"));
        assert_eq!(r.param("name"), Some("flow1"));
    }

    #[test]
    fn trailing_slash_and_query_are_ignored() {
        let table = RouteTable::standard();
        let r = table.resolve("/runs/42/?tab=logs");
        assert_eq!(r.kind(), RouteKind::RunDetail);
        assert_eq!(r.param("id"), Some("42"));
        assert_eq!(r.full_path, "/runs/42/?tab=logs");

        assert_eq!(table.resolve("/login?next=/workflows/").kind(), RouteKind::Login);
    }

    #[test]
    fn params_are_percent_decoded() {
        let table = RouteTable::standard();
        let r = table.resolve("/users/jane%20doe");
        assert_eq!(r.param("username"), Some("jane doe"));
    }

    #[test]
    fn unmatched_paths_fall_through_to_catch_all() {
        let table = RouteTable::standard();
        for path in ["/nope", "/flows/alice", "/runs/1/2", "/users/a/b/c"] {
            let r = table.resolve(path);
            assert_eq!(r.kind(), RouteKind::NotFound, "{path}");
            assert_eq!(r.name(), Some("404"));
        }
    }

    #[test]
    fn static_segment_beats_param() {
        let table = RouteTable::new(vec![
            RouteDef::new("/runs/:id", "run", RouteKind::RunDetail, RouteMeta::new("run")),
            RouteDef::new("/runs/latest", "latest", RouteKind::Runs, RouteMeta::new("latest")),
        ]);
        assert_eq!(table.resolve("/runs/latest").name(), Some("latest"));
        assert_eq!(table.resolve("/runs/7").name(), Some("run"));
    }

    #[test]
    fn equal_rank_goes_to_first_declared() {
        let table = RouteTable::new(vec![
            RouteDef::new("/a/:x", "first", RouteKind::Runs, RouteMeta::new("first")),
            RouteDef::new("/a/:y", "second", RouteKind::Runs, RouteMeta::new("second")),
        ]);
        let r = table.resolve("/a/1");
        assert_eq!(r.name(), Some("first"));
        assert_eq!(r.param("x"), Some("1"));
    }

    #[test]
    fn table_without_catch_all_gets_one() {
        let table = RouteTable::new(vec![RouteDef::new(
            "/",
            "home",
            RouteKind::Home,
            RouteMeta::new("home"),
        )]);
        assert_eq!(table.resolve("/missing").kind(), RouteKind::NotFound);
        assert_eq!(table.resolve("/").kind(), RouteKind::Home);
    }

    #[test]
    fn only_user_detail_requires_auth() {
        let table = RouteTable::standard();
        let guarded: Vec<_> = table
            .routes()
            .filter(|r| r.meta.requires_auth)
            .map(|r| r.pattern.as_str())
            .collect();
        assert_eq!(guarded, vec!["/users/:username"]);
        assert!(table.find_by_name("user").is_some());
    }
}
