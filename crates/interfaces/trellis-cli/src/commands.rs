use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use trellis_app_core::{
    user, AppCommand, AppKernel, AppStore, CommandOutcome, Mutation, NavigationOutcome,
    Navigator, Resource, RootState,
};
use trellis_core::{NavigationDecision, RouteTable};
use trellis_infra::{default_http_client, HttpApiClient, TracingReporter};
use trellis_persistence::{
    restore_snapshot, sessions_root, FileSessionStorage, MemorySessionStorage, SessionStorage,
};

use crate::{CliResource, SessionOptions};

fn resolve_sessions_root(opts: &SessionOptions) -> Result<Utf8PathBuf> {
    match &opts.sessions_root {
        Some(root) => Ok(root.clone()),
        None => sessions_root().context("No sessions root available"),
    }
}

/// File storage named by the options: the session directory if given,
/// otherwise the session id under the sessions root.
pub fn session_storage(opts: &SessionOptions) -> Result<Option<FileSessionStorage>> {
    if let Some(dir) = &opts.session_dir {
        let storage = FileSessionStorage::new(dir.clone())
            .with_context(|| format!("Failed to open session directory {dir}"))?;
        return Ok(Some(storage));
    }
    let Some(id) = &opts.session else {
        return Ok(None);
    };
    let root = resolve_sessions_root(opts)?;
    let storage = FileSessionStorage::for_session_in(&root, id)
        .with_context(|| format!("Failed to open session {id}"))?;
    Ok(Some(storage))
}

/// Opens the store backing this invocation: file-backed when a session is
/// named, in memory otherwise.
pub fn open_store(opts: &SessionOptions) -> Result<AppStore> {
    let storage: Arc<dyn SessionStorage> = match session_storage(opts)? {
        Some(storage) => Arc::new(storage),
        None => Arc::new(MemorySessionStorage::new()),
    };
    AppStore::open(storage, opts.cookie.as_deref()).context("Failed to restore session")
}

/// Creates a fresh session under the sessions root and prints its id.
pub fn cmd_new_session(opts: &SessionOptions) -> Result<String> {
    let root = resolve_sessions_root(opts)?;
    let storage = FileSessionStorage::new_session_in(&root)
        .with_context(|| format!("Failed to create a session under {root}"))?;
    let id = storage
        .session_id()
        .context("Session directory has no name")?
        .to_string();

    let store = AppStore::open(Arc::new(storage), opts.cookie.as_deref())
        .context("Failed to open new session")?;
    if let Some(token) = store.read(|s| s.csrf_token().map(str::to_string)) {
        store.commit(Mutation::SetCsrfToken(Some(token)));
    }

    println!("{id}");
    Ok(id)
}

/// Logs out and deletes everything stored for the named session.
pub fn cmd_end_session(opts: &SessionOptions) -> Result<()> {
    let storage = session_storage(opts)?
        .context("--session or --session-dir is required to end a session")?;
    let dir = storage.dir().to_path_buf();
    let storage = Arc::new(storage);

    let store = AppStore::open(storage.clone(), opts.cookie.as_deref())
        .context("Failed to restore session")?;
    user::log_out(&store);
    storage
        .clear()
        .with_context(|| format!("Failed to remove session directory {dir}"))?;

    println!(":: Session ended ({dir})");
    Ok(())
}

pub fn cmd_routes() -> Result<()> {
    let table = RouteTable::standard();
    println!(":: Routes");
    for route in table.routes() {
        println!(
            "   {:<22} {:<8} {:<12} {}{}",
            route.pattern.as_str(),
            route.name.as_deref().unwrap_or("-"),
            route.kind,
            route.meta.title,
            if route.meta.requires_auth {
                "  (requires auth)"
            } else {
                ""
            }
        );
    }
    Ok(())
}

/// Navigates through `paths` in order on one navigator, following redirects.
pub fn cmd_navigate(paths: &[String], opts: &SessionOptions) -> Result<Vec<NavigationOutcome>> {
    let store = open_store(opts)?;
    let mut navigator = Navigator::standard(opts.gate());

    let mut all = Vec::new();
    for path in paths {
        for outcome in navigator.navigate_following(path, &store) {
            print_outcome(&outcome);
            all.push(outcome);
        }
    }
    println!(":: Document title: {}", navigator.document_title());
    Ok(all)
}

fn print_outcome(outcome: &NavigationOutcome) {
    let decision = match &outcome.decision {
        NavigationDecision::Proceed => "proceed".to_string(),
        NavigationDecision::Redirect(to) => format!("redirect -> {to}"),
        NavigationDecision::Abort => "abort".to_string(),
    };
    let trail = outcome
        .crumbs
        .iter()
        .map(|c| match &c.href {
            Some(href) => format!("{} <{href}>", c.text),
            None => c.text.clone(),
        })
        .collect::<Vec<_>>()
        .join(" / ");

    println!(":: {}", outcome.path);
    println!("   Route:    {} ({})", outcome.route.as_deref().unwrap_or("-"), outcome.kind);
    println!("   Title:    {}", outcome.title);
    println!("   Crumbs:   {trail}");
    println!("   Decision: {decision}");
}

/// Loads each resource from the backend and prints the resulting module
/// state. Returns the printed document.
pub async fn cmd_load(resources: &[CliResource], opts: &SessionOptions) -> Result<Value> {
    let store = open_store(opts)?;
    let kernel = build_kernel(&store, opts)?;

    let wanted: Vec<Resource> = resources.iter().map(|r| (*r).into()).collect();
    let results = kernel.load_many(&wanted).await;

    let state = store.state();
    let mut doc = Map::new();
    for (resource, result) in wanted.iter().zip(&results) {
        if let Err(e) = result {
            eprintln!(":: Loading {} failed: {e}", resource_key(*resource));
        }
        doc.insert(resource_key(*resource).to_string(), module_state(&state, *resource)?);
    }
    let doc = Value::Object(doc);
    println!("{}", serde_json::to_string_pretty(&doc)?);

    if let Some(Err(e)) = results.into_iter().find(|r| r.is_err()) {
        return Err(e).context("Backend request failed");
    }
    Ok(doc)
}

fn build_kernel(
    store: &AppStore,
    opts: &SessionOptions,
) -> Result<AppKernel<HttpApiClient, TracingReporter>> {
    let csrf = store.read(|s| s.csrf_token().map(str::to_string));
    let client = default_http_client().context("Failed to build HTTP client")?;
    let api = HttpApiClient::new(client, &opts.api_base)
        .with_context(|| format!("Invalid API base {}", opts.api_base))?
        .with_csrf_token(csrf);

    Ok(AppKernel::new(
        store.clone(),
        Navigator::standard(opts.gate()),
        api,
        TracingReporter,
    ))
}

/// Submits the workflow in `workflow_file` as a new run and prints the
/// created run. Returns its id.
pub async fn cmd_submit_run(
    workflow_file: &Utf8Path,
    opts: &SessionOptions,
) -> Result<Option<String>> {
    let raw = std::fs::read_to_string(workflow_file)
        .with_context(|| format!("Failed to read {workflow_file}"))?;
    let workflow: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{workflow_file} is not valid JSON"))?;

    let store = open_store(opts)?;
    let mut kernel = build_kernel(&store, opts)?;
    let outcome = kernel
        .dispatch(AppCommand::SubmitRun(workflow))
        .await
        .context("Backend request failed")?;

    let CommandOutcome::Submitted(id) = outcome else {
        anyhow::bail!("Unexpected outcome {outcome:?}");
    };
    match id.as_deref().and_then(|id| store.read(|s| s.runs.run(id).cloned())) {
        Some(run) => println!("{}", serde_json::to_string_pretty(&run)?),
        None => println!(":: Run was not created"),
    }
    Ok(id)
}

fn resource_key(resource: Resource) -> &'static str {
    match resource {
        Resource::Users => "users",
        Resource::CurrentUser => "user",
        Resource::Workflows => "workflows",
        Resource::Runs => "runs",
        Resource::Notifications => "notifications",
    }
}

fn module_state(state: &RootState, resource: Resource) -> Result<Value> {
    let v = match resource {
        Resource::Users => serde_json::to_value(&state.users)?,
        Resource::CurrentUser => serde_json::to_value(&state.user)?,
        Resource::Workflows => serde_json::to_value(&state.workflows)?,
        Resource::Runs => serde_json::to_value(&state.runs)?,
        Resource::Notifications => serde_json::to_value(&state.notifications)?,
    };
    Ok(v)
}

/// Prints the snapshot stored in `session_dir`, if any.
pub fn cmd_snapshot(session_dir: &Utf8Path) -> Result<Option<RootState>> {
    let storage = FileSessionStorage::new(session_dir.to_path_buf())
        .with_context(|| format!("Failed to open session directory {session_dir}"))?;
    let state = restore_snapshot::<RootState>(&storage, trellis_config::SNAPSHOT_KEY)
        .context("Failed to read session snapshot")?;

    match &state {
        Some(state) => println!("{}", serde_json::to_string_pretty(state)?),
        None => println!(":: No snapshot in {session_dir}"),
    }
    Ok(state)
}
