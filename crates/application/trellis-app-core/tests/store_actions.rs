use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use trellis_app_core::app_core::{AppCommand, AppStore, Resource};
use trellis_app_core::domain::RootState;
use trellis_app_core::kernel::{AppKernel, CommandOutcome};
use trellis_app_core::domain::Workflow;
use trellis_app_core::modules::{runs, user, users, workflows, WorkflowsMutation};
use trellis_app_core::navigator::Navigator;
use trellis_core::{AuthGate, NavigationDecision, RouteKind};
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

#[derive(Default)]
struct ScriptedApi {
    responses: HashMap<String, Result<Value, ApiError>>,
    calls: Mutex<Vec<String>>,
    posted: Mutex<Vec<(String, Value)>>,
}

impl ScriptedApi {
    fn with(mut self, path: &str, response: Result<Value, ApiError>) -> Self {
        self.responses.insert(path.to_string(), response);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn posted(&self) -> Vec<(String, Value)> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ApiClient for ScriptedApi {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(path.to_string());
        self.responses
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Transport(format!("no script for {path}"))))
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.posted
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
        self.responses
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Transport(format!("no script for {path}"))))
    }
}

#[derive(Default, Clone)]
struct RecordingReporter {
    seen: Arc<Mutex<Vec<ApiError>>>,
}

impl RecordingReporter {
    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl ErrorReporter for RecordingReporter {
    fn capture_exception(&self, err: &ApiError) {
        self.seen.lock().unwrap().push(err.clone());
    }
}

fn status(code: u16, path: &str) -> ApiError {
    ApiError::Status {
        status: code,
        url: format!("http://backend{path}"),
        body: String::new(),
    }
}

fn record_commits(store: &AppStore) -> Arc<Mutex<Vec<(&'static str, bool)>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    store.subscribe(move |name, state: &RootState| {
        sink.lock().unwrap().push((name, state.users.users_loading));
    });
    log
}

fn record_names(store: &AppStore) -> Arc<Mutex<Vec<&'static str>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    store.subscribe(move |name, _: &RootState| sink.lock().unwrap().push(name));
    log
}

fn users_payload() -> Value {
    json!([
        {
            "username": "alice",
            "first_name": "Alice",
            "last_name": "Liddell",
            "github_username": "alice-gh",
            "github_profile": {"login": "alice-gh"},
            "institution": "wonderland"
        },
        {
            "username": "bob",
            "first_name": "Bob",
            "last_name": "Builder"
        }
    ])
}

#[tokio::test]
async fn users_load_replaces_list_and_toggles_loading() {
    let api = ScriptedApi::default().with("/apis/v1/users/", Ok(users_payload()));
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());
    let commits = record_commits(&store);

    users::load_users(&store, &api, &reporter).await.unwrap();

    assert_eq!(api.calls(), vec!["/apis/v1/users/".to_string()]);
    assert_eq!(
        *commits.lock().unwrap(),
        vec![
            ("setUsersLoading", true),
            ("setUsers", true),
            ("setUsersLoading", false),
        ]
    );

    let state = store.state();
    assert_eq!(
        serde_json::to_value(state.users.users()).unwrap(),
        users_payload()
    );
    assert_eq!(state.users.github_users().count(), 1);
    assert!(state.users.user_by_username("bob").is_some());
    assert_eq!(reporter.count(), 0);
}

#[tokio::test]
async fn client_fault_is_reported_and_swallowed() {
    let api = ScriptedApi::default()
        .with("/apis/v1/workflows/", Err(status(404, "/apis/v1/workflows/")));
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());
    let existing: Vec<Workflow> = serde_json::from_value(json!([
        {"owner": "alice", "name": "flow1", "public": true},
        {"owner": "bob", "name": "flow2", "public": false}
    ]))
    .unwrap();
    store.commit(WorkflowsMutation::SetWorkflows(existing.clone()));
    let names = record_names(&store);

    workflows::load_workflows(&store, &api, &reporter)
        .await
        .unwrap();

    let after = store.state();
    assert_eq!(after.workflows.workflows(), existing.as_slice());
    assert!(!after.workflows.workflows_loading());
    assert_eq!(
        *names.lock().unwrap(),
        vec!["setWorkflowsLoading", "setWorkflowsLoading"]
    );
    assert_eq!(reporter.count(), 1);
}

#[tokio::test]
async fn server_fault_is_reported_and_raised() {
    let api = ScriptedApi::default().with("/apis/v1/users/", Err(status(500, "/apis/v1/users/")));
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());
    let commits = record_commits(&store);

    let err = users::load_users(&store, &api, &reporter)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(reporter.count(), 1);
    assert!(!store.state().users.users_loading());
    assert_eq!(
        *commits.lock().unwrap(),
        vec![("setUsersLoading", true), ("setUsersLoading", false)]
    );
}

#[tokio::test]
async fn transport_failure_is_raised() {
    let api = ScriptedApi::default();
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());

    let err = runs::load_runs(&store, &api, &reporter).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!store.state().runs.runs_loading());
    assert_eq!(reporter.count(), 1);
}

#[tokio::test]
async fn malformed_body_is_swallowed() {
    let api = ScriptedApi::default().with("/apis/v1/users/", Ok(json!({"not": "a list"})));
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());

    users::load_users(&store, &api, &reporter).await.unwrap();

    assert!(store.state().users.users().is_empty());
    assert!(!store.state().users.users_loading());
    assert_eq!(reporter.count(), 1);
}

#[tokio::test]
async fn current_user_and_dark_mode() {
    let api = ScriptedApi::default()
        .with(
            "/apis/v1/users/get_current/",
            Ok(json!({
                "django_profile": {
                    "username": "alice",
                    "email": "alice@example.org",
                    "first_name": "Alice",
                    "last_name": "Liddell",
                    "dark_mode": false
                },
                "github_profile": {"login": "alice-gh"}
            })),
        )
        .with(
            "/apis/v1/users/toggle_dark_mode/",
            Ok(json!({"dark_mode": true})),
        );
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());

    user::load_current_user(&store, &api, &reporter)
        .await
        .unwrap();
    assert!(store.read(|s| s.user.logged_in()));
    assert_eq!(
        store.read(|s| s.user.username().map(str::to_string)),
        Some("alice".to_string())
    );

    user::toggle_dark_mode(&store, &api, &reporter)
        .await
        .unwrap();
    assert!(store.read(|s| s.user.dark_mode()));

    user::log_out(&store);
    assert!(!store.read(|s| s.user.logged_in()));
}

#[tokio::test]
async fn single_run_load_upserts_without_touching_loading() {
    let api = ScriptedApi::default().with(
        "/apis/v1/runs/r9/",
        Ok(json!({
            "id": "r9",
            "state": "COMPLETED",
            "workflow_owner": "alice",
            "workflow_name": "flow1"
        })),
    );
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());
    let commits = record_commits(&store);

    runs::load_run(&store, &api, &reporter, "r9").await.unwrap();

    assert_eq!(store.state().runs.runs().len(), 1);
    let names: Vec<_> = commits.lock().unwrap().iter().map(|(n, _)| *n).collect();
    assert_eq!(names, vec!["upsertRun"]);
}

#[tokio::test]
async fn kernel_gates_user_page_until_logged_in() {
    let api = ScriptedApi::default().with(
        "/apis/v1/users/get_current/",
        Ok(json!({"django_profile": {"username": "alice"}})),
    );
    let store = AppStore::new(RootState::default());
    let mut kernel = AppKernel::new(
        store.clone(),
        Navigator::standard(AuthGate::Enforce),
        api,
        RecordingReporter::default(),
    );

    let CommandOutcome::Navigated(outcomes) = kernel
        .dispatch(AppCommand::Navigate("/users/bob".into()))
        .await
        .unwrap()
    else {
        panic!("expected a navigation");
    };
    assert_eq!(
        outcomes[0].decision,
        NavigationDecision::Redirect("/login/?next=/users/bob".into())
    );
    assert_eq!(outcomes.last().map(|o| o.kind), Some(RouteKind::Login));

    let loaded = kernel
        .dispatch(AppCommand::Load(Resource::CurrentUser))
        .await
        .unwrap();
    assert_eq!(loaded, CommandOutcome::Loaded(Resource::CurrentUser));

    let CommandOutcome::Navigated(outcomes) = kernel
        .dispatch(AppCommand::Navigate("/users/bob".into()))
        .await
        .unwrap()
    else {
        panic!("expected a navigation");
    };
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].decision, NavigationDecision::Proceed);
    assert_eq!(kernel.navigator.document_title(), "user bob");
}

#[tokio::test]
async fn concurrent_loads_report_each_result() {
    let api = ScriptedApi::default()
        .with("/apis/v1/users/", Ok(users_payload()))
        .with("/apis/v1/runs/", Err(status(502, "/apis/v1/runs/")));
    let reporter = RecordingReporter::default();
    let kernel = AppKernel::new(
        AppStore::new(RootState::default()),
        Navigator::standard(AuthGate::Inert),
        api,
        reporter.clone(),
    );

    let results = kernel
        .load_many(&[Resource::Users, Resource::Runs])
        .await;

    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap_err().status(), Some(502));
    assert_eq!(kernel.store.state().users.users().len(), 2);
    assert_eq!(reporter.count(), 1);
    assert_eq!(kernel.api().calls().len(), 2);
}

#[tokio::test]
async fn runs_keep_the_backend_shape() {
    let payload = json!([
        {
            "id": "6f1c",
            "work_dir": "/scratch/runs/6f1c",
            "cluster": "local",
            "created": "2020-04-01T10:00:00Z",
            "state": 5,
            "workflow_owner": "alice",
            "workflow_name": "flow1"
        },
        {
            "id": 17,
            "state": null,
            "workflow_owner": "alice",
            "workflow_name": "flow1"
        }
    ]);
    let api = ScriptedApi::default().with("/apis/v1/runs/", Ok(payload.clone()));
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());

    runs::load_runs(&store, &api, &reporter).await.unwrap();

    let state = store.state();
    assert_eq!(reporter.count(), 0);
    assert_eq!(serde_json::to_value(state.runs.runs()).unwrap(), payload);
    assert_eq!(state.runs.run("6f1c").and_then(|r| r.state()), Some(&json!(5)));
    assert!(state.runs.run("17").is_some());
    assert_eq!(state.runs.runs_for_workflow("alice", "flow1").count(), 2);
}

#[tokio::test]
async fn submitted_run_is_posted_and_merged() {
    let workflow = json!({"owner": "alice", "name": "flow1", "inputs": {"n": 3}});
    let api = ScriptedApi::default().with(
        "/apis/v1/runs/",
        Ok(json!({
            "id": "r-new",
            "state": 0,
            "workflow_owner": "alice",
            "workflow_name": "flow1"
        })),
    );
    let reporter = RecordingReporter::default();
    let store = AppStore::new(RootState::default());
    let names = record_names(&store);

    let id = runs::submit_run(&store, &api, &reporter, &workflow)
        .await
        .unwrap();

    assert_eq!(id.as_deref(), Some("r-new"));
    assert_eq!(
        api.posted(),
        vec![("/apis/v1/runs/".to_string(), workflow)]
    );
    assert!(api.calls().is_empty());
    assert_eq!(*names.lock().unwrap(), vec!["upsertRun"]);
    assert!(store.state().runs.run("r-new").is_some());
}

#[tokio::test]
async fn rejected_submission_is_swallowed_through_the_kernel() {
    let api = ScriptedApi::default().with("/apis/v1/runs/", Err(status(400, "/apis/v1/runs/")));
    let reporter = RecordingReporter::default();
    let mut kernel = AppKernel::new(
        AppStore::new(RootState::default()),
        Navigator::standard(AuthGate::Inert),
        api,
        reporter.clone(),
    );

    let outcome = kernel
        .dispatch(AppCommand::SubmitRun(json!({"owner": "alice"})))
        .await
        .unwrap();

    assert_eq!(outcome, CommandOutcome::Submitted(None));
    assert!(kernel.store.state().runs.runs().is_empty());
    assert_eq!(kernel.api().posted().len(), 1);
    assert_eq!(reporter.count(), 1);
}
