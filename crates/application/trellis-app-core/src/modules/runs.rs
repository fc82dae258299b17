use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use super::{fetch, load_list, ListModule, Request};
use crate::app_core::{AppStore, Mutation};
use crate::domain::Run;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunsState {
    pub runs: Vec<Run>,
    pub runs_loading: bool,
}

#[derive(Debug, Clone)]
pub enum RunsMutation {
    SetRuns(Vec<Run>),
    SetRunsLoading(bool),
    /// Replaces the run with the same id, or appends it.
    UpsertRun(Run),
}

impl RunsMutation {
    pub fn name(&self) -> &'static str {
        match self {
            RunsMutation::SetRuns(_) => "setRuns",
            RunsMutation::SetRunsLoading(_) => "setRunsLoading",
            RunsMutation::UpsertRun(_) => "upsertRun",
        }
    }
}

impl RunsState {
    pub fn apply(&mut self, m: RunsMutation) {
        match m {
            RunsMutation::SetRuns(runs) => self.runs = runs,
            RunsMutation::SetRunsLoading(loading) => self.runs_loading = loading,
            RunsMutation::UpsertRun(run) => {
                let existing = run
                    .id()
                    .and_then(|id| self.runs.iter().position(|r| r.has_id(&id)));
                match existing {
                    Some(ix) => self.runs[ix] = run,
                    None => self.runs.push(run),
                }
            }
        }
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_loading(&self) -> bool {
        self.runs_loading
    }

    pub fn run(&self, id: &str) -> Option<&Run> {
        self.runs.iter().find(|r| r.has_id(id))
    }

    pub fn runs_for_workflow<'a>(
        &'a self,
        owner: &'a str,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Run> {
        self.runs
            .iter()
            .filter(move |r| r.workflow_owner() == Some(owner) && r.workflow_name() == Some(name))
    }
}

impl ListModule for RunsState {
    type Item = Run;

    const ENDPOINT: &'static str = trellis_config::RUNS_ENDPOINT;

    fn set_items(items: Vec<Run>) -> Mutation {
        RunsMutation::SetRuns(items).into()
    }

    fn set_loading(loading: bool) -> Mutation {
        RunsMutation::SetRunsLoading(loading).into()
    }
}

pub async fn load_runs(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    load_list::<RunsState>(store, api, reporter).await
}

/// Fetches a single run and merges it into the list. Leaves `runs_loading` alone.
pub async fn load_run(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
    id: &str,
) -> Result<(), ApiError> {
    fetch(
        store,
        api,
        reporter,
        Request::Get(&trellis_config::run_endpoint(id)),
        None,
        |run: Run| RunsMutation::UpsertRun(run).into(),
    )
    .await
}

/// Posts a new run for `workflow` and merges the created run into the list.
///
/// Returns the id the backend assigned, or `None` when the failure was
/// swallowed or the response carried no id.
pub async fn submit_run(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
    workflow: &Value,
) -> Result<Option<String>, ApiError> {
    let mut created = None;
    fetch(
        store,
        api,
        reporter,
        Request::Post(trellis_config::RUNS_ENDPOINT, workflow),
        None,
        |run: Run| {
            created = run.id().map(|id| id.into_owned());
            RunsMutation::UpsertRun(run).into()
        },
    )
    .await?;
    Ok(created)
}
