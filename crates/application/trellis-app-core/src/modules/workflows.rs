use serde::{Deserialize, Serialize};
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use super::{load_list, ListModule};
use crate::app_core::{AppStore, Mutation};
use crate::domain::Workflow;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowsState {
    pub workflows: Vec<Workflow>,
    pub workflows_loading: bool,
}

#[derive(Debug, Clone)]
pub enum WorkflowsMutation {
    SetWorkflows(Vec<Workflow>),
    SetWorkflowsLoading(bool),
}

impl WorkflowsMutation {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowsMutation::SetWorkflows(_) => "setWorkflows",
            WorkflowsMutation::SetWorkflowsLoading(_) => "setWorkflowsLoading",
        }
    }
}

impl WorkflowsState {
    pub fn apply(&mut self, m: WorkflowsMutation) {
        match m {
            WorkflowsMutation::SetWorkflows(workflows) => self.workflows = workflows,
            WorkflowsMutation::SetWorkflowsLoading(loading) => self.workflows_loading = loading,
        }
    }

    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn workflows_loading(&self) -> bool {
        self.workflows_loading
    }

    pub fn workflow(&self, owner: &str, name: &str) -> Option<&Workflow> {
        self.workflows
            .iter()
            .find(|w| w.owner() == Some(owner) && w.name() == Some(name))
    }

    pub fn workflows_by_owner<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Workflow> {
        self.workflows.iter().filter(move |w| w.owner() == Some(owner))
    }

    pub fn public_workflows(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.iter().filter(|w| w.is_public())
    }
}

impl ListModule for WorkflowsState {
    type Item = Workflow;

    const ENDPOINT: &'static str = trellis_config::WORKFLOWS_ENDPOINT;

    fn set_items(items: Vec<Workflow>) -> Mutation {
        WorkflowsMutation::SetWorkflows(items).into()
    }

    fn set_loading(loading: bool) -> Mutation {
        WorkflowsMutation::SetWorkflowsLoading(loading).into()
    }
}

pub async fn load_workflows(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    load_list::<WorkflowsState>(store, api, reporter).await
}
