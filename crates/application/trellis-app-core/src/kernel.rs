use std::sync::Arc;

use futures::StreamExt;

use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use crate::app_core::{AppCommand, AppStore, Resource};
use crate::modules::{notifications, runs, user, users, workflows};
use crate::navigator::{NavigationOutcome, Navigator};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Navigated(Vec<NavigationOutcome>),
    Loaded(Resource),
    /// A run was created; carries the id the backend assigned, if any.
    Submitted(Option<String>),
    Committed,
}

/// Explicit context object tying the store, the navigator and the backend
/// ports together. Commands are dispatched one at a time.
pub struct AppKernel<A, R> {
    pub store: AppStore,
    pub navigator: Navigator,
    api: Arc<A>,
    reporter: Arc<R>,
}

impl<A, R> AppKernel<A, R>
where
    A: ApiClient,
    R: ErrorReporter,
{
    pub fn new(store: AppStore, navigator: Navigator, api: A, reporter: R) -> Self {
        Self {
            store,
            navigator,
            api: Arc::new(api),
            reporter: Arc::new(reporter),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn dispatch(&mut self, cmd: AppCommand) -> Result<CommandOutcome, ApiError> {
        tracing::debug!(?cmd, "dispatch");
        match cmd {
            AppCommand::Navigate(path) => Ok(CommandOutcome::Navigated(
                self.navigator.navigate_following(&path, &self.store),
            )),

            AppCommand::Load(resource) => {
                self.load(resource).await?;
                Ok(CommandOutcome::Loaded(resource))
            }

            AppCommand::LoadRun(id) => {
                runs::load_run(&self.store, self.api.as_ref(), self.reporter.as_ref(), &id)
                    .await?;
                Ok(CommandOutcome::Loaded(Resource::Runs))
            }

            AppCommand::SubmitRun(workflow) => {
                let id = runs::submit_run(
                    &self.store,
                    self.api.as_ref(),
                    self.reporter.as_ref(),
                    &workflow,
                )
                .await?;
                Ok(CommandOutcome::Submitted(id))
            }

            AppCommand::ToggleDarkMode => {
                user::toggle_dark_mode(&self.store, self.api.as_ref(), self.reporter.as_ref())
                    .await?;
                Ok(CommandOutcome::Committed)
            }

            AppCommand::LogOut => {
                user::log_out(&self.store);
                Ok(CommandOutcome::Committed)
            }

            AppCommand::MarkNotificationRead(id) => {
                notifications::mark_read(&self.store, &id);
                Ok(CommandOutcome::Committed)
            }

            AppCommand::DismissNotification(id) => {
                notifications::dismiss(&self.store, &id);
                Ok(CommandOutcome::Committed)
            }
        }
    }

    /// Runs the loads for `resources` concurrently. Results come back in
    /// the order given.
    pub async fn load_many(&self, resources: &[Resource]) -> Vec<Result<(), ApiError>> {
        futures::stream::iter(resources.iter().copied())
            .map(|r| self.load(r))
            .buffered(resources.len().max(1))
            .collect()
            .await
    }

    async fn load(&self, resource: Resource) -> Result<(), ApiError> {
        let (store, api, reporter) = (&self.store, self.api.as_ref(), self.reporter.as_ref());
        match resource {
            Resource::Users => users::load_users(store, api, reporter).await,
            Resource::CurrentUser => user::load_current_user(store, api, reporter).await,
            Resource::Workflows => workflows::load_workflows(store, api, reporter).await,
            Resource::Runs => runs::load_runs(store, api, reporter).await,
            Resource::Notifications => {
                notifications::load_notifications(store, api, reporter).await
            }
        }
    }
}
