//! Store modules. Each owns one slice of [`RootState`](crate::domain::RootState):
//! a state struct whose `Default` is the initial state, a mutation enum applied
//! synchronously, `&self` getters, and async actions that talk to the backend
//! and commit mutations through the [`AppStore`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use crate::app_core::{AppStore, Mutation};

pub mod notifications;
pub mod runs;
pub mod user;
pub mod users;
pub mod workflows;

pub use notifications::{NotificationsMutation, NotificationsState};
pub use runs::{RunsMutation, RunsState};
pub use user::{UserMutation, UserState};
pub use users::{UsersMutation, UsersState};
pub use workflows::{WorkflowsMutation, WorkflowsState};

/// A module whose main resource is a list fetched from one endpoint.
pub trait ListModule {
    type Item: DeserializeOwned;

    const ENDPOINT: &'static str;

    fn set_items(items: Vec<Self::Item>) -> Mutation;
    fn set_loading(loading: bool) -> Mutation;
}

/// Loads `M`'s list: loading on, one GET, replace list, loading off.
///
/// Failures turn loading off before being reported. Server faults and
/// transport failures are returned to the caller; everything else is
/// swallowed and the list keeps its previous contents.
pub async fn load_list<M: ListModule>(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    fetch(
        store,
        api,
        reporter,
        Request::Get(M::ENDPOINT),
        Some(M::set_loading),
        M::set_items,
    )
    .await
}

/// One backend call made by an action.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Request<'a> {
    Get(&'a str),
    Post(&'a str, &'a Value),
}

impl<'a> Request<'a> {
    fn endpoint(&self) -> &'a str {
        match *self {
            Request::Get(endpoint) | Request::Post(endpoint, _) => endpoint,
        }
    }

    async fn send(self, api: &dyn ApiClient) -> Result<Value, ApiError> {
        match self {
            Request::Get(endpoint) => api.get_json(endpoint).await,
            Request::Post(endpoint, body) => api.post_json(endpoint, body).await,
        }
    }
}

/// Shared body of every backend action.
pub(crate) async fn fetch<T, F>(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
    request: Request<'_>,
    loading: Option<fn(bool) -> Mutation>,
    on_success: F,
) -> Result<(), ApiError>
where
    T: DeserializeOwned,
    F: FnOnce(T) -> Mutation,
{
    if let Some(set_loading) = loading {
        store.commit(set_loading(true));
    }

    let endpoint = request.endpoint();
    let outcome = request.send(api).await.and_then(|body| {
        serde_json::from_value::<T>(body).map_err(|e| ApiError::Decode(format!("{endpoint}: {e}")))
    });

    match outcome {
        Ok(payload) => {
            store.commit(on_success(payload));
            if let Some(set_loading) = loading {
                store.commit(set_loading(false));
            }
            Ok(())
        }
        Err(err) => {
            if let Some(set_loading) = loading {
                store.commit(set_loading(false));
            }
            reporter.capture_exception(&err);
            if err.should_propagate() {
                Err(err)
            } else {
                tracing::debug!(endpoint, "swallowed client-side failure: {err}");
                Ok(())
            }
        }
    }
}
