use serde::{Deserialize, Serialize};
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use super::{fetch, Request};
use crate::app_core::{AppStore, Mutation};
use crate::domain::CurrentUser;

/// The session's own user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserState {
    pub current_user: Option<CurrentUser>,
    pub current_user_loading: bool,
}

#[derive(Debug, Clone)]
pub enum UserMutation {
    SetCurrentUser(Box<CurrentUser>),
    SetCurrentUserLoading(bool),
    ClearCurrentUser,
    SetDarkMode(bool),
}

impl UserMutation {
    pub fn name(&self) -> &'static str {
        match self {
            UserMutation::SetCurrentUser(_) => "setCurrentUser",
            UserMutation::SetCurrentUserLoading(_) => "setCurrentUserLoading",
            UserMutation::ClearCurrentUser => "clearCurrentUser",
            UserMutation::SetDarkMode(_) => "setDarkMode",
        }
    }
}

impl UserState {
    pub fn apply(&mut self, m: UserMutation) {
        match m {
            UserMutation::SetCurrentUser(user) => self.current_user = Some(*user),
            UserMutation::SetCurrentUserLoading(loading) => self.current_user_loading = loading,
            UserMutation::ClearCurrentUser => self.current_user = None,
            UserMutation::SetDarkMode(dark) => {
                if let Some(user) = self.current_user.as_mut() {
                    user.set_dark_mode(dark);
                }
            }
        }
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    pub fn logged_in(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.current_user.as_ref().and_then(CurrentUser::username)
    }

    pub fn dark_mode(&self) -> bool {
        self.current_user.as_ref().is_some_and(CurrentUser::dark_mode)
    }
}

fn set_loading(loading: bool) -> Mutation {
    UserMutation::SetCurrentUserLoading(loading).into()
}

pub async fn load_current_user(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    fetch(
        store,
        api,
        reporter,
        Request::Get(trellis_config::CURRENT_USER_ENDPOINT),
        Some(set_loading),
        |user: CurrentUser| UserMutation::SetCurrentUser(Box::new(user)).into(),
    )
    .await
}

#[derive(Deserialize)]
struct DarkModeResponse {
    dark_mode: bool,
}

pub async fn toggle_dark_mode(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    fetch(
        store,
        api,
        reporter,
        Request::Get(trellis_config::TOGGLE_DARK_MODE_ENDPOINT),
        None,
        |resp: DarkModeResponse| UserMutation::SetDarkMode(resp.dark_mode).into(),
    )
    .await
}

/// Forgets the current user. The backend session is ended by the logout page.
pub fn log_out(store: &AppStore) {
    store.commit(UserMutation::ClearCurrentUser);
}
