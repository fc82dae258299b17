use serde::{Deserialize, Serialize};
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use super::{load_list, ListModule};
use crate::app_core::{AppStore, Mutation};
use crate::domain::UserSummary;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersState {
    pub users: Vec<UserSummary>,
    pub users_loading: bool,
}

#[derive(Debug, Clone)]
pub enum UsersMutation {
    SetUsers(Vec<UserSummary>),
    SetUsersLoading(bool),
}

impl UsersMutation {
    pub fn name(&self) -> &'static str {
        match self {
            UsersMutation::SetUsers(_) => "setUsers",
            UsersMutation::SetUsersLoading(_) => "setUsersLoading",
        }
    }
}

impl UsersState {
    pub fn apply(&mut self, m: UsersMutation) {
        match m {
            UsersMutation::SetUsers(users) => self.users = users,
            UsersMutation::SetUsersLoading(loading) => self.users_loading = loading,
        }
    }

    pub fn users(&self) -> &[UserSummary] {
        &self.users
    }

    pub fn users_loading(&self) -> bool {
        self.users_loading
    }

    pub fn user_by_username(&self, username: &str) -> Option<&UserSummary> {
        self.users.iter().find(|u| u.username() == Some(username))
    }

    /// Users with a linked GitHub account.
    pub fn github_users(&self) -> impl Iterator<Item = &UserSummary> {
        self.users.iter().filter(|u| u.github_username().is_some())
    }
}

impl ListModule for UsersState {
    type Item = UserSummary;

    const ENDPOINT: &'static str = trellis_config::USERS_ENDPOINT;

    fn set_items(items: Vec<UserSummary>) -> Mutation {
        UsersMutation::SetUsers(items).into()
    }

    fn set_loading(loading: bool) -> Mutation {
        UsersMutation::SetUsersLoading(loading).into()
    }
}

pub async fn load_users(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    load_list::<UsersState>(store, api, reporter).await
}
