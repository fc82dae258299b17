use crate::modules::{
    NotificationsMutation, RunsMutation, UserMutation, UsersMutation, WorkflowsMutation,
};

/// Every state change goes through one of these.
#[derive(Debug, Clone)]
pub enum Mutation {
    SetCsrfToken(Option<String>),
    User(UserMutation),
    Users(UsersMutation),
    Workflows(WorkflowsMutation),
    Runs(RunsMutation),
    Notifications(NotificationsMutation),
}

impl Mutation {
    /// Commit name, as seen by subscribers and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::SetCsrfToken(_) => "setCsrfToken",
            Mutation::User(m) => m.name(),
            Mutation::Users(m) => m.name(),
            Mutation::Workflows(m) => m.name(),
            Mutation::Runs(m) => m.name(),
            Mutation::Notifications(m) => m.name(),
        }
    }
}

impl From<UserMutation> for Mutation {
    fn from(m: UserMutation) -> Self {
        Mutation::User(m)
    }
}

impl From<UsersMutation> for Mutation {
    fn from(m: UsersMutation) -> Self {
        Mutation::Users(m)
    }
}

impl From<WorkflowsMutation> for Mutation {
    fn from(m: WorkflowsMutation) -> Self {
        Mutation::Workflows(m)
    }
}

impl From<RunsMutation> for Mutation {
    fn from(m: RunsMutation) -> Self {
        Mutation::Runs(m)
    }
}

impl From<NotificationsMutation> for Mutation {
    fn from(m: NotificationsMutation) -> Self {
        Mutation::Notifications(m)
    }
}
