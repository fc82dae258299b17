use crate::domain::RootState;

use super::mutations::Mutation;

pub fn reduce(state: &mut RootState, m: Mutation) {
    match m {
        Mutation::SetCsrfToken(token) => state.csrf_token = token,
        Mutation::User(m) => state.user.apply(m),
        Mutation::Users(m) => state.users.apply(m),
        Mutation::Workflows(m) => state.workflows.apply(m),
        Mutation::Runs(m) => state.runs.apply(m),
        Mutation::Notifications(m) => state.notifications.apply(m),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Notification, Run};
    use crate::modules::{NotificationsMutation, RunsMutation, UsersMutation};

    fn run(id: &str, state: &str) -> Run {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "state": state,
            "workflow_owner": "alice",
            "workflow_name": "flow1",
        }))
        .unwrap()
    }

    fn notification(id: &str) -> Notification {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "username": "alice",
            "message": "done",
            "read": false,
        }))
        .unwrap()
    }

    #[test]
    fn loading_flag_is_set_and_cleared() {
        let mut state = RootState::default();
        reduce(&mut state, UsersMutation::SetUsersLoading(true).into());
        assert!(state.users.users_loading());
        reduce(&mut state, UsersMutation::SetUsersLoading(false).into());
        assert!(!state.users.users_loading());
    }

    #[test]
    fn upsert_replaces_existing_run_and_appends_new_one() {
        let mut state = RootState::default();
        reduce(&mut state, RunsMutation::SetRuns(vec![run("r1", "RUNNING")]).into());
        reduce(&mut state, RunsMutation::UpsertRun(run("r1", "COMPLETED")).into());
        reduce(&mut state, RunsMutation::UpsertRun(run("r2", "RUNNING")).into());

        assert_eq!(state.runs.runs().len(), 2);
        assert_eq!(
            state.runs.run("r1").and_then(|r| r.state()),
            Some(&serde_json::json!("COMPLETED"))
        );
        assert_eq!(state.runs.runs_for_workflow("alice", "flow1").count(), 2);
    }

    #[test]
    fn notifications_can_be_read_and_dismissed() {
        let mut state = RootState::default();
        reduce(
            &mut state,
            NotificationsMutation::SetNotifications(vec![notification("n1"), notification("n2")])
                .into(),
        );
        assert_eq!(state.notifications.unread_count(), 2);

        reduce(
            &mut state,
            NotificationsMutation::MarkNotificationRead("n1".into()).into(),
        );
        assert_eq!(state.notifications.unread_count(), 1);

        reduce(
            &mut state,
            NotificationsMutation::DismissNotification("n2".into()).into(),
        );
        assert_eq!(state.notifications.notifications().len(), 1);
        assert_eq!(state.notifications.unread_count(), 0);
    }

    #[test]
    fn mutation_names_follow_commit_names() {
        let m: Mutation = UsersMutation::SetUsers(Vec::new()).into();
        assert_eq!(m.name(), "setUsers");
        assert_eq!(Mutation::SetCsrfToken(None).name(), "setCsrfToken");
    }
}
