use serde::{Deserialize, Serialize};
use trellis_infra::{ApiClient, ApiError, ErrorReporter};

use super::{load_list, ListModule};
use crate::app_core::{AppStore, Mutation};
use crate::domain::Notification;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsState {
    pub notifications: Vec<Notification>,
    pub notifications_loading: bool,
}

#[derive(Debug, Clone)]
pub enum NotificationsMutation {
    SetNotifications(Vec<Notification>),
    SetNotificationsLoading(bool),
    MarkNotificationRead(String),
    DismissNotification(String),
}

impl NotificationsMutation {
    pub fn name(&self) -> &'static str {
        match self {
            NotificationsMutation::SetNotifications(_) => "setNotifications",
            NotificationsMutation::SetNotificationsLoading(_) => "setNotificationsLoading",
            NotificationsMutation::MarkNotificationRead(_) => "markNotificationRead",
            NotificationsMutation::DismissNotification(_) => "dismissNotification",
        }
    }
}

impl NotificationsState {
    pub fn apply(&mut self, m: NotificationsMutation) {
        match m {
            NotificationsMutation::SetNotifications(items) => self.notifications = items,
            NotificationsMutation::SetNotificationsLoading(loading) => {
                self.notifications_loading = loading
            }
            NotificationsMutation::MarkNotificationRead(id) => {
                if let Some(n) = self.notifications.iter_mut().find(|n| n.has_id(&id)) {
                    n.mark_read();
                }
            }
            NotificationsMutation::DismissNotification(id) => {
                self.notifications.retain(|n| !n.has_id(&id));
            }
        }
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn notifications_loading(&self) -> bool {
        self.notifications_loading
    }

    pub fn unread(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter().filter(|n| !n.is_read())
    }

    pub fn unread_count(&self) -> usize {
        self.unread().count()
    }
}

impl ListModule for NotificationsState {
    type Item = Notification;

    const ENDPOINT: &'static str = trellis_config::NOTIFICATIONS_ENDPOINT;

    fn set_items(items: Vec<Notification>) -> Mutation {
        NotificationsMutation::SetNotifications(items).into()
    }

    fn set_loading(loading: bool) -> Mutation {
        NotificationsMutation::SetNotificationsLoading(loading).into()
    }
}

pub async fn load_notifications(
    store: &AppStore,
    api: &dyn ApiClient,
    reporter: &dyn ErrorReporter,
) -> Result<(), ApiError> {
    load_list::<NotificationsState>(store, api, reporter).await
}

pub fn mark_read(store: &AppStore, id: &str) {
    store.commit(NotificationsMutation::MarkNotificationRead(id.to_string()));
}

pub fn dismiss(store: &AppStore, id: &str) {
    store.commit(NotificationsMutation::DismissNotification(id.to_string()));
}
