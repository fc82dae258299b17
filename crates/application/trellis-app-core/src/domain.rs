use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::modules::{NotificationsState, RunsState, UserState, UsersState, WorkflowsState};

/// A record exactly as the backend sent it.
pub type Fields = Map<String, Value>;

fn text<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

fn flag(fields: &Fields, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// String ids are used as is, numeric ids are rendered.
fn key_text<'a>(fields: &'a Fields, key: &str) -> Option<Cow<'a, str>> {
    match fields.get(key)? {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

/// Declares a record type that stores the backend's JSON object untouched.
/// Typed accessors are projections over it, so a field of an unexpected
/// shape never rejects the record.
macro_rules! json_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Fields);

        impl $name {
            pub fn fields(&self) -> &Fields {
                &self.0
            }

            pub fn get(&self, key: &str) -> Option<&Value> {
                self.0.get(key)
            }
        }

        impl From<Fields> for $name {
            fn from(fields: Fields) -> Self {
                Self(fields)
            }
        }

        impl From<$name> for Value {
            fn from(record: $name) -> Self {
                Value::Object(record.0)
            }
        }
    };
}

json_record!(UserSummary);
json_record!(
    /// The logged-in user as reported by the backend.
    CurrentUser
);
json_record!(Workflow);
json_record!(Run);
json_record!(Notification);

impl UserSummary {
    pub fn username(&self) -> Option<&str> {
        text(&self.0, "username")
    }

    pub fn first_name(&self) -> Option<&str> {
        text(&self.0, "first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        text(&self.0, "last_name")
    }

    /// `None` when the user has no linked GitHub account (absent or null).
    pub fn github_username(&self) -> Option<&str> {
        text(&self.0, "github_username")
    }
}

impl CurrentUser {
    pub fn django_profile(&self) -> Option<&Fields> {
        self.0.get("django_profile").and_then(Value::as_object)
    }

    pub fn username(&self) -> Option<&str> {
        self.django_profile().and_then(|p| text(p, "username"))
    }

    pub fn dark_mode(&self) -> bool {
        self.django_profile().is_some_and(|p| flag(p, "dark_mode"))
    }

    pub(crate) fn set_dark_mode(&mut self, dark: bool) {
        let profile = self
            .0
            .entry("django_profile")
            .or_insert_with(|| Value::Object(Fields::new()));
        if let Value::Object(profile) = profile {
            profile.insert("dark_mode".into(), Value::Bool(dark));
        }
    }
}

impl Workflow {
    pub fn owner(&self) -> Option<&str> {
        text(&self.0, "owner")
    }

    pub fn name(&self) -> Option<&str> {
        text(&self.0, "name")
    }

    pub fn is_public(&self) -> bool {
        flag(&self.0, "public")
    }
}

impl Run {
    pub fn id(&self) -> Option<Cow<'_, str>> {
        key_text(&self.0, "id")
    }

    /// Numeric status code or a label such as `"Unknown"`.
    pub fn state(&self) -> Option<&Value> {
        self.0.get("state")
    }

    pub fn workflow_owner(&self) -> Option<&str> {
        text(&self.0, "workflow_owner")
    }

    pub fn workflow_name(&self) -> Option<&str> {
        text(&self.0, "workflow_name")
    }

    pub(crate) fn has_id(&self, id: &str) -> bool {
        self.id().is_some_and(|own| own == id)
    }
}

impl Notification {
    pub fn id(&self) -> Option<Cow<'_, str>> {
        key_text(&self.0, "id")
    }

    pub fn is_read(&self) -> bool {
        flag(&self.0, "read")
    }

    pub(crate) fn has_id(&self, id: &str) -> bool {
        self.id().is_some_and(|own| own == id)
    }

    pub(crate) fn mark_read(&mut self) {
        self.0.insert("read".into(), Value::Bool(true));
    }
}

/// Aggregate state of every store module. This is what gets persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootState {
    pub csrf_token: Option<String>,
    pub user: UserState,
    pub users: UsersState,
    pub workflows: WorkflowsState,
    pub runs: RunsState,
    pub notifications: NotificationsState,
}

impl RootState {
    /// Fresh state with the CSRF token taken from a `Cookie:` header.
    pub fn from_cookies(cookie_header: Option<&str>) -> Self {
        Self {
            csrf_token: cookie_header.and_then(|h| {
                trellis_infra::csrf_token_from_cookies(h, trellis_config::CSRF_COOKIE_NAME)
            }),
            ..Default::default()
        }
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}
