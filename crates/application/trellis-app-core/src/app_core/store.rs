use std::sync::{Arc, Mutex, MutexGuard};

use trellis_core::SessionProbe;
use trellis_persistence::{restore_snapshot, save_snapshot, SessionStorage, StorageError};

use crate::domain::RootState;

use super::{mutations::Mutation, reducer::reduce};

/// Called after every commit with the mutation name and the resulting state.
pub type Subscriber = Arc<dyn Fn(&'static str, &RootState) + Send + Sync>;

#[derive(Clone)]
pub struct AppStore {
    inner: Arc<Mutex<RootState>>,
    storage: Option<Arc<dyn SessionStorage>>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl AppStore {
    /// In-memory store; nothing is persisted.
    pub fn new(state: RootState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
            storage: None,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builds the initial state from the cookie header, then overwrites it
    /// with the session snapshot if one can be restored.
    ///
    /// A token in the cookie header is newer than one in the snapshot and
    /// is committed over it.
    pub fn open(
        storage: Arc<dyn SessionStorage>,
        cookie_header: Option<&str>,
    ) -> Result<Self, StorageError> {
        let initial = RootState::from_cookies(cookie_header);
        let cookie_token = initial.csrf_token.clone();
        let store = Self {
            inner: Arc::new(Mutex::new(initial)),
            storage: Some(storage),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        };
        if store.restore()? {
            if let Some(token) = cookie_token {
                if store.read(|s| s.csrf_token() != Some(token.as_str())) {
                    store.commit(Mutation::SetCsrfToken(Some(token)));
                }
            }
        }
        Ok(store)
    }

    pub fn state(&self) -> RootState {
        self.lock().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&RootState) -> R) -> R {
        f(&self.lock())
    }

    pub fn commit(&self, m: impl Into<Mutation>) {
        let m = m.into();
        let name = m.name();
        let subs = self.subscribers();

        let after = {
            let mut guard = self.lock();
            tracing::debug!(mutation = name, "commit");
            reduce(&mut guard, m);
            self.persist(&guard);
            (!subs.is_empty()).then(|| guard.clone())
        };

        if let Some(state) = after {
            for sub in &subs {
                sub(name, &state);
            }
        }
    }

    /// Replaces the whole state with the stored snapshot. No mutation is
    /// committed and subscribers are not called.
    ///
    /// Returns whether a snapshot was applied.
    pub fn restore(&self) -> Result<bool, StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(false);
        };
        match restore_snapshot::<RootState>(storage.as_ref(), trellis_config::SNAPSHOT_KEY)? {
            Some(state) => {
                *self.lock() = state;
                tracing::debug!("session snapshot restored");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn subscribe(&self, f: impl Fn(&'static str, &RootState) + Send + Sync + 'static) {
        self.subscribers_mut().push(Arc::new(f));
    }

    fn persist(&self, state: &RootState) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(e) = save_snapshot(storage.as_ref(), trellis_config::SNAPSHOT_KEY, state) {
            tracing::warn!(kind = ?e.kind(), "failed to write session snapshot: {e}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, RootState> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn subscribers(&self) -> Vec<Subscriber> {
        self.subscribers_mut().clone()
    }

    fn subscribers_mut(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl SessionProbe for AppStore {
    fn logged_in(&self) -> bool {
        self.read(|s| s.user.logged_in())
    }
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("persistent", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}
