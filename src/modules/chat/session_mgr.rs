use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use teloxide::types::UserId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::Session;

/// Keeps one [`Session`] per user for the lifetime of the process.
///
/// Every session sits behind its own async lock, so concurrent updates from
/// the same user are handled one after another while different users never
/// wait for each other.
pub(crate) struct SessionManager {
    inner: Arc<Mutex<SessionManagerInner>>,
}

struct SessionManagerInner {
    sessions: HashMap<UserId, Arc<AsyncMutex<Session>>>,
    history_limit: usize,
}

impl SessionManager {
    pub fn new(history_limit: usize) -> Self {
        let inner = SessionManagerInner {
            sessions: HashMap::new(),
            history_limit,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Locks the session of `user_id`, creating an empty one first if
    /// needed. The session stays locked until the guard is dropped.
    pub async fn lock_session(&self, user_id: UserId) -> OwnedMutexGuard<Session> {
        let session = self.with_mut_inner(|inner| {
            let limit = inner.history_limit;
            Arc::clone(
                inner
                    .sessions
                    .entry(user_id)
                    .or_insert_with(|| Arc::new(AsyncMutex::new(Session::new(limit)))),
            )
        });
        session.lock_owned().await
    }

    #[cfg(test)]
    pub fn session_count(&self) -> usize {
        self.with_mut_inner(|inner| inner.sessions.len())
    }

    fn with_mut_inner<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionManagerInner) -> R,
    {
        // A panic while holding the lock can't leave the map half-updated.
        let mut inner_mut = self.inner.lock().unwrap_or_else(|err| err.into_inner());
        f(&mut inner_mut)
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
