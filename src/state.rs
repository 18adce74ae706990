//! Application state: the read-only catalog, the user store and live sessions.
//!
//! Sessions are keyed by session id, with at most one live session per user id:
//! signing in again resumes it. Each session sits behind its own mutex so the
//! award and persist steps of one user never interleave.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::domain::Profile;
use crate::error::AppError;
use crate::session::Session;
use crate::store::UserStore;

pub type SharedSession = Arc<Mutex<Session>>;

struct LiveSession {
    user_id: String,
    session: SharedSession,
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, LiveSession>,
    /// user id -> session id
    by_user: HashMap<String, String>,
}

impl Sessions {
    fn of_user(&self, user_id: &str) -> Option<SharedSession> {
        self.by_user
            .get(user_id)
            .and_then(|sid| self.by_id.get(sid))
            .map(|live| live.session.clone())
    }
}

pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn UserStore>,
    sessions: RwLock<Sessions>,
}

impl AppState {
    pub fn new(catalog: Catalog, store: Arc<dyn UserStore>) -> Self {
        info!(
            target: "defit_backend",
            challenges = catalog.challenges().len(),
            badges = catalog.badges().len(),
            store = store.name(),
            "Application state ready"
        );
        Self {
            catalog: Arc::new(catalog),
            store,
            sessions: RwLock::new(Sessions::default()),
        }
    }

    /// Sign a profile in. A user who already has a live session gets that one back.
    #[instrument(level = "info", skip(self, profile), fields(user_id = %profile.id))]
    pub async fn open_session(&self, profile: Profile) -> Result<SharedSession, AppError> {
        if let Some(live) = self.sessions.read().await.of_user(&profile.id) {
            info!(target: "defit_backend", "Session resumed");
            return Ok(live);
        }

        let user_id = profile.id.clone();
        let session = Session::sign_in(profile, self.store.clone()).await?;
        let id = session.id.clone();

        let mut sessions = self.sessions.write().await;
        // a concurrent sign-in of the same user may have won the race
        if let Some(live) = sessions.of_user(&user_id) {
            return Ok(live);
        }
        let shared = Arc::new(Mutex::new(session));
        sessions.by_id.insert(id.clone(), LiveSession { user_id: user_id.clone(), session: shared.clone() });
        sessions.by_user.insert(user_id, id.clone());
        info!(target: "defit_backend", session_id = %id, live = sessions.by_id.len(), "Session opened");
        Ok(shared)
    }

    /// Drop a session. Returns whether it existed.
    #[instrument(level = "info", skip(self))]
    pub async fn close_session(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.by_id.remove(session_id) {
            Some(live) => {
                sessions.by_user.remove(&live.user_id);
                true
            }
            None => false,
        }
    }

    pub async fn session(&self, session_id: &str) -> Result<SharedSession, AppError> {
        self.sessions
            .read()
            .await
            .by_id
            .get(session_id)
            .map(|live| live.session.clone())
            .ok_or_else(|| AppError::UnknownSession(session_id.to_string()))
    }
}
