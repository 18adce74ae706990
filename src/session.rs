//! Signed-in session: the active user plus the store it persists to.

use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::domain::{Challenge, Profile, User};
use crate::progress::{award, Award};
use crate::store::{user_key, StoreError, UserStore};

pub struct Session {
  pub id: String,
  pub user: User,
  store: Arc<dyn UserStore>,
}

impl Session {
  /// Find-or-create: a known profile resumes its stored progress, a new one starts
  /// empty and is saved right away.
  #[instrument(level = "info", skip(store), fields(user_id = %profile.id, store = store.name()))]
  pub async fn sign_in(profile: Profile, store: Arc<dyn UserStore>) -> Result<Self, StoreError> {
    let key = user_key(&profile.id);
    let user = match store.load(&key).await? {
      Some(user) => {
        info!(target: "store", user_id = %user.id, points = user.progress.points, "Resuming stored user");
        user
      }
      None => {
        let user = User { id: profile.id, username: profile.username, progress: Default::default() };
        store.save(&key, &user).await?;
        info!(target: "store", user_id = %user.id, "Created new user");
        user
      }
    };
    Ok(Self { id: Uuid::new_v4().to_string(), user, store })
  }

  /// Apply a passed challenge to the in-memory progress.
  pub fn record_pass(&mut self, catalog: &Catalog, challenge: &Challenge) -> Award {
    award(&mut self.user.progress, catalog, challenge)
  }

  /// Save the current record. A failure leaves in-memory progress untouched.
  pub async fn persist(&self) -> Result<(), StoreError> {
    let key = user_key(&self.user.id);
    self.store.save(&key, &self.user).await.map_err(|e| {
      error!(target: "store", user_id = %self.user.id, error = %e, "Failed to persist user progress");
      e
    })
  }
}
