//! User record persistence.
//!
//! Records are whole-value writes keyed by `defit_user_<id>`; the last write wins.
//! Two backends: an in-process map and a directory of JSON files.

use std::{collections::HashMap, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::User;

const KEY_PREFIX: &str = "defit_user_";

pub fn user_key(user_id: &str) -> String {
  format!("{KEY_PREFIX}{user_id}")
}

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("storage I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("stored record is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid storage key: {0}")]
  InvalidKey(String),
}

#[async_trait]
pub trait UserStore: Send + Sync {
  /// Backend name for logs.
  fn name(&self) -> &'static str;

  async fn load(&self, key: &str) -> Result<Option<User>, StoreError>;

  async fn save(&self, key: &str, user: &User) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
  records: RwLock<HashMap<String, User>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl UserStore for MemoryStore {
  fn name(&self) -> &'static str {
    "memory"
  }

  async fn load(&self, key: &str) -> Result<Option<User>, StoreError> {
    Ok(self.records.read().await.get(key).cloned())
  }

  async fn save(&self, key: &str, user: &User) -> Result<(), StoreError> {
    self.records.write().await.insert(key.to_string(), user.clone());
    Ok(())
  }
}

/// One `<key>.json` file per user under `dir`. Each save writes its own
/// `<key>.<uuid>.tmp` and renames it over the record.
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  /// Create the directory if needed.
  pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let dir = dir.into();
    tokio::fs::create_dir_all(&dir).await?;
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
    let safe = !key.is_empty()
      && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
      && !key.starts_with('.');
    if !safe {
      return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(self.dir.join(format!("{key}.json")))
  }
}

#[async_trait]
impl UserStore for FileStore {
  fn name(&self) -> &'static str {
    "file"
  }

  #[instrument(level = "debug", skip(self), fields(dir = %self.dir.display()))]
  async fn load(&self, key: &str) -> Result<Option<User>, StoreError> {
    let path = self.path_for(key)?;
    match tokio::fs::read_to_string(&path).await {
      Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(level = "debug", skip(self, user), fields(dir = %self.dir.display()))]
  async fn save(&self, key: &str, user: &User) -> Result<(), StoreError> {
    let path = self.path_for(key)?;
    let tmp = self.dir.join(format!("{key}.{}.tmp", Uuid::new_v4()));
    let body = serde_json::to_vec_pretty(user)?;
    let written = match tokio::fs::write(&tmp, body).await {
      Ok(()) => tokio::fs::rename(&tmp, &path).await,
      Err(e) => Err(e),
    };
    if let Err(e) = written {
      let _ = tokio::fs::remove_file(&tmp).await;
      return Err(e.into());
    }
    debug!(target: "store", path = %path.display(), "User record written");
    Ok(())
  }
}
