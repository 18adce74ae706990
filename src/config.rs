//! Runtime configuration: server settings from the environment and the optional
//! catalog file (extra/overriding challenges and badges) from TOML.
//!
//! Environment:
//!   PORT                : u16 (default 3000)
//!   CATALOG_CONFIG_PATH : TOML file with `[[challenges]]` / `[[badges]]` tables
//!   DATA_DIR            : directory for JSON user records; in-memory store if unset

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Badge, Challenge};

/// Catalog entries accepted from TOML. Entries here take precedence over the
/// built-in seeds with the same id.
///
/// ```toml
/// [[challenges]]
/// id = "py-modulo"
/// title = "Remainders"
/// description = "Print 17 modulo 5."
/// category = "script_language"
/// level = "beginner"
/// initial_code = ""
/// solution = "2"
/// points = 100
///
/// [[badges]]
/// id = "points-1000"
/// title = "Legend"
/// description = "Reach 1000 points."
/// trigger = { kind = "point_threshold", points = 1000 }
/// ```
#[derive(Clone, Debug, Deserialize, Default)]
pub struct CatalogConfig {
  #[serde(default)]
  pub challenges: Vec<Challenge>,
  #[serde(default)]
  pub badges: Vec<Badge>,
}

/// Server-level settings read once at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
  pub port: u16,
  pub catalog_path: Option<PathBuf>,
  pub data_dir: Option<PathBuf>,
}

impl ServerConfig {
  pub fn from_env() -> Self {
    Self {
      port: std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000),
      catalog_path: std::env::var_os("CATALOG_CONFIG_PATH").map(PathBuf::from),
      data_dir: std::env::var_os("DATA_DIR").map(PathBuf::from),
    }
  }
}

pub fn parse_catalog_config(s: &str) -> Result<CatalogConfig, toml::de::Error> {
  toml::from_str::<CatalogConfig>(s)
}

/// Attempt to load the catalog file. On any parsing/IO error, returns None and
/// the built-in catalog is used alone.
pub fn load_catalog_config(path: &Path) -> Option<CatalogConfig> {
  let path_display = path.display();
  match std::fs::read_to_string(path) {
    Ok(s) => match parse_catalog_config(&s) {
      Ok(cfg) => {
        info!(target: "defit_backend", path = %path_display, challenges = cfg.challenges.len(), badges = cfg.badges.len(), "Loaded catalog config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "defit_backend", path = %path_display, error = %e, "Failed to parse TOML catalog config");
        None
      }
    },
    Err(e) => {
      error!(target: "defit_backend", path = %path_display, error = %e, "Failed to read TOML catalog config file");
      None
    }
  }
}
