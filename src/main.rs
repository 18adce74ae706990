//! Defit · gamified coding-challenge backend
//!
//! - Axum HTTP + WebSocket API
//! - Heuristic evaluator for Python-like and HTML/CSS submissions
//! - Badge rule engine and per-user progress (memory or JSON files)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   CATALOG_CONFIG_PATH : path to TOML catalog (extra challenges and badges)
//!   DATA_DIR            : directory for user records; in-memory store if unset
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod domain;
mod config;
mod seeds;
mod evaluator;
mod catalog;
mod badges;
mod progress;
mod store;
mod session;
mod error;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::catalog::Catalog;
use crate::config::{load_catalog_config, ServerConfig};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{FileStore, MemoryStore, UserStore};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = ServerConfig::from_env();

  // Catalog: optional TOML entries first, then built-in seeds.
  let catalog_cfg = cfg.catalog_path.as_deref().and_then(load_catalog_config);
  let catalog = Catalog::from_config(catalog_cfg.as_ref());

  let store: Arc<dyn UserStore> = match &cfg.data_dir {
    Some(dir) => {
      info!(target: "defit_backend", dir = %dir.display(), "Using file store");
      Arc::new(FileStore::open(dir.clone()).await?)
    }
    None => {
      info!(target: "defit_backend", "DATA_DIR not set; progress is kept in memory only");
      Arc::new(MemoryStore::new())
    }
  };

  let state = Arc::new(AppState::new(catalog, store));
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "defit_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
      info!(target: "defit_backend", "Shutdown signal received");
    })
    .await?;
  Ok(())
}
