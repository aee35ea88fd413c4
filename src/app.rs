use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::config;
use crate::paths::PathClient;
use crate::store::{ConnectionStore, PgStore};

#[derive(Debug, Clone)]
pub struct App {
  pub config: Arc<config::Server>,
  store: Arc<dyn ConnectionStore>,
  paths: PathClient,
}

#[derive(Debug, Error)]
#[error("Failed to initialize App struct")]
pub struct AppError;

impl App {
  /// Connects to Postgres as described by `cfg`.
  #[tracing::instrument(skip_all, name = "app.new")]
  pub async fn new(cfg: config::Server) -> Result<Self, AppError> {
    let store = PgStore::connect(&cfg.db)
      .await
      .change_context(AppError)
      .attach_printable("could not connect to the database")?;

    Self::with_store(cfg, Arc::new(store))
  }

  /// Builds an [`App`] on top of any [`ConnectionStore`].
  pub fn with_store(
    cfg: config::Server,
    store: Arc<dyn ConnectionStore>,
  ) -> Result<Self, AppError> {
    let paths = PathClient::new(&cfg.paths)
      .change_context(AppError)
      .attach_printable("could not set up the path service client")?;

    Ok(Self {
      config: Arc::new(cfg),
      store,
      paths,
    })
  }
}

impl App {
  #[must_use]
  pub fn store(&self) -> &dyn ConnectionStore {
    self.store.as_ref()
  }

  #[must_use]
  pub fn paths(&self) -> &PathClient {
    &self.paths
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::InMemoryStore;
  use static_assertions::assert_impl_all;

  assert_impl_all!(App: Send, Sync, Clone);

  #[test]
  fn builds_with_in_memory_store() {
    let store = Arc::new(InMemoryStore::new());
    let app = App::with_store(config::Server::for_tests(), store).unwrap();
    assert_eq!(app.paths().url().as_str(), "http://127.0.0.1:9/api/path");
  }
}
