use error_stack::{Report, ResultExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::{str::FromStr, time::Duration};
use tracing::warn;

use crate::config;

mod error;
pub mod migrations;

pub use error::*;

pub type PoolConnection = sqlx::pool::PoolConnection<sqlx::Postgres>;
pub type Connection = sqlx::PgConnection;

#[derive(Clone)]
pub struct Pool {
  pool: sqlx::PgPool,
  readonly: bool,
}

impl Pool {
  #[tracing::instrument(skip_all, name = "db.pool.new")]
  pub async fn new(global_cfg: &config::Database, pool_cfg: &config::DbPoolConfig) -> Result<Self> {
    let mut pool_opts = PgPoolOptions::new()
      .acquire_timeout(Duration::from_secs(global_cfg.timeout_secs.get()))
      .max_connections(pool_cfg.pool_size.get());

    if let Some(min_idle) = pool_cfg.min_idle {
      pool_opts = pool_opts.min_connections(min_idle.get());
    }

    let mut connect_opts =
      PgConnectOptions::from_str(pool_cfg.url.as_str()).change_context(Error::InvalidUrl)?;

    if global_cfg.enforce_tls {
      connect_opts = connect_opts.ssl_mode(PgSslMode::Prefer);
    }

    let pool = Self {
      pool: pool_opts.connect_lazy_with(connect_opts),
      readonly: pool_cfg.readonly,
    };

    // The server may start before the database does; the pool keeps
    // retrying lazily on every acquire.
    match pool.wait_until_healthy().await {
      Ok(..) => {}
      Err(err) if err.is_unhealthy() => {
        warn!("Database pool is not healthy yet, continuing anyway");
      }
      Err(err) => return Err(err),
    }

    Ok(pool)
  }
}

impl From<sqlx::PgPool> for Pool {
  fn from(pool: sqlx::PgPool) -> Self {
    Self {
      pool,
      readonly: false,
    }
  }
}

impl std::fmt::Debug for Pool {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pool")
      .field("connections", &self.connections())
      .field("readonly", &self.readonly)
      .finish()
  }
}

impl Pool {
  #[inline(always)]
  pub fn connections(&self) -> u32 {
    self.pool.size()
  }

  #[inline(always)]
  pub fn is_readonly(&self) -> bool {
    self.readonly
  }

  pub(crate) fn as_inner(&self) -> &sqlx::PgPool {
    &self.pool
  }

  #[tracing::instrument(name = "db.connect", skip(self))]
  pub async fn get(&self) -> Result<PoolConnection> {
    if let Some(inner) = self.pool.try_acquire() {
      return Ok(inner);
    }
    self.pool.acquire().await.into_db_error()
  }

  #[tracing::instrument(skip(self))]
  pub async fn wait_until_healthy(&self) -> Result<()> {
    self.pool.acquire().await.into_db_error().map(|_| ())
  }

  /// Like [`Pool::get`] but refuses to hand out connections
  /// from a pool configured as read-only.
  #[tracing::instrument(name = "db.connect_writable", skip(self))]
  pub async fn get_writable(&self) -> Result<PoolConnection> {
    if self.readonly {
      return Err(Report::new(Error::Readonly));
    }
    self.get().await
  }
}
