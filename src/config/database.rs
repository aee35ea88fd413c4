use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64};

use crate::util::Sensitive;

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
  /// Writable primary database.
  pub primary: DbPoolConfig,
  /// A read-only replica used for recommendation and listing
  /// queries so they do not compete with writes on the primary.
  pub replica: Option<DbPoolConfig>,
  /// Forces all database connections are encrypted with TLS
  /// (if possible).
  ///
  /// **Environment variables**:
  /// - `CORYFI_DB_ENFORCE_TLS`
  #[serde(default = "DbPoolConfig::default_enforce_tls")]
  pub enforce_tls: bool,
  /// How long the server waits for a pooled connection before
  /// giving up.
  ///
  /// **Environment variables**:
  /// - `CORYFI_DB_TIMEOUT_SECS`
  #[serde(default = "DbPoolConfig::default_pool_timeout_secs")]
  pub timeout_secs: NonZeroU64,
}

/// Configuration for connecting to any Postgres database
#[derive(Debug, Clone, Deserialize)]
pub struct DbPoolConfig {
  /// Database pool must be in read-only mode.
  ///
  /// **Environment variables**:
  /// - `CORYFI_DB_PRIMARY_READONLY`
  /// - `CORYFI_DB_REPLICA_READONLY`
  #[serde(default)]
  pub readonly: bool,
  /// Minimum idle database connections.
  ///
  /// **Environment variables**:
  /// - `CORYFI_DB_PRIMARY_MIN_IDLE`
  /// - `CORYFI_DB_REPLICA_MIN_IDLE`
  pub min_idle: Option<NonZeroU32>,
  /// Maximum amount of connections the pool may hold.
  ///
  /// **Environment variables**:
  /// - `CORYFI_DB_PRIMARY_POOL_SIZE`
  /// - `CORYFI_DB_REPLICA_POOL_SIZE`
  #[serde(default = "DbPoolConfig::default_pool_size")]
  pub pool_size: NonZeroU32,
  /// Connection URL connecting to the Postgres database.
  ///
  /// **Environment variables**:
  /// - `CORYFI_DB_PRIMARY_URL` or `DATABASE_URL`
  /// - `CORYFI_DB_REPLICA_URL`
  pub url: Sensitive<String>,
}

impl DbPoolConfig {
  const DEFAULT_POOL_SIZE: u32 = 5;
  const DEFAULT_POOL_TIMEOUT_SECS: u64 = 5;

  #[must_use]
  pub fn new(url: impl Into<String>) -> Self {
    Self {
      readonly: false,
      min_idle: None,
      pool_size: Self::default_pool_size(),
      url: Sensitive::new(url.into()),
    }
  }

  // Required by serde
  const fn default_pool_size() -> NonZeroU32 {
    match NonZeroU32::new(Self::DEFAULT_POOL_SIZE) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_SIZE is accidentally set to 0"),
    }
  }

  pub(crate) const fn default_pool_timeout_secs() -> NonZeroU64 {
    match NonZeroU64::new(Self::DEFAULT_POOL_TIMEOUT_SECS) {
      Some(n) => n,
      None => panic!("DEFAULT_POOL_TIMEOUT_SECS is accidentally set to 0"),
    }
  }

  pub(crate) const fn default_enforce_tls() -> bool {
    true
  }
}
