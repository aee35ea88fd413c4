use async_trait::async_trait;
use error_stack::{Report, Result, ResultExt};
use tracing::warn;

use super::{ConnectionStore, StoreError};
use crate::config;
use crate::database::{self, ErrorExt2};
use crate::schema::{Connection, ConnectionStatus, GroupedCount, User};
use crate::types::id::{ConnectionId, UserId};

/// [`ConnectionStore`] backed by a primary Postgres database and an
/// optional read replica.
#[derive(Debug, Clone)]
pub struct PgStore {
  primary_db: database::Pool,
  replica_db: Option<database::Pool>,
}

impl PgStore {
  #[tracing::instrument(skip_all, name = "store.pg.connect")]
  pub async fn connect(cfg: &config::Database) -> database::Result<Self> {
    let primary_db = database::Pool::new(cfg, &cfg.primary).await?;
    let replica_db = if let Some(replica) = cfg.replica.as_ref() {
      Some(database::Pool::new(cfg, replica).await?)
    } else {
      None
    };

    Ok(Self {
      primary_db,
      replica_db,
    })
  }

  #[must_use]
  pub fn primary(&self) -> &database::Pool {
    &self.primary_db
  }

  #[tracing::instrument(skip_all, name = "store.pg.db_write")]
  async fn db_write(&self) -> database::Result<database::PoolConnection> {
    self.primary_db.get_writable().await
  }

  /// Prefers the replica and falls back to the primary pool when the
  /// replica is not healthy.
  #[tracing::instrument(skip_all, name = "store.pg.db_read")]
  async fn db_read(&self) -> database::Result<database::PoolConnection> {
    if let Some(replica) = self.replica_db.as_ref() {
      match replica.get().await {
        Ok(conn) => return Ok(conn),
        Err(err) if err.is_unhealthy() => {
          warn!("Replica database is not available, falling back to primary");
        }
        Err(err) => return Err(err),
      }
    }
    self.primary_db.get().await
  }
}

/// A store without a replica, reading and writing through `pool`.
impl From<database::Pool> for PgStore {
  fn from(pool: database::Pool) -> Self {
    Self {
      primary_db: pool,
      replica_db: None,
    }
  }
}

fn into_store_error(report: Report<database::Error>) -> Report<StoreError> {
  let context = if report.is_readonly() {
    StoreError::Readonly
  } else if report.is_unique_violation() {
    StoreError::Conflict
  } else {
    StoreError::Unavailable
  };
  report.change_context(context)
}

trait IntoStoreResult<T> {
  fn into_store(self) -> Result<T, StoreError>;
}

impl<T> IntoStoreResult<T> for database::Result<T> {
  fn into_store(self) -> Result<T, StoreError> {
    self.map_err(into_store_error)
  }
}

#[async_trait]
impl ConnectionStore for PgStore {
  async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    let mut conn = self.db_read().await.into_store()?;
    User::by_email(&mut conn, email).await.into_store()
  }

  async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
    let mut conn = self.db_read().await.into_store()?;
    User::by_id(&mut conn, id).await.into_store()
  }

  async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut conn = self.db_read().await.into_store()?;
    User::by_ids(&mut conn, ids).await.into_store()
  }

  async fn count_active_connections(&self, user: UserId) -> Result<u64, StoreError> {
    let mut conn = self.db_read().await.into_store()?;
    let count = Connection::count_active(&mut conn, user).await.into_store()?;
    u64::try_from(count)
      .change_context(StoreError::Unavailable)
      .attach_printable("database returned a negative connection count")
  }

  async fn active_connections(&self, user: UserId) -> Result<Vec<Connection>, StoreError> {
    let mut conn = self.db_read().await.into_store()?;
    Connection::active_for(&mut conn, user).await.into_store()
  }

  async fn approved_counts_by_requester(&self) -> Result<Vec<GroupedCount>, StoreError> {
    let mut conn = self.db_read().await.into_store()?;
    Connection::approved_counts_by_requester(&mut conn)
      .await
      .into_store()
  }

  async fn approved_counts_by_recipient(&self) -> Result<Vec<GroupedCount>, StoreError> {
    let mut conn = self.db_read().await.into_store()?;
    Connection::approved_counts_by_recipient(&mut conn)
      .await
      .into_store()
  }

  async fn connection_by_id(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError> {
    // Reads that decide a write go to the primary to avoid replica lag.
    let mut conn = self.primary_db.get().await.into_store()?;
    Connection::by_id(&mut conn, id).await.into_store()
  }

  async fn active_connection_between(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Option<Connection>, StoreError> {
    let mut conn = self.primary_db.get().await.into_store()?;
    Connection::active_between(&mut conn, a, b)
      .await
      .into_store()
  }

  async fn insert_connection(
    &self,
    requester: UserId,
    recipient: UserId,
  ) -> Result<Connection, StoreError> {
    let mut conn = self.db_write().await.into_store()?;
    Connection::insert(&mut conn, requester, recipient)
      .await
      .into_store()
  }

  async fn transition_connection(
    &self,
    id: ConnectionId,
    from: ConnectionStatus,
    to: ConnectionStatus,
  ) -> Result<Option<Connection>, StoreError> {
    let mut conn = self.db_write().await.into_store()?;
    Connection::transition(&mut conn, id, from, to)
      .await
      .into_store()
  }
}
