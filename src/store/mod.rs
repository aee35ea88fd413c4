//! Read/write access to users and their connections.
//!
//! Services only ever talk to a [`ConnectionStore`], which keeps them
//! independent from Postgres: [`PgStore`] backs the server while
//! [`InMemoryStore`] backs tests and embedders.
use async_trait::async_trait;
use error_stack::Result;
use thiserror::Error;

use crate::schema::{Connection, ConnectionStatus, GroupedCount, User};
use crate::types::id::{ConnectionId, UserId};

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
  /// The underlying storage could not serve the request.
  #[error("connection store is unavailable")]
  Unavailable,
  /// The storage only accepts reads at the moment.
  #[error("connection store is in read-only mode")]
  Readonly,
  /// A write collided with an existing active connection.
  #[error("an active connection already exists between these users")]
  Conflict,
}

#[async_trait]
pub trait ConnectionStore: std::fmt::Debug + Send + Sync {
  async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

  async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

  /// Batch fetch. Order of the returned users is unspecified and
  /// ids without a matching user are silently skipped.
  async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;

  /// Counts `APPROVED` and `PENDING` connections where `user` is
  /// either the requester or the recipient.
  async fn count_active_connections(&self, user: UserId) -> Result<u64, StoreError>;

  /// Lists `APPROVED` and `PENDING` connections involving `user`,
  /// newest first.
  async fn active_connections(&self, user: UserId) -> Result<Vec<Connection>, StoreError>;

  /// Approved connection counts grouped by requester.
  async fn approved_counts_by_requester(&self) -> Result<Vec<GroupedCount>, StoreError>;

  /// Approved connection counts grouped by recipient.
  async fn approved_counts_by_recipient(&self) -> Result<Vec<GroupedCount>, StoreError>;

  async fn connection_by_id(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError>;

  async fn active_connection_between(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Option<Connection>, StoreError>;

  /// Creates a `PENDING` connection.
  async fn insert_connection(
    &self,
    requester: UserId,
    recipient: UserId,
  ) -> Result<Connection, StoreError>;

  /// Compare-and-set on the connection status. Returns `None` when the
  /// connection does not exist or is not in the `from` state anymore.
  async fn transition_connection(
    &self,
    id: ConnectionId,
    from: ConnectionStatus,
    to: ConnectionStatus,
  ) -> Result<Option<Connection>, StoreError>;
}
