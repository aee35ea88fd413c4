use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
  database::{self, ErrorExt, Result},
  types::id::{ConnectionId, UserId},
};

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "connection_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
  Pending,
  Approved,
  Rejected,
  Cancelled,
}

impl ConnectionStatus {
  /// Pending and approved connections both count against a user
  /// and keep the pair out of each other's recommendations.
  #[must_use]
  pub const fn is_active(self) -> bool {
    matches!(self, Self::Pending | Self::Approved)
  }
}

/// A connection request between two users.
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
  pub id: ConnectionId,
  pub created_at: NaiveDateTime,
  pub requester_id: UserId,
  pub recipient_id: UserId,
  pub status: ConnectionStatus,
  pub updated_at: Option<NaiveDateTime>,
}

/// One row of a `GROUP BY` count over approved connections.
#[derive(Debug, Clone, Copy, FromRow, PartialEq, Eq)]
pub struct GroupedCount {
  pub user_id: UserId,
  pub total: i64,
}

impl Connection {
  /// Returns the endpoint that is not `user`.
  #[must_use]
  pub fn other_party(&self, user: UserId) -> UserId {
    if self.requester_id == user {
      self.recipient_id
    } else {
      self.requester_id
    }
  }

  #[must_use]
  pub fn involves(&self, user: UserId) -> bool {
    self.requester_id == user || self.recipient_id == user
  }
}

impl Connection {
  #[tracing::instrument(skip(conn), name = "db.connections.by_id")]
  pub async fn by_id(conn: &mut database::Connection, id: ConnectionId) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "connections" WHERE id = $1"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.connections.count_active")]
  pub async fn count_active(conn: &mut database::Connection, user: UserId) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
      r#"SELECT COUNT(*) FROM "connections"
      WHERE (requester_id = $1 OR recipient_id = $1)
        AND status IN ('APPROVED', 'PENDING')"#,
    )
    .bind(user)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.connections.active_for")]
  pub async fn active_for(conn: &mut database::Connection, user: UserId) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "connections"
      WHERE (requester_id = $1 OR recipient_id = $1)
        AND status IN ('APPROVED', 'PENDING')
      ORDER BY created_at DESC, id DESC"#,
    )
    .bind(user)
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  /// Looks up the active connection between two users, whichever
  /// of them sent the request.
  #[tracing::instrument(skip(conn), name = "db.connections.active_between")]
  pub async fn active_between(
    conn: &mut database::Connection,
    a: UserId,
    b: UserId,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "connections"
      WHERE ((requester_id = $1 AND recipient_id = $2)
          OR (requester_id = $2 AND recipient_id = $1))
        AND status IN ('APPROVED', 'PENDING')
      LIMIT 1"#,
    )
    .bind(a)
    .bind(b)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.connections.approved_by_requester")]
  pub async fn approved_counts_by_requester(
    conn: &mut database::Connection,
  ) -> Result<Vec<GroupedCount>> {
    sqlx::query_as::<_, GroupedCount>(
      r#"SELECT requester_id AS user_id, COUNT(*) AS total
      FROM "connections"
      WHERE status = 'APPROVED'
      GROUP BY requester_id"#,
    )
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.connections.approved_by_recipient")]
  pub async fn approved_counts_by_recipient(
    conn: &mut database::Connection,
  ) -> Result<Vec<GroupedCount>> {
    sqlx::query_as::<_, GroupedCount>(
      r#"SELECT recipient_id AS user_id, COUNT(*) AS total
      FROM "connections"
      WHERE status = 'APPROVED'
      GROUP BY recipient_id"#,
    )
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn), name = "db.connections.insert")]
  pub async fn insert(
    conn: &mut database::Connection,
    requester: UserId,
    recipient: UserId,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "connections" (requester_id, recipient_id, status)
      VALUES ($1, $2, 'PENDING')
      RETURNING *"#,
    )
    .bind(requester)
    .bind(recipient)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  /// Moves a connection from `from` to `to`. Returns `None` if the
  /// connection is missing or no longer in the `from` state.
  #[tracing::instrument(skip(conn), name = "db.connections.transition")]
  pub async fn transition(
    conn: &mut database::Connection,
    id: ConnectionId,
    from: ConnectionStatus,
    to: ConnectionStatus,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"UPDATE "connections"
      SET status = $3, updated_at = (now() AT TIME ZONE 'utc')
      WHERE id = $1 AND status = $2
      RETURNING *"#,
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }
}
