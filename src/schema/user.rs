use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::UserId,
};

#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: UserId,
  pub email: String,
  pub name: String,
  pub created_at: NaiveDateTime,
}

impl User {
  #[tracing::instrument(skip(conn), name = "db.users.by_id")]
  pub async fn by_id(conn: &mut Connection, id: UserId) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE id = $1"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn, email), fields(email = "<hidden>"), name = "db.users.by_email")]
  pub async fn by_email(conn: &mut Connection, email: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE email = $1"#)
      .bind(email)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  /// Fetches every user whose id is in `ids`. Rows come back
  /// in no particular order.
  #[tracing::instrument(skip(conn, ids), fields(ids = ids.len()), name = "db.users.by_ids")]
  pub async fn by_ids(conn: &mut Connection, ids: &[UserId]) -> Result<Vec<Self>> {
    let ids = ids.iter().map(|id| id.0).collect::<Vec<_>>();
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE id = ANY($1)"#)
      .bind(ids)
      .fetch_all(conn)
      .await
      .into_db_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::pg_user;
  use sqlx::PgPool;

  #[sqlx::test(migrator = "crate::database::migrations::MIGRATOR")]
  async fn finds_users_by_email_and_id(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = pg_user(&mut conn, "alice").await;

    let by_email = User::by_email(&mut conn, "alice@coryfi.com").await.unwrap();
    assert_eq!(by_email.as_ref().map(|u| u.id), Some(alice));
    assert_eq!(by_email.map(|u| u.name), Some("alice".to_string()));

    let by_id = User::by_id(&mut conn, alice).await.unwrap();
    assert_eq!(by_id.map(|u| u.email), Some("alice@coryfi.com".to_string()));

    assert!(User::by_email(&mut conn, "ALICE@coryfi.com")
      .await
      .unwrap()
      .is_none());
  }

  #[sqlx::test(migrator = "crate::database::migrations::MIGRATOR")]
  async fn batch_fetch_skips_missing_ids(pool: PgPool) {
    let mut conn = pool.acquire().await.unwrap();
    let alice = pg_user(&mut conn, "alice").await;
    let bob = pg_user(&mut conn, "bob").await;
    pg_user(&mut conn, "carol").await;

    let mut users = User::by_ids(&mut conn, &[bob, UserId(9_999), alice])
      .await
      .unwrap()
      .into_iter()
      .map(|u| u.id)
      .collect::<Vec<_>>();
    users.sort_unstable();
    assert_eq!(users, vec![alice, bob]);
  }
}
