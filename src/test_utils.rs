use actix_web::{web, HttpResponse, HttpServer};
use async_trait::async_trait;
use error_stack::Result;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use crate::database;
use crate::schema::{Connection, ConnectionStatus, GroupedCount, User};
use crate::store::{ConnectionStore, InMemoryStore, StoreError};
use crate::types::id::{ConnectionId, UserId};
use crate::{config, App};

/// Builds an [`App`] backed by `store` with the test configuration.
pub fn app(store: Arc<InMemoryStore>) -> App {
  App::with_store(config::Server::for_tests(), store).unwrap()
}

/// Spawns a fake path service on a random local port.
///
/// - `/api/path` echoes the query next to a canned path list
/// - `/api/failing` answers `502 Bad Gateway`
/// - `/api/garbled` answers `200 OK` with a body that is not JSON
///
/// Must be called from within an actix system (`#[actix_web::test]`).
pub fn spawn_path_service() -> SocketAddr {
  let server = HttpServer::new(|| {
    actix_web::App::new()
      .route(
        "/api/path",
        web::post().to(|body: web::Json<Value>| async move {
          HttpResponse::Ok().json(json!({
            "received": body.into_inner(),
            "paths": [{ "hops": ["a@coryfi.com", "b@coryfi.com"], "strength": 0.8 }],
          }))
        }),
      )
      .route(
        "/api/failing",
        web::post().to(|| async { HttpResponse::BadGateway().json(json!({ "error": "down" })) }),
      )
      .route(
        "/api/garbled",
        web::post().to(|| async {
          HttpResponse::Ok()
            .content_type("text/html")
            .body("<html>maintenance</html>")
        }),
      )
  })
  .workers(1)
  .bind(("127.0.0.1", 0))
  .unwrap();

  let addr = server.addrs()[0];
  tokio::spawn(server.run());
  addr
}

/// Registers `{handle}@coryfi.com`.
pub async fn user(store: &InMemoryStore, handle: &str) -> UserId {
  store
    .insert_user(&format!("{handle}@coryfi.com"), handle)
    .await
    .unwrap()
    .id
}

pub async fn user_id(store: &InMemoryStore, handle: &str) -> UserId {
  store
    .user_by_email(&format!("{handle}@coryfi.com"))
    .await
    .unwrap()
    .unwrap_or_else(|| panic!("{handle} is not registered"))
    .id
}

pub async fn connect(
  store: &InMemoryStore,
  requester: UserId,
  recipient: UserId,
  status: ConnectionStatus,
) -> Connection {
  store
    .insert_connection_with_status(requester, recipient, status)
    .await
    .unwrap()
}

/// Inserts `{handle}@coryfi.com` into the `users` table.
pub async fn pg_user(conn: &mut database::Connection, handle: &str) -> UserId {
  sqlx::query_scalar::<_, UserId>(
    r#"INSERT INTO "users" (email, name) VALUES ($1, $2) RETURNING id"#,
  )
  .bind(format!("{handle}@coryfi.com"))
  .bind(handle)
  .fetch_one(conn)
  .await
  .unwrap()
}

/// Inserts a connection request and moves it to `status`.
pub async fn pg_connect(
  conn: &mut database::Connection,
  requester: UserId,
  recipient: UserId,
  status: ConnectionStatus,
) -> Connection {
  let pending = Connection::insert(conn, requester, recipient).await.unwrap();
  if status == ConnectionStatus::Pending {
    return pending;
  }

  Connection::transition(conn, pending.id, ConnectionStatus::Pending, status)
    .await
    .unwrap()
    .unwrap()
}

/// Wraps a store and records which methods were called, in order.
#[derive(Debug)]
pub struct RecordingStore {
  inner: Arc<InMemoryStore>,
  calls: Mutex<Vec<&'static str>>,
}

impl RecordingStore {
  pub fn new(inner: Arc<InMemoryStore>) -> Self {
    Self {
      inner,
      calls: Mutex::new(Vec::new()),
    }
  }

  pub fn calls(&self) -> Vec<&'static str> {
    self.calls.lock().unwrap().clone()
  }

  fn record(&self, name: &'static str) {
    self.calls.lock().unwrap().push(name);
  }
}

#[async_trait]
impl ConnectionStore for RecordingStore {
  async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    self.record("user_by_email");
    self.inner.user_by_email(email).await
  }

  async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
    self.record("user_by_id");
    self.inner.user_by_id(id).await
  }

  async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
    self.record("users_by_ids");
    self.inner.users_by_ids(ids).await
  }

  async fn count_active_connections(&self, user: UserId) -> Result<u64, StoreError> {
    self.record("count_active_connections");
    self.inner.count_active_connections(user).await
  }

  async fn active_connections(&self, user: UserId) -> Result<Vec<Connection>, StoreError> {
    self.record("active_connections");
    self.inner.active_connections(user).await
  }

  async fn approved_counts_by_requester(&self) -> Result<Vec<GroupedCount>, StoreError> {
    self.record("approved_counts_by_requester");
    self.inner.approved_counts_by_requester().await
  }

  async fn approved_counts_by_recipient(&self) -> Result<Vec<GroupedCount>, StoreError> {
    self.record("approved_counts_by_recipient");
    self.inner.approved_counts_by_recipient().await
  }

  async fn connection_by_id(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError> {
    self.record("connection_by_id");
    self.inner.connection_by_id(id).await
  }

  async fn active_connection_between(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Option<Connection>, StoreError> {
    self.record("active_connection_between");
    self.inner.active_connection_between(a, b).await
  }

  async fn insert_connection(
    &self,
    requester: UserId,
    recipient: UserId,
  ) -> Result<Connection, StoreError> {
    self.record("insert_connection");
    self.inner.insert_connection(requester, recipient).await
  }

  async fn transition_connection(
    &self,
    id: ConnectionId,
    from: ConnectionStatus,
    to: ConnectionStatus,
  ) -> Result<Option<Connection>, StoreError> {
    self.record("transition_connection");
    self.inner.transition_connection(id, from, to).await
  }
}
