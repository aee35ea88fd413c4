use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use error_stack::{Report, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ConnectionStore, StoreError};
use crate::schema::{Connection, ConnectionStatus, GroupedCount, User};
use crate::types::id::{ConnectionId, UserId};

/// [`ConnectionStore`] kept entirely in memory.
///
/// Ids are handed out sequentially starting from 1, mirroring
/// `BIGSERIAL` columns, and every listing is returned in a stable
/// order so results are reproducible.
#[derive(Debug, Default)]
pub struct InMemoryStore {
  state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
  users: Vec<User>,
  connections: Vec<Connection>,
}

impl InMemoryStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers a new user. Fails with [`StoreError::Conflict`] if the
  /// email is already taken.
  pub async fn insert_user(&self, email: &str, name: &str) -> Result<User, StoreError> {
    let mut state = self.state.write().await;
    if state.users.iter().any(|user| user.email == email) {
      return Err(Report::new(StoreError::Conflict).attach_printable("email is already taken"));
    }

    let user = User {
      id: UserId(next_id(state.users.len())),
      email: email.to_string(),
      name: name.to_string(),
      created_at: now(),
    };
    state.users.push(user.clone());
    Ok(user)
  }

  /// Inserts a connection with an arbitrary status, bypassing the
  /// request lifecycle. Useful for seeding.
  pub async fn insert_connection_with_status(
    &self,
    requester: UserId,
    recipient: UserId,
    status: ConnectionStatus,
  ) -> Result<Connection, StoreError> {
    let mut state = self.state.write().await;
    state.insert_connection(requester, recipient, status)
  }
}

impl State {
  fn user_exists(&self, id: UserId) -> bool {
    self.users.iter().any(|user| user.id == id)
  }

  fn active_between(&self, a: UserId, b: UserId) -> Option<&Connection> {
    self
      .connections
      .iter()
      .find(|c| c.status.is_active() && c.involves(a) && c.involves(b))
  }

  fn insert_connection(
    &mut self,
    requester: UserId,
    recipient: UserId,
    status: ConnectionStatus,
  ) -> Result<Connection, StoreError> {
    if requester == recipient {
      return Err(
        Report::new(StoreError::Conflict).attach_printable("requester and recipient are the same"),
      );
    }

    if !self.user_exists(requester) || !self.user_exists(recipient) {
      return Err(
        Report::new(StoreError::Unavailable).attach_printable("connection references unknown user"),
      );
    }

    if status.is_active() && self.active_between(requester, recipient).is_some() {
      return Err(Report::new(StoreError::Conflict));
    }

    let connection = Connection {
      id: ConnectionId(next_id(self.connections.len())),
      created_at: now(),
      requester_id: requester,
      recipient_id: recipient,
      status,
      updated_at: None,
    };
    self.connections.push(connection.clone());
    Ok(connection)
  }

  fn approved_counts(&self, key: impl Fn(&Connection) -> UserId) -> Vec<GroupedCount> {
    let mut totals = HashMap::<UserId, i64>::new();
    for connection in &self.connections {
      if connection.status == ConnectionStatus::Approved {
        *totals.entry(key(connection)).or_default() += 1;
      }
    }

    let mut rows = totals
      .into_iter()
      .map(|(user_id, total)| GroupedCount { user_id, total })
      .collect::<Vec<_>>();

    rows.sort_unstable_by_key(|row| row.user_id);
    rows
  }
}

fn next_id(len: usize) -> i64 {
  i64::try_from(len).map_or(i64::MAX, |len| len + 1)
}

fn now() -> NaiveDateTime {
  Utc::now().naive_utc()
}

#[async_trait]
impl ConnectionStore for InMemoryStore {
  async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
    let state = self.state.read().await;
    Ok(state.users.iter().find(|user| user.email == email).cloned())
  }

  async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
    let state = self.state.read().await;
    Ok(state.users.iter().find(|user| user.id == id).cloned())
  }

  async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
    let state = self.state.read().await;
    Ok(
      state
        .users
        .iter()
        .filter(|user| ids.contains(&user.id))
        .cloned()
        .collect(),
    )
  }

  async fn count_active_connections(&self, user: UserId) -> Result<u64, StoreError> {
    let state = self.state.read().await;
    let count = state
      .connections
      .iter()
      .filter(|c| c.status.is_active() && c.involves(user))
      .count();

    Ok(u64::try_from(count).unwrap_or(u64::MAX))
  }

  async fn active_connections(&self, user: UserId) -> Result<Vec<Connection>, StoreError> {
    let state = self.state.read().await;
    Ok(
      state
        .connections
        .iter()
        .rev()
        .filter(|c| c.status.is_active() && c.involves(user))
        .cloned()
        .collect(),
    )
  }

  async fn approved_counts_by_requester(&self) -> Result<Vec<GroupedCount>, StoreError> {
    let state = self.state.read().await;
    Ok(state.approved_counts(|c| c.requester_id))
  }

  async fn approved_counts_by_recipient(&self) -> Result<Vec<GroupedCount>, StoreError> {
    let state = self.state.read().await;
    Ok(state.approved_counts(|c| c.recipient_id))
  }

  async fn connection_by_id(&self, id: ConnectionId) -> Result<Option<Connection>, StoreError> {
    let state = self.state.read().await;
    Ok(state.connections.iter().find(|c| c.id == id).cloned())
  }

  async fn active_connection_between(
    &self,
    a: UserId,
    b: UserId,
  ) -> Result<Option<Connection>, StoreError> {
    let state = self.state.read().await;
    Ok(state.active_between(a, b).cloned())
  }

  async fn insert_connection(
    &self,
    requester: UserId,
    recipient: UserId,
  ) -> Result<Connection, StoreError> {
    let mut state = self.state.write().await;
    state.insert_connection(requester, recipient, ConnectionStatus::Pending)
  }

  async fn transition_connection(
    &self,
    id: ConnectionId,
    from: ConnectionStatus,
    to: ConnectionStatus,
  ) -> Result<Option<Connection>, StoreError> {
    let mut state = self.state.write().await;
    let Some(connection) = state
      .connections
      .iter_mut()
      .find(|c| c.id == id && c.status == from)
    else {
      return Ok(None);
    };

    connection.status = to;
    connection.updated_at = Some(now());
    Ok(Some(connection.clone()))
  }
}
