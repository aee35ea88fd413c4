//! Connection request lifecycle: send, accept, reject, cancel, list.
use error_stack::{Report, Result, ResultExt};
use thiserror::Error;
use tracing::info;

use crate::schema::{Connection, ConnectionStatus};
use crate::store::{ConnectionStore, StoreError};
use crate::types::id::{ConnectionId, UserId};
use crate::util::Sensitive;

#[derive(Debug, Error)]
pub enum ConnectionRequestError {
  #[error("users cannot connect with themselves")]
  SelfConnection,
  #[error("could not find user")]
  UserNotFound,
  #[error("could not find connection")]
  ConnectionNotFound,
  #[error("these users are already connected or have a pending request")]
  AlreadyExists,
  #[error("user is not allowed to act on this connection")]
  NotParticipant,
  #[error("connection request is no longer pending")]
  NotPending,
  #[error("connection store is in read-only mode")]
  Readonly,
  #[error("could not access the connection store")]
  StoreUnavailable,
}

fn store_error(report: Report<StoreError>) -> Report<ConnectionRequestError> {
  let context = match report.current_context() {
    StoreError::Conflict => ConnectionRequestError::AlreadyExists,
    StoreError::Readonly => ConnectionRequestError::Readonly,
    StoreError::Unavailable => ConnectionRequestError::StoreUnavailable,
  };
  report.change_context(context)
}

#[derive(Debug)]
pub struct SendConnectionRequest {
  pub requester: UserId,
  pub recipient: UserId,
}

impl SendConnectionRequest {
  #[tracing::instrument(name = "services.connections.send", skip(store))]
  pub async fn perform(
    self,
    store: &dyn ConnectionStore,
  ) -> Result<Connection, ConnectionRequestError> {
    if self.requester == self.recipient {
      return Err(Report::new(ConnectionRequestError::SelfConnection));
    }

    for id in [self.requester, self.recipient] {
      if store.user_by_id(id).await.map_err(store_error)?.is_none() {
        return Err(
          Report::new(ConnectionRequestError::UserNotFound)
            .attach_printable(format!("user {id} does not exist")),
        );
      }
    }

    let existing = store
      .active_connection_between(self.requester, self.recipient)
      .await
      .map_err(store_error)?;

    if let Some(existing) = existing {
      return Err(
        Report::new(ConnectionRequestError::AlreadyExists)
          .attach_printable(format!("existing connection {}", existing.id)),
      );
    }

    // A concurrent request for the same pair surfaces as a conflict here.
    let connection = store
      .insert_connection(self.requester, self.recipient)
      .await
      .map_err(store_error)?;

    info!(connection.id = %connection.id, "connection request sent");
    Ok(connection)
  }
}

/// What the recipient decided about a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Accept,
  Reject,
}

impl Decision {
  const fn target_status(self) -> ConnectionStatus {
    match self {
      Self::Accept => ConnectionStatus::Approved,
      Self::Reject => ConnectionStatus::Rejected,
    }
  }
}

#[derive(Debug)]
pub struct RespondConnectionRequest {
  pub connection: ConnectionId,
  pub actor: UserId,
  pub decision: Decision,
}

impl RespondConnectionRequest {
  #[tracing::instrument(name = "services.connections.respond", skip(store))]
  pub async fn perform(
    self,
    store: &dyn ConnectionStore,
  ) -> Result<Connection, ConnectionRequestError> {
    let connection = find_pending(store, self.connection).await?;
    if connection.recipient_id != self.actor {
      return Err(
        Report::new(ConnectionRequestError::NotParticipant)
          .attach_printable("only the recipient may answer a connection request"),
      );
    }

    transition(store, &connection, self.decision.target_status()).await
  }
}

#[derive(Debug)]
pub struct CancelConnectionRequest {
  pub connection: ConnectionId,
  pub actor: UserId,
}

impl CancelConnectionRequest {
  #[tracing::instrument(name = "services.connections.cancel", skip(store))]
  pub async fn perform(
    self,
    store: &dyn ConnectionStore,
  ) -> Result<Connection, ConnectionRequestError> {
    let connection = find_pending(store, self.connection).await?;
    if connection.requester_id != self.actor {
      return Err(
        Report::new(ConnectionRequestError::NotParticipant)
          .attach_printable("only the requester may cancel a connection request"),
      );
    }

    transition(store, &connection, ConnectionStatus::Cancelled).await
  }
}

#[derive(Debug)]
pub struct ListConnections {
  pub email: Sensitive<String>,
}

impl ListConnections {
  #[tracing::instrument(name = "services.connections.list", skip(store))]
  pub async fn perform(
    self,
    store: &dyn ConnectionStore,
  ) -> Result<Vec<Connection>, ConnectionRequestError> {
    let user = store
      .user_by_email(&self.email)
      .await
      .map_err(store_error)?
      .ok_or_else(|| Report::new(ConnectionRequestError::UserNotFound))?;

    store
      .active_connections(user.id)
      .await
      .map_err(store_error)
      .attach_printable("could not list active connections")
  }
}

async fn find_pending(
  store: &dyn ConnectionStore,
  id: ConnectionId,
) -> Result<Connection, ConnectionRequestError> {
  let connection = store
    .connection_by_id(id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| Report::new(ConnectionRequestError::ConnectionNotFound))?;

  if connection.status != ConnectionStatus::Pending {
    return Err(
      Report::new(ConnectionRequestError::NotPending)
        .attach_printable(format!("connection is {:?}", connection.status)),
    );
  }

  Ok(connection)
}

async fn transition(
  store: &dyn ConnectionStore,
  connection: &Connection,
  to: ConnectionStatus,
) -> Result<Connection, ConnectionRequestError> {
  let updated = store
    .transition_connection(connection.id, ConnectionStatus::Pending, to)
    .await
    .map_err(store_error)?
    // someone else answered between our read and write
    .ok_or_else(|| Report::new(ConnectionRequestError::NotPending))?;

  info!(connection.id = %updated.id, status = ?updated.status, "connection request updated");
  Ok(updated)
}
