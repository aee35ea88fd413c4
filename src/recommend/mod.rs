//! Ranks the most-connected users a person is not yet connected with.
//!
//! A person with fewer than [`CONNECTION_THRESHOLD`] approved or pending
//! connections gets up to [`MAX_CANDIDATES`] suggestions, ordered by how
//! many approved connections each candidate holds (ties go to the lower
//! user id). Anyone else gets `false`.
use error_stack::{Report, Result, ResultExt};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::schema::User;
use crate::store::ConnectionStore;
use crate::util::Sensitive;

pub mod aggregate;

/// Users with at least this many approved or pending connections
/// receive no recommendations.
pub const CONNECTION_THRESHOLD: u64 = 5;

/// Maximum length of a recommendation list.
pub const MAX_CANDIDATES: usize = 8;

#[derive(Debug, Error)]
pub enum RecommendError {
  #[error("could not find user to recommend connections for")]
  NotFound,
  #[error("could not read from the connection store")]
  StoreUnavailable,
}

/// A user augmented with their approved connection count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
  #[serde(flatten)]
  pub user: User,
  pub total_connections: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidates {
  /// Always `false`; kept for clients that branch on it.
  pub already_connected: bool,
  pub connection_count: u64,
  pub users: Vec<RankedCandidate>,
}

/// Outcome of [`RecommendConnections::perform`].
///
/// Serializes as a bare `false` when the user is already well
/// connected, otherwise as the [`Candidates`] object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
  AlreadyConnected,
  Candidates(Candidates),
}

impl Serialize for Recommendation {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    match self {
      Self::AlreadyConnected => serializer.serialize_bool(false),
      Self::Candidates(candidates) => candidates.serialize(serializer),
    }
  }
}

#[derive(Debug)]
pub struct RecommendConnections {
  pub email: Sensitive<String>,
}

impl RecommendConnections {
  #[tracing::instrument(skip_all, name = "services.recommend.perform")]
  pub async fn perform(
    self,
    store: &dyn ConnectionStore,
  ) -> Result<Recommendation, RecommendError> {
    let user = store
      .user_by_email(&self.email)
      .await
      .change_context(RecommendError::StoreUnavailable)?
      .ok_or_else(|| Report::new(RecommendError::NotFound))?;

    let connection_count = store
      .count_active_connections(user.id)
      .await
      .change_context(RecommendError::StoreUnavailable)
      .attach_printable("could not count active connections")?;

    if connection_count >= CONNECTION_THRESHOLD {
      debug!(user.id = %user.id, connection_count, "user is already well connected");
      return Ok(Recommendation::AlreadyConnected);
    }

    let connections = store
      .active_connections(user.id)
      .await
      .change_context(RecommendError::StoreUnavailable)
      .attach_printable("could not list active connections")?;

    let excluded = aggregate::exclusion_set(user.id, &connections);

    let (by_requester, by_recipient) = futures::try_join!(
      store.approved_counts_by_requester(),
      store.approved_counts_by_recipient(),
    )
    .change_context(RecommendError::StoreUnavailable)
    .attach_printable("could not count approved connections")?;

    let totals = aggregate::merge_counts(&by_requester, &by_recipient, &excluded);
    let ranking = aggregate::rank(totals, MAX_CANDIDATES);

    let ids = ranking.iter().map(|(id, _)| *id).collect::<Vec<_>>();
    let users = store
      .users_by_ids(&ids)
      .await
      .change_context(RecommendError::StoreUnavailable)
      .attach_printable("could not fetch candidate users")?;

    let users = aggregate::attach_totals(users, &ranking);
    debug!(
      user.id = %user.id,
      connection_count,
      candidates = users.len(),
      "computed connection recommendations"
    );

    Ok(Recommendation::Candidates(Candidates {
      already_connected: false,
      connection_count,
      users,
    }))
  }
}
