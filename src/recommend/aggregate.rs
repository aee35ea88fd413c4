use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use crate::schema::{Connection, GroupedCount, User};
use crate::types::id::UserId;

use super::RankedCandidate;

/// Builds the set of users that must never be recommended to `user`:
/// themselves and everyone on the other side of `connections`.
pub fn exclusion_set(user: UserId, connections: &[Connection]) -> HashSet<UserId> {
  let mut excluded = connections
    .iter()
    .map(|connection| connection.other_party(user))
    .collect::<HashSet<_>>();

  excluded.insert(user);
  excluded
}

/// Sums requester-side and recipient-side approved counts per user.
///
/// Excluded users never enter the map, and users without approved
/// connections are simply absent.
pub fn merge_counts(
  by_requester: &[GroupedCount],
  by_recipient: &[GroupedCount],
  excluded: &HashSet<UserId>,
) -> HashMap<UserId, u64> {
  let mut totals = HashMap::<UserId, u64>::new();
  for row in by_requester.iter().chain(by_recipient) {
    if excluded.contains(&row.user_id) || row.total <= 0 {
      continue;
    }
    *totals.entry(row.user_id).or_default() += row.total.unsigned_abs();
  }
  totals
}

/// Orders by total descending, then by user id ascending, and keeps
/// the first `limit` entries.
pub fn rank(totals: HashMap<UserId, u64>, limit: usize) -> Vec<(UserId, u64)> {
  let mut ranking = totals.into_iter().collect::<Vec<_>>();
  ranking.sort_unstable_by_key(|&(id, total)| (Reverse(total), id));
  ranking.truncate(limit);
  ranking
}

/// Pairs batch-fetched users with their totals and restores the
/// ranking order, which a batch fetch does not preserve. Ranked ids
/// without a fetched user are dropped.
pub fn attach_totals(users: Vec<User>, ranking: &[(UserId, u64)]) -> Vec<RankedCandidate> {
  let totals = ranking.iter().copied().collect::<HashMap<_, _>>();
  let mut candidates = users
    .into_iter()
    .filter_map(|user| {
      let total_connections = *totals.get(&user.id)?;
      Some(RankedCandidate {
        user,
        total_connections,
      })
    })
    .collect::<Vec<_>>();

  candidates.sort_unstable_by_key(|c| (Reverse(c.total_connections), c.user.id));
  candidates
}
