use std::collections::{BTreeMap, HashSet};

use crate::model::{ActivityCategory, ActivityEvent};

/// Fold normalized events into per-category totals and a deterministic,
/// chronological event list.
///
/// Deduplication key is `(category, repository, identifier)` with the
/// first occurrence winning; the same identifier may legitimately appear
/// under several categories (a PR both opened and reviewed in-window).
pub fn aggregate(events: Vec<ActivityEvent>) -> (BTreeMap<ActivityCategory, u64>, Vec<ActivityEvent>) {
  let mut seen: HashSet<(ActivityCategory, String, String)> = HashSet::new();
  let mut totals: BTreeMap<ActivityCategory, u64> = BTreeMap::new();
  let mut unique: Vec<ActivityEvent> = Vec::with_capacity(events.len());

  for event in events {
    let key = (event.category, event.repository.clone(), event.identifier.clone());

    if !seen.insert(key) {
      continue;
    }
    *totals.entry(event.category).or_insert(0) += 1;
    unique.push(event);
  }

  // Arrival order is never the presentation order: sort by explicit keys
  // so the output is deterministic for any input ordering.
  unique.sort_by(|a, b| {
    a.timestamp
      .cmp(&b.timestamp)
      .then_with(|| a.repository.cmp(&b.repository))
      .then_with(|| a.identifier.cmp(&b.identifier))
  });

  (totals, unique)
}
