// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the unified activity model shared by querying, aggregation and rendering
// role: model/types
// outputs: ActivityCategory, ActivityEvent, TimeWindow, ReportModel with stable serde shapes
// invariants: ReportModel is immutable after build; totals carry every category; events are chronological
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ReportError, Result};

/// The seven trackable kinds of activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
  Commit,
  PrOpened,
  PrMerged,
  PrReviewed,
  IssueOpened,
  IssueClosed,
  Comment,
}

impl ActivityCategory {
  pub const ALL: [ActivityCategory; 7] = [
    ActivityCategory::Commit,
    ActivityCategory::PrOpened,
    ActivityCategory::PrMerged,
    ActivityCategory::PrReviewed,
    ActivityCategory::IssueOpened,
    ActivityCategory::IssueClosed,
    ActivityCategory::Comment,
  ];

  /// Human label used in warnings and report sections.
  pub fn label(&self) -> &'static str {
    match self {
      ActivityCategory::Commit => "commits",
      ActivityCategory::PrOpened => "pull requests opened",
      ActivityCategory::PrMerged => "pull requests merged",
      ActivityCategory::PrReviewed => "pull requests reviewed",
      ActivityCategory::IssueOpened => "issues opened",
      ActivityCategory::IssueClosed => "issues closed",
      ActivityCategory::Comment => "comments",
    }
  }
}

/// Half-open time range `[start, end)`; `end` is never in the future at
/// evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
  pub start: DateTime<Utc>,
  pub end: DateTime<Utc>,
}

impl TimeWindow {
  pub fn contains(&self, instant: DateTime<Utc>) -> bool {
    instant >= self.start && instant < self.end
  }
}

/// One normalized activity record. `identifier` is a commit SHA or a
/// PR/issue number and is unique within `(repository, category)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
  pub category: ActivityCategory,
  pub repository: String,
  pub identifier: String,
  pub timestamp: DateTime<Utc>,
  pub author: String,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub metadata: BTreeMap<String, String>,
}

impl ActivityEvent {
  pub fn title(&self) -> Option<&str> {
    self.metadata.get("title").map(String::as_str)
  }

  pub fn url(&self) -> Option<&str> {
    self.metadata.get("url").map(String::as_str)
  }
}

/// The structured report handed to a renderer. Built once per invocation,
/// never mutated afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportModel {
  pub developer: String,
  pub window: TimeWindow,
  pub totals: BTreeMap<ActivityCategory, u64>,
  pub events: Vec<ActivityEvent>,
  pub warnings: Vec<String>,
  pub generated_at: DateTime<Utc>,
}

impl ReportModel {
  /// Pure assembly of the final report object. Fails only on an empty
  /// developer name.
  pub fn build(
    developer: &str,
    window: TimeWindow,
    totals: BTreeMap<ActivityCategory, u64>,
    events: Vec<ActivityEvent>,
    warnings: Vec<String>,
  ) -> Result<ReportModel> {
    if developer.trim().is_empty() {
      return Err(ReportError::InvalidInput("developer name is empty".into()));
    }

    // Renderers index totals unconditionally; fill the gaps with zeros.
    let mut totals = totals;
    for cat in ActivityCategory::ALL {
      totals.entry(cat).or_insert(0);
    }

    Ok(ReportModel {
      developer: developer.to_string(),
      window,
      totals,
      events,
      warnings,
      generated_at: window.end,
    })
  }

  /// Repositories touched by any event, sorted and deduplicated.
  pub fn active_repositories(&self) -> Vec<&str> {
    let mut repos: Vec<&str> = self.events.iter().map(|e| e.repository.as_str()).collect();
    repos.sort_unstable();
    repos.dedup();
    repos
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn window() -> TimeWindow {
    TimeWindow {
      start: Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap(),
      end: Utc.with_ymd_and_hms(2025, 11, 17, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn window_contains_is_half_open() {
    let w = window();
    assert!(w.contains(w.start));
    assert!(!w.contains(w.end));
    assert!(w.contains(Utc.with_ymd_and_hms(2025, 11, 14, 12, 0, 0).unwrap()));
  }

  #[test]
  fn build_rejects_empty_developer() {
    let err = ReportModel::build("  ", window(), BTreeMap::new(), vec![], vec![]).unwrap_err();
    assert!(matches!(err, ReportError::InvalidInput(_)));
  }

  #[test]
  fn build_fills_missing_totals_with_zero() {
    let mut totals = BTreeMap::new();
    totals.insert(ActivityCategory::Commit, 3u64);
    let model = ReportModel::build("octo", window(), totals, vec![], vec![]).unwrap();
    assert_eq!(model.totals.len(), 7);
    assert_eq!(model.totals[&ActivityCategory::Commit], 3);
    assert_eq!(model.totals[&ActivityCategory::IssueClosed], 0);
  }

  #[test]
  fn active_repositories_sorted_unique() {
    let mk = |repo: &str| ActivityEvent {
      category: ActivityCategory::Commit,
      repository: repo.into(),
      identifier: "abc".into(),
      timestamp: window().start,
      author: "octo".into(),
      metadata: BTreeMap::new(),
    };
    let model = ReportModel::build(
      "octo",
      window(),
      BTreeMap::new(),
      vec![mk("b/two"), mk("a/one"), mk("b/two")],
      vec![],
    )
    .unwrap();
    assert_eq!(model.active_repositories(), vec!["a/one", "b/two"]);
  }
}
