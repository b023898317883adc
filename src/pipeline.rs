// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate the per-category queries and fold their results into the final ReportModel
// role: pipeline/orchestrator
// inputs: username + TimeWindow + shared QueryClient
// outputs: ReportModel (totals, chronological events, warnings)
// side_effects: Network I/O through the client; blocks until all category tasks join
// invariants:
// - Category tasks run independently; one transient failure becomes a warning, not an abort
// - Fatal failures latch the client abort flag and cancel remaining work
// - Aggregation starts only after every task has completed or been abandoned
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregate::aggregate;
use crate::error::{ReportError, Result};
use crate::github::client::QueryClient;
use crate::github::endpoints::{descriptor, EndpointKind};
use crate::model::{ActivityEvent, ReportModel, TimeWindow};
use crate::normalize::normalize_all;

type CategoryOutcome = std::result::Result<(Vec<ActivityEvent>, Vec<String>), ReportError>;

/// Run the full aggregation pipeline: one query per category, normalize,
/// fold, build. A report comes back whenever at least the fatal paths
/// stayed clear; failed categories surface as warnings.
pub fn generate_report(username: &str, window: TimeWindow, client: &QueryClient) -> Result<ReportModel> {
  info!(username, start = %window.start, end = %window.end, "generating activity report");

  // The seven queries are independent; the client serializes what must be
  // serialized (the account-wide rate counter).
  let outcomes: Vec<CategoryOutcome> = EndpointKind::ALL
    .par_iter()
    .map(|kind| run_category(client, *kind, username, &window))
    .collect();

  let mut events: Vec<ActivityEvent> = Vec::new();
  let mut warnings: Vec<String> = Vec::new();
  let mut fatal: Option<ReportError> = None;

  for outcome in outcomes {
    match outcome {
      Ok((mut evs, mut warns)) => {
        events.append(&mut evs);
        warnings.append(&mut warns);
      }
      Err(err) if err.is_fatal() => {
        if fatal.is_none() {
          fatal = Some(err);
        }
      }
      Err(err) => warnings.push(err.to_string()),
    }
  }

  if let Some(err) = fatal {
    return Err(err);
  }

  let (totals, events) = aggregate(events);

  ReportModel::build(username, window, totals, events, warnings)
}

fn run_category(client: &QueryClient, kind: EndpointKind, username: &str, window: &TimeWindow) -> CategoryOutcome {
  let label = descriptor(kind).category.label();

  match client.query(kind, username, window) {
    Ok(records) => {
      let (events, warnings) = normalize_all(kind, &records, username, window);
      Ok((events, warnings))
    }
    Err(err) if err.is_fatal() => {
      client.abort();
      Err(err)
    }
    Err(err) => {
      warn!(category = label, error = %err, "category query abandoned");
      Err(ReportError::TransientQuery {
        category: label.to_string(),
        message: err.to_string(),
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::github::transport::testing::{page, with_status, ScriptedTransport};
  use crate::model::ActivityCategory;
  use chrono::{TimeZone, Utc};
  use std::sync::Arc;
  use std::time::Duration;

  fn window() -> TimeWindow {
    TimeWindow {
      start: Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap(),
      end: Utc.with_ymd_and_hms(2025, 11, 17, 0, 0, 0).unwrap(),
    }
  }

  fn client(transport: Arc<ScriptedTransport>) -> QueryClient {
    QueryClient::new(transport).with_backoff_base(Duration::ZERO)
  }

  fn commit_items() -> serde_json::Value {
    serde_json::json!({"items": [{
      "sha": "a1b2c3d4",
      "html_url": "https://github.com/octo/widgets/commit/a1b2c3d4",
      "commit": { "message": "Fix widget", "author": { "date": "2025-11-14T10:00:00Z" } },
      "author": { "login": "octo" },
      "repository": { "full_name": "octo/widgets" }
    }]})
  }

  fn pr_items(number: u64, created: &str, updated: &str) -> serde_json::Value {
    serde_json::json!({"items": [{
      "number": number,
      "title": "Add widget",
      "state": "open",
      "created_at": created,
      "updated_at": updated,
      "html_url": format!("https://github.com/octo/widgets/pull/{}", number),
      "repository_url": "https://api.github.com/repos/octo/widgets",
      "user": { "login": "octo" }
    }]})
  }

  #[test]
  fn commit_pr_review_scenario() {
    let t = Arc::new(ScriptedTransport::new());
    t.stub("search/commits", Ok(page(commit_items(), 100, 0)));
    t.stub(
      "type:pr created:",
      Ok(page(pr_items(41, "2025-11-15T10:00:00Z", "2025-11-15T10:00:00Z"), 99, 0)),
    );
    t.stub(
      "reviewed-by:octo",
      Ok(page(pr_items(41, "2025-11-15T10:00:00Z", "2025-11-16T10:00:00Z"), 98, 0)),
    );

    let c = client(t);
    let model = generate_report("octo", window(), &c).unwrap();

    assert_eq!(model.totals[&ActivityCategory::Commit], 1);
    assert_eq!(model.totals[&ActivityCategory::PrOpened], 1);
    assert_eq!(model.totals[&ActivityCategory::PrReviewed], 1);
    assert_eq!(model.totals[&ActivityCategory::IssueOpened], 0);
    assert_eq!(model.events.len(), 3);
    assert!(model.events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(model.events[0].category, ActivityCategory::Commit);
    assert_eq!(model.events[2].category, ActivityCategory::PrReviewed);
    assert!(model.warnings.is_empty());
  }

  #[test]
  fn partial_failure_degrades_to_warning() {
    let t = Arc::new(ScriptedTransport::new());
    t.stub("search/commits", Ok(page(commit_items(), 100, 0)));
    for _ in 0..4 {
      t.stub("type:issue is:closed", Ok(with_status(503, serde_json::Value::Null, 90, 0)));
    }

    let c = client(t);
    let model = generate_report("octo", window(), &c).unwrap();

    assert_eq!(model.totals[&ActivityCategory::IssueClosed], 0);
    assert_eq!(model.totals[&ActivityCategory::Commit], 1);
    let matching: Vec<&String> = model.warnings.iter().filter(|w| w.contains("issues closed")).collect();
    assert_eq!(matching.len(), 1);
  }

  #[test]
  fn auth_failure_aborts_whole_run() {
    let t = Arc::new(ScriptedTransport::new());
    t.stub(
      "search/commits",
      Ok(with_status(401, serde_json::json!({"message": "Bad credentials"}), 100, 0)),
    );

    let c = client(t);
    let err = generate_report("octo", window(), &c).unwrap_err();
    assert!(matches!(err, ReportError::Authentication(_)));
    assert!(c.is_aborted());
  }

  #[test]
  fn all_categories_failing_still_yields_empty_report() {
    let t = Arc::new(ScriptedTransport::new());
    for key in [
      "search/commits",
      "type:pr created:",
      "type:pr is:merged",
      "reviewed-by:octo",
      "type:issue created:",
      "type:issue is:closed",
      "commenter:octo",
    ] {
      for _ in 0..4 {
        t.stub(key, Ok(with_status(500, serde_json::Value::Null, 90, 0)));
      }
    }

    let c = client(t);
    let model = generate_report("octo", window(), &c).unwrap();
    assert!(model.is_empty());
    assert_eq!(model.warnings.len(), 7, "emptiness is explained per category");
    assert!(model.totals.values().all(|&v| v == 0));
  }

  #[test]
  fn duplicate_records_across_pages_are_deduplicated() {
    let t = Arc::new(ScriptedTransport::new());
    // The same PR twice in one response: one event survives.
    let mut body = pr_items(41, "2025-11-15T10:00:00Z", "2025-11-15T10:00:00Z");
    let dup = body["items"][0].clone();
    body["items"].as_array_mut().unwrap().push(dup);
    t.stub("type:pr created:", Ok(page(body, 99, 0)));

    let c = client(t);
    let model = generate_report("octo", window(), &c).unwrap();
    assert_eq!(model.totals[&ActivityCategory::PrOpened], 1);
  }
}
