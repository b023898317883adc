// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Map raw per-endpoint records onto the unified ActivityEvent shape via the descriptor table
// role: pipeline/normalizer
// inputs: EndpointKind + raw serde_json records + target username + TimeWindow
// outputs: ActivityEvents inside the window, plus warnings for records skipped over malformed data
// invariants:
// - A malformed timestamp skips that record with a warning, never a hard failure
// - Records not performed by the target user are discarded silently
// - Emitted timestamps always fall within the queried window
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::ext::serde_json::JsonFetch;
use crate::github::endpoints::{descriptor, Descriptor, EndpointKind};
use crate::model::{ActivityEvent, TimeWindow};

/// Outcome of normalizing one raw record.
#[derive(Debug)]
pub enum Normalized {
  Event(ActivityEvent),
  /// Record skipped over malformed data; the string lands in the report
  /// warnings.
  Skipped(String),
  /// Silently dropped: foreign author or outside the window.
  Discarded,
}

/// Normalize one raw record from `kind` into the unified event shape.
pub fn normalize(kind: EndpointKind, record: &serde_json::Value, username: &str, window: &TimeWindow) -> Normalized {
  let desc = descriptor(kind);

  let identifier = match extract_identifier(desc, record) {
    Some(id) => id,
    None => {
      return Normalized::Skipped(format!("{}: record without identifier skipped", desc.category.label()));
    }
  };

  let timestamp = match extract_timestamp(desc, record) {
    Ok(ts) => ts,
    Err(raw) => {
      return Normalized::Skipped(format!(
        "{}: malformed timestamp {:?} on {}, record skipped",
        desc.category.label(),
        raw,
        identifier
      ));
    }
  };

  if !window.contains(timestamp) {
    return Normalized::Discarded;
  }

  // Broad search matching can return foreign records; compare the
  // performer when the payload carries one. Reviewed-by/commenter
  // payloads do not, there the search qualifier is the attribution.
  let author = match desc.author_path {
    Some(path) => match record.fetch(path).to::<String>() {
      Some(login) if login.eq_ignore_ascii_case(username) => login,
      Some(_) => return Normalized::Discarded,
      None => username.to_string(),
    },
    None => username.to_string(),
  };

  let repository = extract_repository(record).unwrap_or_else(|| "unknown".to_string());

  let mut metadata = BTreeMap::new();

  if let Some(title) = record.fetch(desc.title_path).to::<String>() {
    // Commit messages arrive whole; only the subject line is a title.
    if let Some(first) = title.lines().next() {
      metadata.insert("title".to_string(), first.to_string());
    }
  }
  if let Some(url) = record.fetch(desc.url_path).to::<String>() {
    metadata.insert("url".to_string(), url);
  }
  if let Some(path) = desc.state_path {
    if let Some(state) = record.fetch(path).to::<String>() {
      metadata.insert("state".to_string(), state);
    }
  }

  Normalized::Event(ActivityEvent {
    category: desc.category,
    repository,
    identifier,
    timestamp,
    author,
    metadata,
  })
}

/// Normalize a whole record batch, splitting events from warnings.
pub fn normalize_all(
  kind: EndpointKind,
  records: &[serde_json::Value],
  username: &str,
  window: &TimeWindow,
) -> (Vec<ActivityEvent>, Vec<String>) {
  let mut events = Vec::with_capacity(records.len());
  let mut warnings = Vec::new();

  for record in records {
    match normalize(kind, record, username, window) {
      Normalized::Event(ev) => events.push(ev),
      Normalized::Skipped(w) => warnings.push(w),
      Normalized::Discarded => {}
    }
  }

  (events, warnings)
}

fn extract_identifier(desc: &Descriptor, record: &serde_json::Value) -> Option<String> {
  let fetched = record.fetch(desc.identifier_path);

  fetched
    .to::<String>()
    .or_else(|| fetched.to::<i64>().map(|n| n.to_string()))
    .filter(|s| !s.is_empty())
}

fn extract_timestamp(desc: &Descriptor, record: &serde_json::Value) -> std::result::Result<DateTime<Utc>, String> {
  let raw = record.fetch(desc.timestamp_path).to::<String>().unwrap_or_default();

  chrono::DateTime::parse_from_rfc3339(&raw)
    .map(|ts| ts.with_timezone(&Utc))
    .map_err(|_| raw)
}

/// Repository full name. Commit-search records carry it inline; issue
/// search records only carry `repository_url`
/// (".../repos/{owner}/{name}").
fn extract_repository(record: &serde_json::Value) -> Option<String> {
  if let Some(full) = record.fetch("repository.full_name").to::<String>() {
    return Some(full);
  }

  let url = record.fetch("repository_url").to::<String>()?;
  let mut tail = url.rsplit('/');
  let name = tail.next()?;
  let owner = tail.next()?;

  if name.is_empty() || owner.is_empty() {
    return None;
  }
  Some(format!("{}/{}", owner, name))
}
