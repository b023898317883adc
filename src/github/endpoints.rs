// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Static per-endpoint descriptor table mapping the 7 query kinds onto GitHub search requests
// role: github/endpoints
// outputs: EndpointKind enum and Descriptor entries (path, qualifiers, JSON field paths, category)
// invariants: Exactly one descriptor per kind; the table is the only per-endpoint logic in the crate
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::SecondsFormat;
use once_cell::sync::Lazy;

use crate::model::{ActivityCategory, TimeWindow};

pub const API_BASE: &str = "https://api.github.com";

/// The seven logical queries the pipeline issues, one per activity
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
  Commits,
  PullsOpened,
  PullsMerged,
  PullReviews,
  IssuesOpened,
  IssuesClosed,
  Comments,
}

impl EndpointKind {
  pub const ALL: [EndpointKind; 7] = [
    EndpointKind::Commits,
    EndpointKind::PullsOpened,
    EndpointKind::PullsMerged,
    EndpointKind::PullReviews,
    EndpointKind::IssuesOpened,
    EndpointKind::IssuesClosed,
    EndpointKind::Comments,
  ];
}

/// How the search query scopes records to the target user. Records from
/// `ReviewedBy`/`Commenter` searches do not carry the performer in the
/// payload; the qualifier itself is the attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScope {
  Author,
  ReviewedBy,
  Commenter,
}

impl UserScope {
  fn qualifier(&self, username: &str) -> String {
    match self {
      UserScope::Author => format!("author:{}", username),
      UserScope::ReviewedBy => format!("reviewed-by:{}", username),
      UserScope::Commenter => format!("commenter:{}", username),
    }
  }
}

/// Everything endpoint-specific about one query kind. All other modules
/// stay schema-agnostic by reading record fields through these paths.
#[derive(Debug)]
pub struct Descriptor {
  pub kind: EndpointKind,
  pub category: ActivityCategory,
  /// API path under `API_BASE`, e.g. "search/issues".
  pub path: &'static str,
  /// Fixed search qualifiers beyond user and date, e.g. "type:pr is:merged".
  pub qualifiers: &'static str,
  pub scope: UserScope,
  /// Search qualifier name for the window range, e.g. "created".
  pub date_field: &'static str,
  /// `sort` request parameter; results must come back newest-first for
  /// the pagination early-exit to hold.
  pub sort: &'static str,
  /// Dotted path of the unique identifier within a record.
  pub identifier_path: &'static str,
  /// Dotted path of the record's canonical timestamp.
  pub timestamp_path: &'static str,
  /// Dotted path of the performer's login, when the payload carries one.
  pub author_path: Option<&'static str>,
  pub title_path: &'static str,
  pub url_path: &'static str,
  pub state_path: Option<&'static str>,
}

impl Descriptor {
  pub fn url(&self) -> String {
    format!("{}/{}", API_BASE, self.path)
  }

  /// Full search expression for one user and window.
  pub fn search_query(&self, username: &str, window: &TimeWindow) -> String {
    let start = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);
    let end = window.end.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut q = self.scope.qualifier(username);

    if !self.qualifiers.is_empty() {
      q.push(' ');
      q.push_str(self.qualifiers);
    }
    q.push_str(&format!(" {}:{}..{}", self.date_field, start, end));

    q
  }
}

static TABLE: Lazy<Vec<Descriptor>> = Lazy::new(|| {
  vec![
    Descriptor {
      kind: EndpointKind::Commits,
      category: ActivityCategory::Commit,
      path: "search/commits",
      qualifiers: "",
      scope: UserScope::Author,
      date_field: "committer-date",
      sort: "committer-date",
      identifier_path: "sha",
      timestamp_path: "commit.author.date",
      author_path: Some("author.login"),
      title_path: "commit.message",
      url_path: "html_url",
      state_path: None,
    },
    Descriptor {
      kind: EndpointKind::PullsOpened,
      category: ActivityCategory::PrOpened,
      path: "search/issues",
      qualifiers: "type:pr",
      scope: UserScope::Author,
      date_field: "created",
      sort: "created",
      identifier_path: "number",
      timestamp_path: "created_at",
      author_path: Some("user.login"),
      title_path: "title",
      url_path: "html_url",
      state_path: Some("state"),
    },
    Descriptor {
      kind: EndpointKind::PullsMerged,
      category: ActivityCategory::PrMerged,
      path: "search/issues",
      qualifiers: "type:pr is:merged",
      scope: UserScope::Author,
      date_field: "merged",
      sort: "updated",
      identifier_path: "number",
      timestamp_path: "pull_request.merged_at",
      author_path: Some("user.login"),
      title_path: "title",
      url_path: "html_url",
      state_path: Some("state"),
    },
    Descriptor {
      kind: EndpointKind::PullReviews,
      category: ActivityCategory::PrReviewed,
      path: "search/issues",
      qualifiers: "type:pr",
      scope: UserScope::ReviewedBy,
      date_field: "updated",
      sort: "updated",
      identifier_path: "number",
      timestamp_path: "updated_at",
      author_path: None,
      title_path: "title",
      url_path: "html_url",
      state_path: Some("state"),
    },
    Descriptor {
      kind: EndpointKind::IssuesOpened,
      category: ActivityCategory::IssueOpened,
      path: "search/issues",
      qualifiers: "type:issue",
      scope: UserScope::Author,
      date_field: "created",
      sort: "created",
      identifier_path: "number",
      timestamp_path: "created_at",
      author_path: Some("user.login"),
      title_path: "title",
      url_path: "html_url",
      state_path: Some("state"),
    },
    Descriptor {
      kind: EndpointKind::IssuesClosed,
      category: ActivityCategory::IssueClosed,
      path: "search/issues",
      qualifiers: "type:issue is:closed",
      scope: UserScope::Author,
      date_field: "closed",
      sort: "updated",
      identifier_path: "number",
      timestamp_path: "closed_at",
      author_path: Some("user.login"),
      title_path: "title",
      url_path: "html_url",
      state_path: Some("state"),
    },
    Descriptor {
      kind: EndpointKind::Comments,
      category: ActivityCategory::Comment,
      path: "search/issues",
      qualifiers: "",
      scope: UserScope::Commenter,
      date_field: "updated",
      sort: "updated",
      identifier_path: "number",
      timestamp_path: "updated_at",
      author_path: None,
      title_path: "title",
      url_path: "html_url",
      state_path: Some("state"),
    },
  ]
});

pub fn descriptor(kind: EndpointKind) -> &'static Descriptor {
  TABLE
    .iter()
    .find(|d| d.kind == kind)
    .expect("descriptor table covers every endpoint kind")
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};

  fn window() -> TimeWindow {
    TimeWindow {
      start: Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap(),
      end: Utc.with_ymd_and_hms(2025, 11, 17, 0, 0, 0).unwrap(),
    }
  }

  #[test]
  fn table_covers_all_kinds_and_categories() {
    let mut categories: Vec<ActivityCategory> = EndpointKind::ALL.iter().map(|k| descriptor(*k).category).collect();
    categories.sort();
    categories.dedup();
    assert_eq!(categories.len(), 7, "each kind maps to a distinct category");
  }

  #[test]
  fn commit_query_uses_committer_date_range() {
    let q = descriptor(EndpointKind::Commits).search_query("octo", &window());
    assert_eq!(q, "author:octo committer-date:2025-11-10T00:00:00Z..2025-11-17T00:00:00Z");
  }

  #[test]
  fn merged_query_carries_fixed_qualifiers() {
    let q = descriptor(EndpointKind::PullsMerged).search_query("octo", &window());
    assert!(q.starts_with("author:octo type:pr is:merged merged:"));
  }

  #[test]
  fn review_and_comment_scopes_have_no_author_path() {
    let reviews = descriptor(EndpointKind::PullReviews);
    assert_eq!(reviews.scope, UserScope::ReviewedBy);
    assert!(reviews.author_path.is_none());
    assert!(reviews.search_query("octo", &window()).starts_with("reviewed-by:octo "));

    let comments = descriptor(EndpointKind::Comments);
    assert_eq!(comments.scope, UserScope::Commenter);
    assert!(comments.author_path.is_none());
    assert!(comments.search_query("octo", &window()).starts_with("commenter:octo "));
  }

  #[test]
  fn urls_point_at_search_api() {
    assert_eq!(descriptor(EndpointKind::Commits).url(), "https://api.github.com/search/commits");
    assert_eq!(
      descriptor(EndpointKind::IssuesOpened).url(),
      "https://api.github.com/search/issues"
    );
  }
}
