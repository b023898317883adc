// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Pure ReportModel-to-string renderers for markdown, plain text and html
// role: presentation/render
// inputs: ReportModel + company footer string
// outputs: Complete report documents; no I/O, no mutation of the model
// invariants: Renderers never fail; missing metadata degrades to placeholders; commits capped at 20 per repository
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{ActivityCategory, ActivityEvent, ReportModel};

const COMMITS_PER_REPO_CAP: usize = 20;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Format {
  Markdown,
  Text,
  Html,
}

/// Render the report in the requested format. Pure function of the model.
pub fn render(model: &ReportModel, format: Format, company: &str) -> String {
  match format {
    Format::Markdown => render_markdown(model, company),
    Format::Text => render_text(model, company),
    Format::Html => render_html(model, company),
  }
}

fn day(ts: DateTime<Utc>) -> String {
  ts.format("%B %d, %Y").to_string()
}

fn stamp(ts: DateTime<Utc>) -> String {
  ts.format("%b %d, %Y at %H:%M").to_string()
}

fn of_category<'a>(model: &'a ReportModel, cat: ActivityCategory) -> Vec<&'a ActivityEvent> {
  model.events.iter().filter(|e| e.category == cat).collect()
}

fn summary_rows(model: &ReportModel) -> Vec<(&'static str, u64)> {
  vec![
    ("Total Commits", model.totals[&ActivityCategory::Commit]),
    ("Pull Requests Opened", model.totals[&ActivityCategory::PrOpened]),
    ("Pull Requests Merged", model.totals[&ActivityCategory::PrMerged]),
    ("Pull Requests Reviewed", model.totals[&ActivityCategory::PrReviewed]),
    ("Issues Opened", model.totals[&ActivityCategory::IssueOpened]),
    ("Issues Closed", model.totals[&ActivityCategory::IssueClosed]),
    ("Comments Made", model.totals[&ActivityCategory::Comment]),
  ]
}

// --- markdown ---

fn render_markdown(model: &ReportModel, company: &str) -> String {
  let mut out: Vec<String> = vec![
    "# GitHub Activity Report".into(),
    format!("\n**Developer:** {}", model.developer),
    format!(
      "**Period:** {} - {}",
      day(model.window.start),
      day(model.window.end)
    ),
    format!("**Generated:** {}", stamp(model.generated_at)),
    "\n---\n".into(),
    "## Executive Summary\n".into(),
  ];

  for (label, count) in summary_rows(model) {
    out.push(format!("- **{}:** {}", label, count));
  }
  out.push(format!(
    "- **Active Repositories:** {}",
    model.active_repositories().len()
  ));

  let repos = model.active_repositories();
  if !repos.is_empty() {
    out.push("\n## Active Repositories\n".into());
    for repo in &repos {
      out.push(format!("- `{}`", repo));
    }
  }

  let commits = of_category(model, ActivityCategory::Commit);
  if !commits.is_empty() {
    out.push("\n## Commits\n".into());
    let mut by_repo: BTreeMap<&str, Vec<&ActivityEvent>> = BTreeMap::new();
    for c in commits.iter().copied() {
      by_repo.entry(c.repository.as_str()).or_default().push(c);
    }
    for (repo, repo_commits) in by_repo {
      out.push(format!("\n### {}", repo));
      for c in repo_commits.iter().take(COMMITS_PER_REPO_CAP) {
        let short: String = c.identifier.chars().take(7).collect();
        out.push(format!(
          "- `{}` {} *({})*",
          short,
          c.title().unwrap_or("(no message)"),
          c.timestamp.format("%b %d, %H:%M")
        ));
      }
    }
  }

  push_markdown_items(&mut out, "\n## Pull Requests\n", "PR", &[
    (of_category(model, ActivityCategory::PrOpened), "Opened", "\u{1F7E2}"),
    (of_category(model, ActivityCategory::PrMerged), "Merged", "\u{1F7E3}"),
  ]);
  push_markdown_items(&mut out, "\n## Issues\n", "Issue", &[
    (of_category(model, ActivityCategory::IssueOpened), "Opened", "\u{1F535}"),
    (of_category(model, ActivityCategory::IssueClosed), "Closed", "\u{2705}"),
  ]);

  let reviews = of_category(model, ActivityCategory::PrReviewed);
  if !reviews.is_empty() {
    out.push("\n## Code Reviews\n".into());
    for r in &reviews {
      out.push(format!(
        "- Reviewed PR #{}: {}",
        r.identifier,
        r.title().unwrap_or("(untitled)")
      ));
      out.push(format!("  - Repository: `{}`", r.repository));
      out.push(format!("  - Date: {}\n", stamp(r.timestamp)));
    }
  }

  if !model.warnings.is_empty() {
    out.push("\n## Warnings\n".into());
    for w in &model.warnings {
      out.push(format!("- {}", w));
    }
  }

  out.push("\n---\n".into());
  out.push(format!("\n*Report generated automatically for {}*", company));

  out.join("\n")
}

fn push_markdown_items(
  out: &mut Vec<String>,
  heading: &str,
  kind: &str,
  groups: &[(Vec<&ActivityEvent>, &str, &str)],
) {
  if groups.iter().all(|(items, _, _)| items.is_empty()) {
    return;
  }
  out.push(heading.to_string());

  for (items, action, emoji) in groups {
    for item in items {
      out.push(format!(
        "{} **{}** {} #{}: {}",
        emoji,
        action,
        kind,
        item.identifier,
        item.title().unwrap_or("(untitled)")
      ));
      out.push(format!("   - Repository: `{}`", item.repository));
      out.push(format!("   - Date: {}\n", stamp(item.timestamp)));
    }
  }
}

// --- plain text ---

fn render_text(model: &ReportModel, company: &str) -> String {
  let rule_eq = "=".repeat(70);
  let rule_dash = "-".repeat(70);
  let mut out: Vec<String> = vec![
    rule_eq.clone(),
    "GITHUB ACTIVITY REPORT".into(),
    rule_eq.clone(),
    format!("\nDeveloper: {}", model.developer),
    format!(
      "Period: {} - {}",
      day(model.window.start),
      day(model.window.end)
    ),
    format!("Generated: {}", stamp(model.generated_at)),
    format!("\n{}", rule_dash),
    "\nEXECUTIVE SUMMARY".into(),
    rule_dash.clone(),
  ];

  for (label, count) in summary_rows(model) {
    out.push(format!("{}: {}", label, count));
  }
  out.push(format!("Active Repositories: {}", model.active_repositories().len()));

  let repos = model.active_repositories();
  if !repos.is_empty() {
    out.push(format!("\n{}", rule_dash));
    out.push("ACTIVE REPOSITORIES".into());
    out.push(rule_dash.clone());
    for repo in &repos {
      out.push(format!("  - {}", repo));
    }
  }

  if !model.warnings.is_empty() {
    out.push(format!("\n{}", rule_dash));
    out.push("WARNINGS".into());
    out.push(rule_dash.clone());
    for w in &model.warnings {
      out.push(format!("  - {}", w));
    }
  }

  out.push(format!("\n{}", rule_eq));
  out.push(format!("Report generated for {}", company));
  out.push(rule_eq);

  out.join("\n")
}

// --- html ---

fn html_escape(raw: &str) -> String {
  raw
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

fn render_html(model: &ReportModel, company: &str) -> String {
  let mut metrics = String::new();
  for (label, count) in summary_rows(model) {
    metrics.push_str(&format!(
      "\n            <div class=\"metric\">\n                <div class=\"metric-value\">{}</div>\n                <div class=\"metric-label\">{}</div>\n            </div>",
      count, label
    ));
  }
  metrics.push_str(&format!(
    "\n            <div class=\"metric\">\n                <div class=\"metric-value\">{}</div>\n                <div class=\"metric-label\">Active Repos</div>\n            </div>",
    model.active_repositories().len()
  ));

  let repos_html = model
    .active_repositories()
    .iter()
    .map(|r| format!("&bull; {}", html_escape(r)))
    .collect::<Vec<_>>()
    .join("<br>");

  let warnings_html = if model.warnings.is_empty() {
    String::new()
  } else {
    let items = model
      .warnings
      .iter()
      .map(|w| format!("<li>{}</li>", html_escape(w)))
      .collect::<Vec<_>>()
      .join("\n");
    format!("\n        <h2>Warnings</h2>\n        <ul>{}</ul>", items)
  };

  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>GitHub Activity Report</title>
    <style>{styles}</style>
</head>
<body>
    <div class="container">
        <h1>GitHub Activity Report</h1>
        <div class="meta">
            <p><strong>Developer:</strong> {developer}</p>
            <p><strong>Period:</strong> {start} - {end}</p>
            <p><strong>Generated:</strong> {generated}</p>
        </div>
        <h2>Executive Summary</h2>
        <div class="summary">{metrics}
        </div>
        <h2>Active Repositories</h2>
        <div class="repo-list">{repos}</div>{warnings}
        <div class="footer">Report generated automatically for {company}</div>
    </div>
</body>
</html>"#,
    styles = HTML_STYLES,
    developer = html_escape(&model.developer),
    start = day(model.window.start),
    end = day(model.window.end),
    generated = stamp(model.generated_at),
    metrics = metrics,
    repos = repos_html,
    warnings = warnings_html,
    company = html_escape(company),
  )
}

const HTML_STYLES: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            line-height: 1.6;
            max-width: 900px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f5f5f5;
        }
        .container {
            background: white;
            padding: 30px;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
        }
        h1 {
            color: #24292e;
            border-bottom: 3px solid #0366d6;
            padding-bottom: 10px;
        }
        h2 {
            color: #0366d6;
            margin-top: 30px;
        }
        .meta {
            color: #586069;
            margin-bottom: 20px;
        }
        .summary {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 15px;
            margin: 20px 0;
        }
        .metric {
            background: #f6f8fa;
            padding: 15px;
            border-radius: 6px;
            border-left: 4px solid #0366d6;
        }
        .metric-value {
            font-size: 24px;
            font-weight: bold;
            color: #24292e;
        }
        .metric-label {
            font-size: 12px;
            color: #586069;
            text-transform: uppercase;
        }
        .repo-list {
            background: #f6f8fa;
            padding: 15px;
            border-radius: 6px;
            font-family: 'Courier New', monospace;
        }
        .footer {
            margin-top: 30px;
            padding-top: 20px;
            border-top: 2px solid #e1e4e8;
            text-align: center;
            color: #586069;
            font-style: italic;
        }
"#;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{ReportModel, TimeWindow};
  use chrono::TimeZone;
  use std::collections::BTreeMap;

  fn model() -> ReportModel {
    let window = TimeWindow {
      start: Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap(),
      end: Utc.with_ymd_and_hms(2025, 11, 17, 0, 0, 0).unwrap(),
    };
    let mk = |cat, id: &str, title: &str, day| {
      let mut metadata = BTreeMap::new();
      metadata.insert("title".to_string(), title.to_string());
      ActivityEvent {
        category: cat,
        repository: "octo/widgets".into(),
        identifier: id.into(),
        timestamp: Utc.with_ymd_and_hms(2025, 11, day, 9, 0, 0).unwrap(),
        author: "octo".into(),
        metadata,
      }
    };
    let events = vec![
      mk(ActivityCategory::Commit, "a1b2c3d4e5f6", "Fix widget", 14),
      mk(ActivityCategory::PrOpened, "41", "Add widget", 15),
      mk(ActivityCategory::PrReviewed, "41", "Add widget", 16),
    ];
    let mut totals = BTreeMap::new();
    totals.insert(ActivityCategory::Commit, 1);
    totals.insert(ActivityCategory::PrOpened, 1);
    totals.insert(ActivityCategory::PrReviewed, 1);
    ReportModel::build("octo", window, totals, events, vec!["issues closed: query abandoned".into()]).unwrap()
  }

  #[test]
  fn markdown_has_expected_sections() {
    let md = render(&model(), Format::Markdown, "Acme");
    assert!(md.starts_with("# GitHub Activity Report"));
    assert!(md.contains("**Developer:** octo"));
    assert!(md.contains("- **Total Commits:** 1"));
    assert!(md.contains("## Active Repositories"));
    assert!(md.contains("`octo/widgets`"));
    assert!(md.contains("### octo/widgets"));
    assert!(md.contains("`a1b2c3d`"), "commit shas are shortened");
    assert!(md.contains("Reviewed PR #41"));
    assert!(md.contains("## Warnings"));
    assert!(md.contains("*Report generated automatically for Acme*"));
  }

  #[test]
  fn text_has_summary_block() {
    let txt = render(&model(), Format::Text, "Acme");
    assert!(txt.contains("GITHUB ACTIVITY REPORT"));
    assert!(txt.contains("Total Commits: 1"));
    assert!(txt.contains("Pull Requests Reviewed: 1"));
    assert!(txt.contains("Active Repositories: 1"));
    assert!(txt.contains("WARNINGS"));
    assert!(txt.contains("Report generated for Acme"));
  }

  #[test]
  fn html_is_escaped_and_complete() {
    let mut m = model();
    m.warnings.push("comments: <oops> & such".into());
    let html = render(&m, Format::Html, "Acme & Co");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("&lt;oops&gt; &amp; such"));
    assert!(html.contains("Acme &amp; Co"));
    assert!(html.contains("metric-value"));
    assert!(html.ends_with("</html>"));
  }

  #[test]
  fn empty_model_renders_without_detail_sections() {
    let window = TimeWindow {
      start: Utc.with_ymd_and_hms(2025, 11, 10, 0, 0, 0).unwrap(),
      end: Utc.with_ymd_and_hms(2025, 11, 17, 0, 0, 0).unwrap(),
    };
    let m = ReportModel::build("octo", window, BTreeMap::new(), vec![], vec![]).unwrap();
    let md = render(&m, Format::Markdown, "Acme");
    assert!(md.contains("- **Total Commits:** 0"));
    assert!(!md.contains("## Commits"));
    assert!(!md.contains("## Warnings"));
  }
}
