use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::render::Format;
use crate::util;
use crate::window::Period;

#[derive(Parser, Debug)]
#[command(
    name = "github-activity-report",
    version,
    about = "Generate a GitHub activity report for a developer over a time window",
    long_about = None
)]
pub struct Cli {
  /// GitHub username to report on (default: env GITHUB_USERNAME)
  #[arg(long, short = 'u')]
  pub username: Option<String>,

  /// GitHub API token (default: env GITHUB_TOKEN, GH_TOKEN, or `gh auth token`)
  #[arg(long, short = 't')]
  pub token: Option<String>,

  /// Named time period ending now
  #[arg(long, short = 'p', value_enum)]
  pub period: Option<Period>,

  /// Exact day count; overrides --period
  #[arg(long, short = 'd')]
  pub days: Option<i64>,

  /// Report format
  #[arg(long, short = 'f', value_enum, default_value_t = Format::Markdown)]
  pub format: Format,

  /// Output file path (default stdout "-")
  #[arg(long, short = 'o', default_value = "-")]
  pub output: String,

  /// Company name for the report footer
  #[arg(long, default_value = "your company")]
  pub company: String,

  /// Verify the connection and token, then exit
  #[arg(long)]
  pub test: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant anchoring the window (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub username: String,
  pub token: String,
  pub period: Option<Period>,
  pub days: Option<i64>,
  pub format: Format,
  pub out: String,
  pub company: String,
  pub test: bool,
  pub now_override: Option<String>,
}

/// Resolve flags and environment into a runnable configuration.
/// Credentials must come from somewhere; everything else has defaults.
pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let username = match cli.username.or_else(util::discover_username) {
    Some(u) if !u.trim().is_empty() => u,
    _ => {
      return Err(ReportError::InvalidInput("username required: pass --username or set GITHUB_USERNAME".into()).into());
    }
  };

  let token = match cli.token.or_else(util::discover_token) {
    Some(t) if !t.trim().is_empty() => t,
    _ => {
      return Err(
        ReportError::InvalidInput("token required: pass --token, set GITHUB_TOKEN, or run `gh auth login`".into())
          .into(),
      );
    }
  };

  Ok(EffectiveConfig {
    username,
    token,
    period: cli.period,
    days: cli.days,
    format: cli.format,
    out: cli.output,
    company: cli.company,
    test: cli.test,
    now_override: cli.now_override,
  })
}
