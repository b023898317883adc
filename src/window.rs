use chrono::{DateTime, Duration, Local, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::model::TimeWindow;

// Windowing-related types live here to keep main focused.

/// Named time-period presets and the day counts they resolve to.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum Period {
  Day,
  #[value(name = "3days")]
  #[serde(rename = "3days")]
  ThreeDays,
  Week,
  #[value(name = "2weeks")]
  #[serde(rename = "2weeks")]
  TwoWeeks,
  Month,
}

impl Period {
  pub fn days(&self) -> i64 {
    match self {
      Period::Day => 1,
      Period::ThreeDays => 3,
      Period::Week => 7,
      Period::TwoWeeks => 14,
      Period::Month => 30,
    }
  }
}

/// Effective day count: explicit `--days` wins over a preset; neither
/// means one week.
pub fn effective_days(preset: Option<Period>, days: Option<i64>) -> i64 {
  days.or_else(|| preset.map(|p| p.days())).unwrap_or(7)
}

/// Resolve a preset or day count into an absolute `[start, end)` window
/// ending at `now`.
pub fn resolve(preset: Option<Period>, days: Option<i64>, now: DateTime<Utc>) -> Result<TimeWindow> {
  let d = effective_days(preset, days);

  if d <= 0 {
    return Err(ReportError::InvalidWindow(d));
  }

  Ok(TimeWindow {
    start: now - Duration::days(d),
    end: now,
  })
}

/// Parse a `--now-override` string into a UTC instant. Accepts RFC3339
/// (e.g. 2025-08-15T12:00:00Z) or a naive timestamp `%Y-%m-%dT%H:%M:%S`
/// interpreted as local time.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Utc>> {
  s.and_then(|raw| {
    chrono::DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Utc))
      .or_else(|| {
        chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .and_then(|ndt| ndt.and_local_timezone(Local).single())
          .map(|dt| dt.with_timezone(&Utc))
      })
  })
}

/// Effective "now" given an optional override. Centralizes test
/// determinism without sprinkling `Utc::now()` throughout the code.
pub fn effective_now(override_now: Option<DateTime<Utc>>) -> DateTime<Utc> {
  override_now.unwrap_or_else(Utc::now)
}
