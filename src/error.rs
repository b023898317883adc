use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Failure taxonomy for the report pipeline.
///
/// Fatal kinds (`InvalidWindow`, `InvalidInput`, `Authentication`,
/// `RateLimited`) abort the run and surface to the caller unmodified.
/// `TransientQuery` is absorbed into the report's warnings after retries
/// are exhausted; the run continues with the remaining categories.
#[derive(Error, Debug)]
pub enum ReportError {
  #[error("invalid time window: day count must be positive, got {0}")]
  InvalidWindow(i64),

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("authentication failed: {0}")]
  Authentication(String),

  #[error("rate limit exhausted; resets at {reset}")]
  RateLimited { reset: DateTime<Utc> },

  #[error("query for {category} failed after retries: {message}")]
  TransientQuery { category: String, message: String },

  #[error("http error: {0}")]
  Http(String),
}

impl ReportError {
  /// Whether this error must abort the whole run rather than degrade to a
  /// per-category warning.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, ReportError::TransientQuery { .. } | ReportError::Http(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fatal_classification() {
    assert!(ReportError::InvalidWindow(0).is_fatal());
    assert!(ReportError::Authentication("401".into()).is_fatal());
    assert!(ReportError::RateLimited { reset: Utc::now() }.is_fatal());
    assert!(!ReportError::TransientQuery {
      category: "commits".into(),
      message: "503".into(),
    }
    .is_fatal());
  }

  #[test]
  fn messages_name_the_failure() {
    let e = ReportError::TransientQuery {
      category: "issues closed".into(),
      message: "timeout".into(),
    };
    let msg = e.to_string();
    assert!(msg.contains("issues closed"));
    assert!(msg.contains("timeout"));
  }
}
