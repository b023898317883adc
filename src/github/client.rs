// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Paginated, rate-limited querying of one endpoint kind; policy for retries and fatal failures
// role: github/query-client
// inputs: EndpointKind + username + TimeWindow; Transport capability; rate-limit headers
// outputs: Raw record pages (newest-first) ready for normalization; ConnectionInfo for --test
// side_effects: Blocks on network I/O, backoff sleeps and rate-limit waits
// invariants:
// - Rate-limit state is one account-wide counter shared across concurrent category queries
// - Exhausted limit waits for reset and retries once; a second exhaustion is fatal
// - 5xx/transport failures retry 3 times with doubling backoff, then degrade to a category warning upstream
// - 401, and 403 without rate-limit exhaustion, are fatal authentication failures
// errors: ReportError variants per the taxonomy; non-fatal kinds carry the category label upstream
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{ReportError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::github::endpoints::{descriptor, Descriptor, EndpointKind, API_BASE};
use crate::github::transport::{Response, Transport};
use crate::model::TimeWindow;

/// GitHub caps search results at 1000 records; with 100 per page that is
/// ten pages, matching the original tool's page limit.
const MAX_PAGES: u32 = 10;
const MAX_TRANSIENT_RETRIES: u32 = 3;

/// Last-known account-wide rate-limit standing, fed from response headers.
#[derive(Debug, Default)]
struct RateState {
  remaining: Option<u32>,
  reset: Option<DateTime<Utc>>,
}

/// Issues the page requests for one logical query and applies the
/// rate-limit and retry policy. One client is shared by all category
/// queries in a run; the rate counter is account-wide.
pub struct QueryClient {
  transport: Arc<dyn Transport>,
  rate: Mutex<RateState>,
  aborted: AtomicBool,
  backoff_base: Duration,
  page_size: u32,
}

/// Result of the credential probe behind `--test`.
#[derive(Debug)]
pub struct ConnectionInfo {
  pub login: String,
  pub name: Option<String>,
  pub public_repos: i64,
  pub rate_remaining: Option<String>,
  pub rate_limit: Option<String>,
}

impl QueryClient {
  pub fn new(transport: Arc<dyn Transport>) -> Self {
    Self {
      transport,
      rate: Mutex::new(RateState::default()),
      aborted: AtomicBool::new(false),
      backoff_base: Duration::from_secs(1),
      page_size: 100,
    }
  }

  #[cfg(test)]
  pub fn with_backoff_base(mut self, base: Duration) -> Self {
    self.backoff_base = base;
    self
  }

  #[cfg(test)]
  pub fn with_page_size(mut self, size: u32) -> Self {
    self.page_size = size;
    self
  }

  /// Fatal-failure latch: once set, in-flight category queries stop
  /// issuing requests before their next page.
  pub fn abort(&self) {
    self.aborted.store(true, Ordering::SeqCst);
  }

  pub fn is_aborted(&self) -> bool {
    self.aborted.load(Ordering::SeqCst)
  }

  fn rate_guard(&self) -> MutexGuard<'_, RateState> {
    self.rate.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  fn observe_rate(&self, resp: &Response) {
    let mut rate = self.rate_guard();

    if let Some(rem) = resp.header("x-ratelimit-remaining").and_then(|v| v.parse::<u32>().ok()) {
      rate.remaining = Some(rem);
    }
    if let Some(reset) = resp
      .header("x-ratelimit-reset")
      .and_then(|v| v.parse::<i64>().ok())
      .and_then(|epoch| Utc.timestamp_opt(epoch, 0).single())
    {
      rate.reset = Some(reset);
    }
  }

  /// Block until the reported reset when the shared counter is exhausted.
  /// The second exhaustion within one page request is fatal.
  fn wait_for_rate_budget(&self, waits_so_far: &mut u32) -> Result<()> {
    let (exhausted, reset) = {
      let rate = self.rate_guard();
      (rate.remaining == Some(0), rate.reset)
    };

    if !exhausted {
      return Ok(());
    }

    let reset = reset.unwrap_or_else(Utc::now);

    if *waits_so_far >= 1 {
      return Err(ReportError::RateLimited { reset });
    }
    *waits_so_far += 1;

    let pause = (reset - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    warn!(reset = %reset, pause_secs = pause.as_secs(), "rate limit exhausted; waiting for reset");
    std::thread::sleep(pause);

    // Allow the retried request through; the next response re-populates
    // the counter.
    self.rate_guard().remaining = None;

    Ok(())
  }

  /// One page request with the full policy applied: rate budget, retry
  /// with backoff on transient failures, classification of fatal statuses.
  fn fetch_page(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
    let mut rate_waits = 0u32;
    let mut transient_attempts = 0u32;

    loop {
      if self.is_aborted() {
        return Err(ReportError::Http("run aborted".into()));
      }

      self.wait_for_rate_budget(&mut rate_waits)?;

      let outcome = self.transport.fetch(url, query);

      let resp = match outcome {
        Ok(resp) => resp,
        Err(err) => {
          if transient_attempts >= MAX_TRANSIENT_RETRIES {
            return Err(err);
          }
          self.backoff(transient_attempts, &err.to_string());
          transient_attempts += 1;
          continue;
        }
      };

      self.observe_rate(&resp);

      match resp.status {
        s if resp.is_success() => {
          debug!(url, status = s, "page fetched");
          return Ok(resp);
        }
        401 => {
          return Err(ReportError::Authentication(format!(
            "status 401 from {}: check the token",
            url
          )))
        }
        403 | 429 if resp.header("x-ratelimit-remaining") == Some("0") => {
          if rate_waits >= 1 {
            let reset = self.rate_guard().reset.unwrap_or_else(Utc::now);
            return Err(ReportError::RateLimited { reset });
          }
          // Loop again; wait_for_rate_budget sees remaining == 0 and
          // sleeps until the reset before the single retry.
          continue;
        }
        403 => {
          return Err(ReportError::Authentication(format!(
            "status 403 from {}: token lacks access",
            url
          )))
        }
        s if (500..600).contains(&s) => {
          if transient_attempts >= MAX_TRANSIENT_RETRIES {
            return Err(ReportError::Http(format!("status {} from {} after retries", s, url)));
          }
          self.backoff(transient_attempts, &format!("status {}", s));
          transient_attempts += 1;
        }
        s => {
          // 404/422 and friends: not retryable, not an auth problem.
          return Err(ReportError::Http(format!("unexpected status {} from {}", s, url)));
        }
      }
    }
  }

  fn backoff(&self, attempt: u32, reason: &str) {
    let pause = self.backoff_base * 2u32.pow(attempt);
    warn!(attempt = attempt + 1, pause_ms = pause.as_millis() as u64, reason, "transient failure; backing off");
    std::thread::sleep(pause);
  }

  /// Fetch every record page for one endpoint kind within the window.
  /// Pages arrive newest-first, so a page containing a record older than
  /// `window.start` is the last page worth fetching.
  pub fn query(&self, kind: EndpointKind, username: &str, window: &TimeWindow) -> Result<Vec<serde_json::Value>> {
    let desc = descriptor(kind);
    let url = desc.url();
    let q = desc.search_query(username, window);
    let mut records: Vec<serde_json::Value> = Vec::new();

    for page in 1..=MAX_PAGES {
      let query: Vec<(&str, String)> = vec![
        ("q", q.clone()),
        ("sort", desc.sort.to_string()),
        ("order", "desc".to_string()),
        ("per_page", self.page_size.to_string()),
        ("page", page.to_string()),
      ];

      let resp = self.fetch_page(&url, &query)?;
      let items = resp.body.fetch("items").to::<Vec<serde_json::Value>>().unwrap_or_default();
      let item_count = items.len();
      let crossed_window_start = items.iter().any(|item| record_precedes(desc, item, window.start));

      records.extend(items);

      if crossed_window_start || item_count < self.page_size as usize {
        break;
      }
    }

    debug!(kind = ?kind, count = records.len(), "query complete");
    Ok(records)
  }

  /// Credential probe used by `--test`: fetches the user profile and
  /// reports rate-limit standing.
  pub fn verify_connection(&self, username: &str) -> Result<ConnectionInfo> {
    let url = format!("{}/users/{}", API_BASE, username);
    // fetch_page already rejects anything that is not a 2xx.
    let resp = self.fetch_page(&url, &[])?;

    Ok(ConnectionInfo {
      login: resp.body.fetch("login").to_or_default::<String>(),
      name: resp.body.fetch("name").to::<String>(),
      public_repos: resp.body.fetch("public_repos").to::<i64>().unwrap_or(0),
      rate_remaining: resp.header("x-ratelimit-remaining").map(str::to_string),
      rate_limit: resp.header("x-ratelimit-limit").map(str::to_string),
    })
  }
}

/// Whether a raw record's timestamp falls before `cutoff`. Records with
/// missing or malformed timestamps do not trigger the early exit; the
/// normalizer deals with them.
fn record_precedes(desc: &Descriptor, record: &serde_json::Value, cutoff: DateTime<Utc>) -> bool {
  record
    .fetch(desc.timestamp_path)
    .to::<String>()
    .and_then(|raw| chrono::DateTime::parse_from_rfc3339(&raw).ok())
    .map(|ts| ts.with_timezone(&Utc) < cutoff)
    .unwrap_or(false)
}
