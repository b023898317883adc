// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Abstract the HTTP fetch capability so the query client never performs raw socket I/O
// role: github/transport
// inputs: URL + query params; bearer token held by the ureq implementation
// outputs: Response {status, headers, body} for any HTTP status; Err only on transport failure
// invariants: Non-2xx statuses are data, not errors; header keys are lowercased; body is Null when unparsable
// errors: ReportError::Http for connect/timeout-level failures only
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;

use crate::error::{ReportError, Result};

const USER_AGENT: &str = "github-activity-report";

/// One HTTP exchange result. Status and rate-limit headers travel with the
/// JSON body so the client can apply policy without touching the socket
/// layer.
#[derive(Debug, Clone)]
pub struct Response {
  pub status: u16,
  pub headers: BTreeMap<String, String>,
  pub body: serde_json::Value,
}

impl Response {
  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// The fetch capability the pipeline issues all remote calls through.
pub trait Transport: Send + Sync {
  fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<Response>;
}

/// Production transport backed by a shared ureq agent.
pub struct UreqTransport {
  agent: ureq::Agent,
  token: String,
}

impl UreqTransport {
  pub fn new(token: String) -> Self {
    Self {
      agent: ureq::AgentBuilder::new().build(),
      token,
    }
  }
}

impl Transport for UreqTransport {
  fn fetch(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
    let mut req = self
      .agent
      .get(url)
      .set("Accept", "application/vnd.github+json")
      .set("User-Agent", USER_AGENT)
      .set("Authorization", &format!("Bearer {}", self.token));

    for (key, value) in query {
      req = req.query(key, value);
    }

    match req.call() {
      Ok(resp) => Ok(into_response(resp)),
      // Non-2xx still carries rate-limit headers and an error body; the
      // client classifies it, we only surface transport-level failures.
      Err(ureq::Error::Status(_, resp)) => Ok(into_response(resp)),
      Err(ureq::Error::Transport(t)) => Err(ReportError::Http(t.to_string())),
    }
  }
}

fn into_response(resp: ureq::Response) -> Response {
  let status = resp.status();
  let mut headers = BTreeMap::new();

  for name in resp.headers_names() {
    if let Some(value) = resp.header(&name) {
      headers.insert(name.to_ascii_lowercase(), value.to_string());
    }
  }

  let body = resp.into_json::<serde_json::Value>().unwrap_or(serde_json::Value::Null);

  Response { status, headers, body }
}
