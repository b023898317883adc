use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

mod aggregate;
mod cli;
mod error;
mod ext;
mod github;
mod model;
mod normalize;
mod pipeline;
mod render;
mod util;
mod window;

use crate::cli::{normalize as normalize_cli, Cli};
use crate::github::client::QueryClient;
use crate::github::transport::UreqTransport;

fn init_logging() -> Result<()> {
  let filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init()
    .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

  Ok(())
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  init_logging()?;

  // Phase 1: normalize CLI and environment into one config
  let cfg = normalize_cli(cli)?;

  let transport = Arc::new(UreqTransport::new(cfg.token.clone()));
  let client = QueryClient::new(transport);

  // Phase 2: connection check mode short-circuits the pipeline
  if cfg.test {
    let info = client.verify_connection(&cfg.username)?;
    println!("Connection OK: authenticated for {} ({})", info.login, cfg.username);
    if let Some(name) = info.name {
      println!("  Name: {}", name);
    }
    println!("  Public repositories: {}", info.public_repos);
    if let (Some(remaining), Some(limit)) = (info.rate_remaining, info.rate_limit) {
      println!("  Rate limit: {}/{} remaining", remaining, limit);
    }
    return Ok(());
  }

  // Phase 3: resolve the reporting window
  let now = window::effective_now(window::parse_now_override(cfg.now_override.as_deref()));
  let time_window = window::resolve(cfg.period, cfg.days, now)?;

  // Phase 4: query, normalize, aggregate
  let report = pipeline::generate_report(&cfg.username, time_window, &client)?;

  // Phase 5: render and deliver
  let rendered = render::render(&report, cfg.format, &cfg.company);
  util::write_output(&cfg.out, &rendered)?;

  Ok(())
}
