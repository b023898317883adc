// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Credential discovery from the environment, report output, and man page rendering
// role: utilities/helpers
// inputs: env GITHUB_TOKEN/GH_TOKEN/GITHUB_USERNAME; optional `gh` CLI for token fallback; clap CommandFactory
// outputs: Discovered credentials, files on disk or stdout, troff man page text
// side_effects: write_output creates parent directories; discover_token may spawn `gh`
// invariants:
// - Token discovery prefers GITHUB_TOKEN, then GH_TOKEN, then `gh auth token`
// - Blank or whitespace-only credentials are treated as absent
// - write_output with "-" never touches the filesystem
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::CommandFactory;

/// Discover a GitHub token: env vars first, then `gh auth token` if available.
pub fn discover_token() -> Option<String> {
  for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
    if let Ok(t) = std::env::var(var) {
      if !t.trim().is_empty() {
        return Some(t);
      }
    }
  }

  if let Ok(output) = std::process::Command::new("gh").args(["auth", "token"]).output() {
    if output.status.success() {
      let t = String::from_utf8_lossy(&output.stdout).trim().to_string();

      if !t.is_empty() {
        return Some(t);
      }
    }
  }

  None
}

/// Default username from the environment.
pub fn discover_username() -> Option<String> {
  std::env::var("GITHUB_USERNAME").ok().filter(|u| !u.trim().is_empty())
}

/// Write the rendered report to `out`, or to stdout when `out` is "-".
/// Parent directories are created as needed.
pub fn write_output(out: &str, content: &str) -> Result<()> {
  if out == "-" {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
      .write_all(content.as_bytes())
      .context("writing report to stdout")?;
    if !content.ends_with('\n') {
      handle.write_all(b"\n").context("writing report to stdout")?;
    }
    return Ok(());
  }

  let path = Path::new(out);
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      std::fs::create_dir_all(parent).with_context(|| format!("creating output directory {}", parent.display()))?;
    }
  }
  std::fs::write(path, content).with_context(|| format!("writing report to {}", out))?;

  Ok(())
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn token_env_precedence_and_fallbacks() {
    // Precedence: GITHUB_TOKEN over GH_TOKEN
    std::env::set_var("GITHUB_TOKEN", "primary-token");
    std::env::set_var("GH_TOKEN", "secondary-token");
    assert_eq!(discover_token().as_deref(), Some("primary-token"));

    // Fallback to GH_TOKEN when GITHUB_TOKEN absent
    std::env::remove_var("GITHUB_TOKEN");
    assert_eq!(discover_token().as_deref(), Some("secondary-token"));

    // Whitespace-only values are treated as absent
    std::env::set_var("GH_TOKEN", "   ");
    std::env::remove_var("GH_TOKEN");

    // Fallback to `gh auth token` when envs are absent
    let td = tempfile::TempDir::new().unwrap();
    let bin_dir = td.path();
    let gh_path = bin_dir.join("gh");
    #[cfg(target_os = "windows")]
    let script = "@echo off\necho token-from-gh\n";
    #[cfg(not(target_os = "windows"))]
    let script = "#!/bin/sh\necho token-from-gh\n";
    std::fs::write(&gh_path, script).unwrap();
    #[cfg(not(target_os = "windows"))]
    {
      use std::os::unix::fs::PermissionsExt;
      let mut perms = std::fs::metadata(&gh_path).unwrap().permissions();
      perms.set_mode(0o755);
      std::fs::set_permissions(&gh_path, perms).unwrap();
    }

    let old_path = std::env::var("PATH").unwrap_or_default();
    let new_path = format!("{}:{}", bin_dir.display(), old_path);
    std::env::set_var("PATH", &new_path);
    assert_eq!(discover_token().as_deref(), Some("token-from-gh"));

    // gh returning empty output means no token
    #[cfg(not(target_os = "windows"))]
    std::fs::write(&gh_path, "#!/bin/sh\necho\n").unwrap();
    #[cfg(target_os = "windows")]
    std::fs::write(&gh_path, "@echo off\necho.\n").unwrap();
    #[cfg(not(target_os = "windows"))]
    {
      use std::os::unix::fs::PermissionsExt;
      let mut perms = std::fs::metadata(&gh_path).unwrap().permissions();
      perms.set_mode(0o755);
      std::fs::set_permissions(&gh_path, perms).unwrap();
    }
    assert_eq!(discover_token(), None);

    std::env::set_var("PATH", old_path);
  }

  #[test]
  #[serial]
  fn username_from_env() {
    std::env::set_var("GITHUB_USERNAME", "octo");
    assert_eq!(discover_username().as_deref(), Some("octo"));

    std::env::set_var("GITHUB_USERNAME", "  ");
    assert_eq!(discover_username(), None);

    std::env::remove_var("GITHUB_USERNAME");
    assert_eq!(discover_username(), None);
  }

  #[test]
  fn write_output_creates_parent_dirs() {
    let td = tempfile::TempDir::new().unwrap();
    let path = td.path().join("nested/dir/report.md");
    write_output(path.to_str().unwrap(), "# Report\n").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
  }

  #[test]
  fn write_output_stdout_is_ok() {
    write_output("-", "hello").unwrap();
  }

  #[test]
  fn man_page_renders() {
    let content = render_man_page::<crate::cli::Cli>().unwrap();
    assert!(content.contains(".TH"));
  }
}
