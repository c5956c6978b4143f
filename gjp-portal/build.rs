//! Build script for gjp-portal
//!
//! Stamps the binary with where it came from, so a startup log line or a
//! backend access log can be traced back to a source tree:
//! - `GIT_HASH`: short commit hash, suffixed `-dirty` for uncommitted changes
//! - `BUILD_TIMESTAMP`: UTC time the script last ran
//! - `BUILD_PROFILE`: cargo profile (debug/release)
//!
//! `GIT_HASH` also ends up in the HTTP `User-Agent` header.

use std::process::Command;

/// Run `git` in the package directory; `None` outside a checkout or without git
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    let git_hash = match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) => {
            // Porcelain output is empty for a clean tree
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .map(|s| !s.is_empty())
                .unwrap_or(false);
            if dirty {
                format!("{}-dirty", hash)
            } else {
                hash
            }
        }
        None => "unknown".to_string(),
    };

    let build_timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);

    // Rerun on source edits, commits and branch switches; otherwise the stamp
    // would only refresh on a clean build
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/index");
}
