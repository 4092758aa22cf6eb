//! Source revision detection for published builds

use crate::version::DEVELOPMENT_REVISION;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// CI environment variables consulted for the originating commit, in order
pub const REVISION_ENV_VARS: &[&str] = &[
    "GIT_COMMIT",
    "GITHUB_SHA",
    "CI_COMMIT_SHA",
    "VERCEL_GIT_COMMIT_SHA",
];

/// Resolve the commit a build was produced from
///
/// Order: explicit value, CI environment variables, `git rev-parse HEAD`
/// in `workdir`, then the literal `"development"`.
pub async fn resolve(explicit: Option<&str>, workdir: &Path) -> String {
    if let Some(rev) = explicit.map(str::trim).filter(|r| !r.is_empty()) {
        return rev.to_string();
    }

    if let Some(rev) = from_env() {
        return rev;
    }

    match from_git(workdir).await {
        Some(rev) => rev,
        None => {
            debug!("No source revision found, using {}", DEVELOPMENT_REVISION);
            DEVELOPMENT_REVISION.to_string()
        }
    }
}

fn from_env() -> Option<String> {
    REVISION_ENV_VARS.iter().find_map(|var| {
        let value = std::env::var(var).ok()?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        debug!("Source revision from {}", var);
        Some(value.to_string())
    })
}

async fn from_git(workdir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(workdir)
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let rev = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!rev.is_empty()).then_some(rev)
}
