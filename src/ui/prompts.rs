//! Prompts with an unattended fallback

use super::context::UiContext;
use crate::error::{FreshenError, FreshenResult};

/// Ask a yes/no question
///
/// Auto-yes answers `true`; an unattended context answers `default`.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> FreshenResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| FreshenError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| FreshenError::User(format!("Prompt failed: {}", e)))
}
