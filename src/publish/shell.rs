//! Page shell globals block
//!
//! The served HTML shell carries a delimited block that defines the running
//! build's version and build date as runtime-readable globals. Publishing
//! replaces everything between the delimiters, so repeated builds overwrite
//! the block instead of stacking copies.

use crate::error::{FreshenError, FreshenResult};
use crate::version::BuildVersion;
use std::path::Path;

/// Opening delimiter of the injected block
pub const INJECT_START: &str = "<!-- VERSION_INJECT_START -->";
/// Closing delimiter of the injected block
pub const INJECT_END: &str = "<!-- VERSION_INJECT_END -->";

/// Global holding the running build version
pub const VERSION_GLOBAL: &str = "window.__APP_VERSION__";
/// Global holding the running build date
pub const BUILD_TIME_GLOBAL: &str = "window.__BUILD_TIME__";

/// Values read back from (or written into) the shell block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellGlobals {
    pub version: BuildVersion,
    pub build_date: String,
}

/// Byte range of the block contents between the two delimiters
fn locate_block(html: &str, path: &Path) -> FreshenResult<(usize, usize)> {
    let start = html
        .find(INJECT_START)
        .ok_or_else(|| FreshenError::PlaceholderMissing {
            path: path.to_path_buf(),
            marker: INJECT_START,
        })?;
    let body_start = start + INJECT_START.len();

    // The end marker must follow the start marker
    let end = html[body_start..]
        .find(INJECT_END)
        .map(|offset| body_start + offset)
        .ok_or_else(|| FreshenError::PlaceholderMissing {
            path: path.to_path_buf(),
            marker: INJECT_END,
        })?;

    Ok((body_start, end))
}

/// Render the script block placed between the delimiters
fn render_block(globals: &ShellGlobals) -> String {
    // JSON string literals are valid JS string literals
    let version = serde_json::Value::String(globals.version.to_string());
    let build_date = serde_json::Value::String(globals.build_date.clone());
    format!(
        "\n<script>\n  {} = {};\n  {} = {};\n</script>\n",
        VERSION_GLOBAL, version, BUILD_TIME_GLOBAL, build_date
    )
}

/// Replace the delimited block in `html` with fresh globals
///
/// Fails when either delimiter is missing; the input is never returned
/// unchanged in that case.
pub fn inject_globals(html: &str, globals: &ShellGlobals, path: &Path) -> FreshenResult<String> {
    let (body_start, body_end) = locate_block(html, path)?;

    let mut out = String::with_capacity(html.len() + 128);
    out.push_str(&html[..body_start]);
    out.push_str(&render_block(globals));
    out.push_str(&html[body_end..]);
    Ok(out)
}

/// Check that the shell carries both delimiters
pub fn ensure_placeholder(html: &str, path: &Path) -> FreshenResult<()> {
    locate_block(html, path).map(|_| ())
}

/// Read the running build globals back out of a published shell
pub fn read_globals(html: &str, path: &Path) -> FreshenResult<ShellGlobals> {
    let (body_start, body_end) = locate_block(html, path)?;
    let block = &html[body_start..body_end];

    let missing = || FreshenError::ShellGlobalsMissing {
        path: path.to_path_buf(),
    };

    let version = read_string_global(block, VERSION_GLOBAL).ok_or_else(missing)?;
    let build_date = read_string_global(block, BUILD_TIME_GLOBAL).ok_or_else(missing)?;
    let version = BuildVersion::new(version).map_err(|_| missing())?;

    Ok(ShellGlobals {
        version,
        build_date,
    })
}

/// Extract `NAME = "literal";` from a block
fn read_string_global(block: &str, name: &str) -> Option<String> {
    let after_name = &block[block.find(name)? + name.len()..];
    let literal = after_name.trim_start().strip_prefix('=')?.trim_start();
    let literal = literal.split(['\n', ';']).next()?.trim();
    serde_json::from_str::<String>(literal).ok()
}
