//! Build version identifiers and the published version manifest
//!
//! A [`BuildVersion`] is opaque: two versions are either equal or not.
//! The timestamp scheme is monotonic by construction, so no ordering
//! comparison is ever needed at runtime.

use crate::error::{FreshenError, FreshenResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source revision recorded when the originating commit is unknown
pub const DEVELOPMENT_REVISION: &str = "development";

/// Opaque per-build identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildVersion(String);

impl BuildVersion {
    /// Wrap an existing identifier, rejecting empty values
    pub fn new(value: impl Into<String>) -> FreshenResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(FreshenError::VersionEmpty);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Millisecond timestamp identifier for `now`
    pub fn from_timestamp(now: DateTime<Utc>) -> Self {
        Self(now.timestamp_millis().to_string())
    }

    /// Timestamp identifier guaranteed to differ from `previous`
    ///
    /// If the clock has not advanced past a previously published timestamp
    /// (two builds in the same millisecond, or clock skew between build
    /// hosts), the previous value plus one is used instead.
    pub fn next_timestamp(now: DateTime<Utc>, previous: Option<&BuildVersion>) -> Self {
        let now_ms = now.timestamp_millis();
        match previous.and_then(|p| p.as_str().parse::<i64>().ok()) {
            Some(prev) if prev >= now_ms => Self((prev + 1).to_string()),
            _ => Self(now_ms.to_string()),
        }
    }

    /// Content hash identifier (first 12 hex chars of a SHA-256 digest)
    pub fn from_content_hash(hex_digest: &str) -> Self {
        Self(hex_digest.chars().take(12).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for BuildVersion {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BuildVersion {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// How the publisher derives a new build version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionScheme {
    /// Millisecond wall-clock timestamp
    #[default]
    Timestamp,
    /// Hash of the published asset tree
    ContentHash,
}

impl fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp => write!(f, "timestamp"),
            Self::ContentHash => write!(f, "content_hash"),
        }
    }
}

/// The static version resource fetched by running clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub version: BuildVersion,

    /// ISO-8601 build time
    pub build_date: String,

    /// Originating commit, or `"development"` when unknown
    #[serde(rename = "gitCommit", default = "default_revision")]
    pub source_revision: String,
}

fn default_revision() -> String {
    DEVELOPMENT_REVISION.to_string()
}

impl VersionManifest {
    pub fn new(version: BuildVersion, built_at: DateTime<Utc>, source_revision: String) -> Self {
        Self {
            version,
            build_date: format_build_date(built_at),
            source_revision,
        }
    }

    /// Parse a manifest body, rejecting empty versions
    pub fn parse(body: &str) -> FreshenResult<Self> {
        let manifest: Self = serde_json::from_str(body)
            .map_err(|e| FreshenError::VersionManifestInvalid(e.to_string()))?;
        if manifest.version.as_str().trim().is_empty() {
            return Err(FreshenError::VersionManifestInvalid(
                "empty version field".to_string(),
            ));
        }
        Ok(manifest)
    }

    pub fn to_json_pretty(&self) -> FreshenResult<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Render a build time the way the manifest and shell globals carry it
pub fn format_build_date(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn rejects_empty_version() {
        assert!(BuildVersion::new("  ").is_err());
        assert_eq!(BuildVersion::new(" 42 ").unwrap(), "42");
    }

    #[test]
    fn timestamp_version_is_decimal_millis() {
        let v = BuildVersion::from_timestamp(at(1_700_000_000_123));
        assert_eq!(v.as_str(), "1700000000123");
    }

    #[test]
    fn next_timestamp_never_repeats() {
        let prev = BuildVersion::new("5000").unwrap();
        assert_eq!(BuildVersion::next_timestamp(at(5000), Some(&prev)), "5001");
        assert_eq!(BuildVersion::next_timestamp(at(4000), Some(&prev)), "5001");
        assert_eq!(BuildVersion::next_timestamp(at(6000), Some(&prev)), "6000");
    }

    #[test]
    fn next_timestamp_ignores_non_numeric_previous() {
        let prev = BuildVersion::new("a1b2c3d4e5f6").unwrap();
        assert_eq!(BuildVersion::next_timestamp(at(7000), Some(&prev)), "7000");
    }

    #[test]
    fn manifest_uses_wire_field_names() {
        let manifest = VersionManifest::new(
            BuildVersion::new("1000").unwrap(),
            at(1000),
            "abc123".to_string(),
        );
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.contains(r#""version":"1000""#));
        assert!(json.contains(r#""buildDate":"1970-01-01T00:00:01.000Z""#));
        assert!(json.contains(r#""gitCommit":"abc123""#));
    }

    #[test]
    fn manifest_parse_defaults_revision() {
        let manifest =
            VersionManifest::parse(r#"{"version":"2000","buildDate":"2024-01-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(manifest.version, "2000");
        assert_eq!(manifest.source_revision, DEVELOPMENT_REVISION);
    }

    #[test]
    fn manifest_parse_rejects_garbage() {
        assert!(VersionManifest::parse("<html>").is_err());
        assert!(VersionManifest::parse(r#"{"version":"","buildDate":"x"}"#).is_err());
    }
}
