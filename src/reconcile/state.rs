//! Reconciler states

use crate::version::BuildVersion;
use serde::Serialize;
use std::fmt;

/// Where a client stands relative to the latest published build
///
/// `Fresh → UpdateAvailable → Purging → Reloading`, with
/// `UpdateAvailable → Fresh` on dismissal. `Reloading` is terminal: the
/// reload re-creates the reconciler from the new running build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReconcileState {
    /// No newer build known
    Fresh,
    /// A newer build is published and the prompt is showing
    UpdateAvailable { latest: BuildVersion },
    /// Purge in flight
    Purging,
    /// Reload scheduled
    Reloading,
}

impl ReconcileState {
    /// Poll results are ignored once a purge has started
    pub fn accepts_poll(&self) -> bool {
        matches!(self, Self::Fresh | Self::UpdateAvailable { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Reloading)
    }

    /// Pending version while an update is available
    pub fn pending(&self) -> Option<&BuildVersion> {
        match self {
            Self::UpdateAvailable { latest } => Some(latest),
            _ => None,
        }
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fresh => write!(f, "fresh"),
            Self::UpdateAvailable { latest } => write!(f, "update available ({})", latest),
            Self::Purging => write!(f, "purging"),
            Self::Reloading => write!(f, "reloading"),
        }
    }
}
