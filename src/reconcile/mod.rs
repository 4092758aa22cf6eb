//! Runtime cache reconciliation
//!
//! Decides, on load and on a polling interval, whether the running build
//! is stale, and drives the purge-and-reload workflow.
//!
//! # States
//!
//! | State | Entered when | Leaves to |
//! |-------|--------------|-----------|
//! | Fresh | start, dismissal, rollback | UpdateAvailable, Purging |
//! | UpdateAvailable | latest ≠ running and latest ≠ acknowledged | Fresh, Purging |
//! | Purging | update now, forced update, manual clear | Reloading |
//! | Reloading | purge finished (even partially) | terminal |

pub mod ack;
pub mod poller;
pub mod reconciler;
pub mod source;
pub mod state;

pub use ack::AckStore;
pub use poller::{start_polling, PollHandle};
pub use reconciler::{is_update_available, PurgeOutcome, Reconciler};
pub use source::{from_location, FileVersionSource, HttpVersionSource, VersionSource};
pub use state::ReconcileState;
