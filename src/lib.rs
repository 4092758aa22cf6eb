//! Freshen - build-version publishing and stale-client cache reconciliation
//!
//! Stamps every build with a version identifier published to a static
//! resource and to the served page shell, then keeps long-lived clients
//! honest: when a newer build is deployed, clients are prompted to purge
//! their cached state and reload.

pub mod api;
pub mod app;
pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod publish;
pub mod purge;
pub mod reconcile;
pub mod reload;
pub mod storage;
pub mod toast;
pub mod ui;
pub mod version;

pub use error::{FreshenError, FreshenResult};
