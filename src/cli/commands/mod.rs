//! CLI command implementations

pub mod ack;
pub mod check;
pub mod completions;
pub mod config;
pub mod publish;
pub mod purge;
pub mod status;
pub mod watch;

pub use ack::execute as ack;
pub use check::execute as check;
pub use completions::execute as completions;
pub use config::execute as config;
pub use publish::execute as publish;
pub use purge::execute as purge;
pub use status::execute as status;
pub use watch::execute as watch;
