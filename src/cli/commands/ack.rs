//! Ack command - inspect or change the acknowledged version

use crate::app;
use crate::cli::args::{AckAction, AckArgs};
use crate::config::Config;
use crate::error::FreshenResult;
use crate::reconcile::AckStore;
use crate::ui::{self, UiContext};
use crate::version::BuildVersion;

/// Execute the ack command
pub async fn execute(args: AckArgs, config: &Config) -> FreshenResult<()> {
    let ctx = UiContext::detect();
    let profile = app::open_profile(config)?;
    let ack = AckStore::new(profile.local.clone());

    match args.action {
        AckAction::Show => match ack.get()? {
            Some(version) => println!("{}", version),
            None => ui::remark(&ctx, "No version acknowledged"),
        },
        AckAction::Set { version } => {
            let version = BuildVersion::new(version)?;
            ack.set(&version)?;
            ui::step_ok(&ctx, &format!("Acknowledged {}", version));
        }
        AckAction::Clear => {
            ack.clear()?;
            ui::step_ok(&ctx, "Acknowledgment cleared");
        }
    }
    Ok(())
}
