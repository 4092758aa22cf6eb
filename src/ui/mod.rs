//! Terminal UI for the freshen CLI
//!
//! Uses `cliclack` for prompts and spinners when attached to a terminal,
//! and falls back to plain prefixed lines in CI or when output is piped.
//!
//! ```rust,ignore
//! use freshen::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//! ui::intro(&ctx, "freshen watch");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Clearing caches...");
//! spinner.stop("Caches cleared");
//!
//! if ui::confirm(&ctx, "Update now?", false).await? {
//!     // ...
//! }
//! ```

mod context;
mod output;
mod prompts;
mod spinner;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, outro_success, outro_warn, remark, step_error_detail,
    step_info, step_ok, step_ok_detail, step_warn, step_warn_hint, toast_line,
};
pub use prompts::confirm;
pub use spinner::TaskSpinner;
pub use theme::{init_theme, FreshenTheme};
