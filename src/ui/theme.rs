//! Custom theme for cliclack prompts

use cliclack::ThemeState;
use console::Style;

/// Green-accented theme for update prompts
#[derive(Debug, Clone, Default)]
pub struct FreshenTheme;

impl cliclack::Theme for FreshenTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().cyan(),
        }
    }
}

/// Install the theme for all later prompts
pub fn init_theme() {
    cliclack::set_theme(FreshenTheme);
}
