use owo_colors::Style;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// When to color catalog output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only on a terminal, and only without `NO_COLOR`
    #[default]
    Auto,
    Always,
    Never,
}

/// Styles for import reports, listings and status lines
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub error: Style,
    pub warn: Style,
    /// Source names in import reports
    pub source: Style,
    /// Labels in summary rows
    pub label: Style,
    /// Per-row issue details
    pub detail: Style,
}

impl Theme {
    pub fn for_mode(mode: ColorMode, stdout_is_term: bool, no_color: bool) -> Self {
        let colored = match mode {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => stdout_is_term && !no_color,
        };
        if colored {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn detect(mode: ColorMode) -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Self::for_mode(mode, console::Term::stdout().is_term(), no_color)
    }

    fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            error: Style::new().red().bold(),
            warn: Style::new().yellow().bold(),
            source: Style::new().blue(),
            label: Style::new().white().dimmed(),
            detail: Style::new().bright_black(),
        }
    }

    fn plain() -> Self {
        let none = Style::new();
        Self {
            header: none,
            success: none,
            error: none,
            warn: none,
            source: none,
            label: none,
            detail: none,
        }
    }

    pub fn is_plain(&self) -> bool {
        [&self.header, &self.success, &self.error, &self.warn, &self.source, &self.label, &self.detail]
            .iter()
            .all(|style| style.is_plain())
    }
}

/// Pick the color mode once, before anything is printed. Later calls are ignored.
pub fn init_theme(mode: ColorMode) {
    let _ = THEME.set(Theme::detect(mode));
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| Theme::detect(ColorMode::Auto))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_resolution() {
        assert!(!Theme::for_mode(ColorMode::Auto, true, false).is_plain());
        assert!(Theme::for_mode(ColorMode::Auto, false, false).is_plain());
        assert!(Theme::for_mode(ColorMode::Auto, true, true).is_plain());
        assert!(!Theme::for_mode(ColorMode::Always, false, true).is_plain());
        assert!(Theme::for_mode(ColorMode::Never, true, false).is_plain());
    }
}
