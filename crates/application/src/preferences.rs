use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ApplicationError;

pub const THEME_KEY: &str = "theme";
pub const LANGUAGE_KEY: &str = "language";
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl Display for Theme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ApplicationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ApplicationError::InvalidInput(format!(
                "theme must be light or dark, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub theme: Theme,
    pub language: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_parses_known_values_only() {
        assert_eq!("dark".parse::<Theme>().expect("dark"), Theme::Dark);
        assert_eq!(" light ".parse::<Theme>().expect("light"), Theme::Light);
        assert!(matches!(
            "sepia".parse::<Theme>(),
            Err(ApplicationError::InvalidInput(_))
        ));
    }

    #[test]
    fn defaults_are_light_and_english() {
        let prefs = Preferences::default();
        assert_eq!(prefs.theme, Theme::Light);
        assert_eq!(prefs.language, "en");
    }
}
