use std::path::PathBuf;

pub const DEFAULT_CATALOG: &str = "novellog.sqlite3";
pub const DEFAULT_PREFERENCES: &str = "novellog-preferences.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub preferences_path: PathBuf,
}

impl AppConfig {
    /// Applies paths given on the command line or through the environment.
    pub fn with_overrides(catalog: Option<PathBuf>, preferences: Option<PathBuf>) -> Self {
        let defaults = Self::default();
        Self {
            catalog_path: catalog.unwrap_or(defaults.catalog_path),
            preferences_path: preferences.unwrap_or(defaults.preferences_path),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(DEFAULT_CATALOG),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES),
        }
    }
}
