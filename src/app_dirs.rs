use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "sightword";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/sightword`, or the platform data dir without `$HOME`
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|proj_dirs| proj_dirs.data_local_dir().into())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("progress.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sightword.log"))
    }

    /// Default destination for history exports started from the TUI
    pub fn export_dir() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("exports"))
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("sightword_config.json"))
    }
}
