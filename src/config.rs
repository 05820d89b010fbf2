use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::participant::DEFAULT_PARTICIPANT;
use crate::session::{SessionTiming, QUESTIONS_PER_SESSION};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub participant_id: String,
    pub level: u8,
    pub questions_per_session: usize,
    pub response_timeout_secs: u64,
    pub prompt_delay_ms: u64,
    pub feedback_ms: u64,
    pub speech_command: Option<String>,
    pub mute: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            participant_id: DEFAULT_PARTICIPANT.to_string(),
            level: 1,
            questions_per_session: QUESTIONS_PER_SESSION,
            response_timeout_secs: 10,
            prompt_delay_ms: 3000,
            feedback_ms: 2000,
            speech_command: None,
            mute: false,
        }
    }
}

impl Config {
    /// Questions per session, never fewer than one
    pub fn session_length(&self) -> usize {
        self.questions_per_session.max(1)
    }

    pub fn timing(&self) -> SessionTiming {
        SessionTiming {
            response_timeout: Duration::from_secs(self.response_timeout_secs.max(1)),
            prompt_delay: Duration::from_millis(self.prompt_delay_ms),
            feedback: Duration::from_millis(self.feedback_ms),
            ..SessionTiming::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            warn!("ignoring unreadable config {}: {e}", self.path.display());
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let cfg = Config::default();
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("nested").join("config.json"));
        let cfg = Config {
            participant_id: "P3".into(),
            level: 2,
            questions_per_session: 5,
            response_timeout_secs: 15,
            prompt_delay_ms: 4000,
            feedback_ms: 1000,
            speech_command: Some("espeak -s 110".into()),
            mute: true,
        };
        store.save(&cfg).unwrap();
        assert_eq!(cfg, store.load());
    }

    #[test]
    fn missing_or_broken_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        assert_eq!(store.load(), Config::default());
        fs::write(&path, b"{ nope").unwrap();
        assert_eq!(store.load(), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, br#"{"participant_id":"P8","mute":true}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load();
        assert_eq!(cfg.participant_id, "P8");
        assert!(cfg.mute);
        assert_eq!(cfg.questions_per_session, 10);
    }

    #[test]
    fn session_length_is_at_least_one() {
        let cfg = Config {
            questions_per_session: 0,
            ..Config::default()
        };
        assert_eq!(cfg.session_length(), 1);
        assert_eq!(Config::default().session_length(), 10);
    }

    #[test]
    fn timing_uses_configured_values() {
        let cfg = Config {
            response_timeout_secs: 0,
            prompt_delay_ms: 2500,
            ..Config::default()
        };
        let timing = cfg.timing();
        assert_eq!(timing.response_timeout, Duration::from_secs(1));
        assert_eq!(timing.prompt_delay, Duration::from_millis(2500));
        assert_eq!(timing, SessionTiming {
            response_timeout: Duration::from_secs(1),
            prompt_delay: Duration::from_millis(2500),
            ..SessionTiming::default()
        });
    }
}
