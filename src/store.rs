//! Participant-scoped key-value persistence.
//!
//! Every dataset is stored as a JSON value under `<participantId>::<dataset>`.
//! Loads never fail the caller: a read error is retried once and anything
//! that still cannot be read or parsed degrades to the empty default with a
//! warning in the log. Appends are stricter and fail on an unreadable log.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::participant::{participant_key, ParticipantConfig, ParticipantError};
use crate::record::SessionRecord;
use crate::words::{TargetWordList, WordListError};

pub const SESSIONS_DATASET: &str = "sightWordsSessions";
pub const TARGET_WORDS_DATASET: &str = "targetWords";
pub const PARTICIPANT_CONFIG_DATASET: &str = "participantConfig";

const KEY_SEPARATOR: &str = "::";
const READ_ATTEMPTS: usize = 2;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    WordList(#[from] WordListError),

    #[error(transparent)]
    Participant(#[from] ParticipantError),
}

/// `<participantId>::<dataset>`
pub fn storage_key(participant: &str, dataset: &str) -> String {
    format!("{}{KEY_SEPARATOR}{dataset}", participant_key(participant))
}

/// Minimal string key-value backend
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

/// In-memory backend, used by tests and `--db :memory:`
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

/// SQLite-backed store with a single `kv` table
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at the default state location
    pub fn open_default() -> Result<Self, StoreError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("sightword.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        debug!("opening store at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

fn parse_or_default<T: DeserializeOwned + Default>(key: &str, raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("discarding malformed {key}: {e}");
        T::default()
    })
}

/// Typed access to one participant's datasets
#[derive(Debug)]
pub struct ParticipantStore<S: KeyValueStore> {
    store: S,
    participant: String,
}

impl<S: KeyValueStore> ParticipantStore<S> {
    pub fn new(store: S, participant: &str) -> Self {
        Self {
            store,
            participant: participant_key(participant).to_string(),
        }
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn switch_participant(&mut self, participant: &str) {
        self.participant = participant_key(participant).to_string();
        debug!("switched participant to {}", self.participant);
    }

    fn key(&self, dataset: &str) -> String {
        storage_key(&self.participant, dataset)
    }

    fn read_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut attempt = 1;
        loop {
            match self.store.get(key) {
                Ok(value) => return Ok(value),
                Err(e) if attempt < READ_ATTEMPTS => {
                    warn!("read of {key} failed (attempt {attempt}): {e}");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Parse-or-default read of one dataset
    fn read<T: DeserializeOwned + Default>(&self, dataset: &str) -> T {
        let key = self.key(dataset);
        match self.read_raw(&key) {
            Ok(Some(raw)) => parse_or_default(&key, &raw),
            Ok(None) => T::default(),
            Err(e) => {
                warn!("giving up on {key}: {e}");
                T::default()
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, dataset: &str, value: &T) -> Result<(), StoreError> {
        let key = self.key(dataset);
        let json = serde_json::to_string(value)?;
        self.store.set(&key, &json)
    }

    pub fn load_sessions(&self) -> Vec<SessionRecord> {
        self.read::<Vec<SessionRecord>>(SESSIONS_DATASET)
            .into_iter()
            .map(SessionRecord::normalized)
            .collect()
    }

    pub fn save_sessions(&mut self, sessions: &[SessionRecord]) -> Result<(), StoreError> {
        self.write(SESSIONS_DATASET, sessions)
    }

    /// Append to the ordered log and return the full history.
    ///
    /// Fails when the stored log cannot be read. Only a missing or malformed
    /// log starts over.
    pub fn append_sessions(
        &mut self,
        records: &[SessionRecord],
    ) -> Result<Vec<SessionRecord>, StoreError> {
        let key = self.key(SESSIONS_DATASET);
        let stored: Vec<SessionRecord> = match self.read_raw(&key)? {
            Some(raw) => parse_or_default(&key, &raw),
            None => Vec::new(),
        };
        let mut sessions: Vec<SessionRecord> =
            stored.into_iter().map(SessionRecord::normalized).collect();
        sessions.extend_from_slice(records);
        self.save_sessions(&sessions)?;
        Ok(sessions)
    }

    pub fn append_session(
        &mut self,
        record: SessionRecord,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        self.append_sessions(std::slice::from_ref(&record))
    }

    pub fn load_target_words(&self) -> TargetWordList {
        let raw: Vec<String> = self.read(TARGET_WORDS_DATASET);
        TargetWordList::from_words(raw)
    }

    /// Lists below the minimum size are refused
    pub fn save_target_words(&mut self, words: &TargetWordList) -> Result<(), StoreError> {
        words.ensure_ready()?;
        self.write(TARGET_WORDS_DATASET, words)
    }

    /// `None` when nothing valid is stored yet
    pub fn load_participant_config(&self) -> Option<ParticipantConfig> {
        let cfg: Option<ParticipantConfig> = self.read(PARTICIPANT_CONFIG_DATASET);
        cfg.filter(|c| match c.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("ignoring stored participant config: {e}");
                false
            }
        })
    }

    pub fn save_participant_config(&mut self, cfg: &ParticipantConfig) -> Result<(), StoreError> {
        cfg.validate()?;
        self.write(PARTICIPANT_CONFIG_DATASET, cfg)
    }

    /// Participant ids that have any stored dataset
    pub fn participants(&self) -> Vec<String> {
        let keys = self.store.keys().unwrap_or_else(|e| {
            warn!("failed to list keys: {e}");
            Vec::new()
        });
        let mut ids: Vec<String> = keys
            .iter()
            .filter_map(|k| k.split_once(KEY_SEPARATOR).map(|(id, _)| id.to_string()))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}
