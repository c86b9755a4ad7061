//! Per-user "last seen" tracking backed by a JSON file.
//!
//! The file holds one key, `last_seen`, mapping a user id to
//! `[message_text, timestamp]`. It is read once at startup and rewritten in
//! full after every recorded message.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::model::Snowflake;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("activity file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("activity file is not valid: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    pub user_id: Snowflake,
    pub last_message_text: String,
    pub last_message_at: DateTime<Utc>,
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Replaces whatever was known about `user_id`, then flushes.
    ///
    /// The in-memory replace always happens; an `Err` only means the flush
    /// failed and the update lives in memory until the next successful one.
    async fn record(
        &self,
        user_id: &str,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn lookup(&self, user_id: &str) -> Option<ActivityRecord>;

    /// Replaces the in-memory map with the durable copy. A missing file is an
    /// empty map; an unreadable one leaves the map empty and returns the error.
    async fn load_from_durable(&self) -> Result<usize, StoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ActivityFile {
    #[serde(default)]
    last_seen: BTreeMap<String, (String, String)>,
}

pub struct JsonActivityStore {
    path: PathBuf,
    records: RwLock<HashMap<Snowflake, ActivityRecord>>,
    flush_lock: Mutex<()>,
}

impl JsonActivityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: RwLock::new(HashMap::new()),
            flush_lock: Mutex::new(()),
        }
    }

    /// Builds the store and loads it, falling back to an empty map.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let store = Self::new(path);
        match store.load_from_durable().await {
            Ok(count) => log::info!("Loaded {} activity records from {}", count, store.path.display()),
            Err(e) => log::warn!(
                "Could not load {}, starting with no activity: {}",
                store.path.display(),
                e
            ),
        }
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn snapshot(&self) -> HashMap<Snowflake, ActivityRecord> {
        self.records.read().await.clone()
    }

    /// Writes the whole map to a sibling temp file and renames it into place.
    ///
    /// Flushes are serialized and each one snapshots the map after taking the
    /// lock, so the last flush to finish always carries the newest state.
    pub async fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.flush_lock.lock().await;

        let file = {
            let records = self.records.read().await;
            ActivityFile {
                last_seen: records
                    .values()
                    .map(|r| {
                        (
                            r.user_id.clone(),
                            (
                                r.last_message_text.clone(),
                                r.last_message_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                            ),
                        )
                    })
                    .collect(),
            }
        };

        let body = serde_json::to_vec_pretty(&file)?;
        let tmp = tmp_path(&self.path);
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for JsonActivityStore {
    async fn record(
        &self,
        user_id: &str,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        {
            let mut records = self.records.write().await;
            records.insert(
                user_id.to_string(),
                ActivityRecord {
                    user_id: user_id.to_string(),
                    last_message_text: text.to_string(),
                    last_message_at: at,
                },
            );
        }
        self.persist().await
    }

    async fn lookup(&self, user_id: &str) -> Option<ActivityRecord> {
        self.records.read().await.get(user_id).cloned()
    }

    async fn load_from_durable(&self) -> Result<usize, StoreError> {
        let mut records = self.records.write().await;
        records.clear();

        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let file: ActivityFile = serde_json::from_slice(&raw)?;

        for (user_id, (text, ts)) in file.last_seen {
            match parse_timestamp(&ts) {
                Some(at) => {
                    records.insert(
                        user_id.clone(),
                        ActivityRecord { user_id, last_message_text: text, last_message_at: at },
                    );
                }
                None => log::warn!("Skipping activity for {}: bad timestamp {:?}", user_id, ts),
            }
        }
        Ok(records.len())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// RFC 3339, or a naive ISO timestamp read as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
