//! Backing stores for [`ContentCache`](super::ContentCache).
//!
//! Both stores use absolute expiry: the deadline is fixed at write time and never
//! extended by reads.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io: {0}")]
    Io(#[from] io::Error),
    #[error("cache serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError>;
    /// `true` if an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
    /// Remove every entry, or only those whose key starts with `prefix:`. Returns the count.
    async fn clear(&self, prefix: Option<&str>) -> Result<usize, CacheError>;
    fn name(&self) -> &'static str;
}

fn key_matches(key: &str, prefix: Option<&str>) -> bool {
    match prefix {
        None => true,
        Some(p) => key
            .strip_prefix(p)
            .is_some_and(|rest| rest.starts_with(':')),
    }
}

// ------------------------------------------------------------
// In-memory store
// ------------------------------------------------------------

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Value, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (Value, Instant)>>, CacheError> {
        self.entries
            .lock()
            .map_err(|_| CacheError::Unavailable("memory store lock poisoned".into()))
    }

    /// Entries currently held, expired ones included until the next write.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut g = self.lock()?;
        match g.get(key) {
            Some((_, deadline)) if Instant::now() >= *deadline => {
                g.remove(key);
                Ok(None)
            }
            Some((v, _)) => Ok(Some(v.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut g = self.lock()?;
        // drop expired entries, read or not
        g.retain(|_, (_, deadline)| *deadline > now);
        g.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn clear(&self, prefix: Option<&str>) -> Result<usize, CacheError> {
        let mut g = self.lock()?;
        let before = g.len();
        g.retain(|k, _| !key_matches(k, prefix));
        Ok(before - g.len())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

// ------------------------------------------------------------
// File store: one JSON file per key
// ------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct FileRecord {
    key: String,
    /// Unix seconds.
    expires_at: u64,
    value: Value,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// File-backed store. If the directory cannot be created the store is unavailable
/// and every operation fails with [`CacheError::Unavailable`].
pub struct FileStore {
    dir: PathBuf,
    available: bool,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let available = match std::fs::create_dir_all(&dir) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: "cache", dir = %dir.display(), error = %e, "cache dir not usable");
                false
            }
        };
        Self { dir, available }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn ensure_available(&self) -> Result<(), CacheError> {
        if self.available {
            Ok(())
        } else {
            Err(CacheError::Unavailable(format!(
                "cache dir {} not usable",
                self.dir.display()
            )))
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }

    async fn read_record(path: &Path) -> Result<Option<FileRecord>, CacheError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(path: &Path) -> Result<bool, CacheError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        self.ensure_available()?;
        let path = self.path_for(key);
        let Some(rec) = Self::read_record(&path).await? else {
            return Ok(None);
        };
        if rec.key != key {
            return Ok(None);
        }
        if unix_now() >= rec.expires_at {
            Self::remove(&path).await?;
            return Ok(None);
        }
        Ok(Some(rec.value))
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_available()?;
        let path = self.path_for(key);
        let rec = FileRecord {
            key: key.to_string(),
            expires_at: unix_now().saturating_add(ttl.as_secs()),
            value,
        };
        let json = serde_json::to_vec(&rec)?;
        // Write to a temp file first so readers never see a partial entry.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        self.ensure_available()?;
        Self::remove(&self.path_for(key)).await
    }

    async fn clear(&self, prefix: Option<&str>) -> Result<usize, CacheError> {
        self.ensure_available()?;
        let mut removed = 0;
        let mut rd = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = rd.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let matches = match prefix {
                None => true,
                // Unreadable records are left alone when clearing a single prefix.
                Some(_) => matches!(
                    Self::read_record(&path).await,
                    Ok(Some(rec)) if key_matches(&rec.key, prefix)
                ),
            };
            if matches && Self::remove(&path).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
