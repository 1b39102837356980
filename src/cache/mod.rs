//! Content cache: deterministic keys over canonicalized payloads, absolute TTL.
//!
//! Key = `prefix + ":" + sha256(canonical JSON of payload)`. Object keys are sorted
//! recursively before hashing, so field order never changes the key.
//!
//! The cache is an optimization only. When the backing store fails, `get` returns
//! `None`, `set`/`delete` return `false`, `clear_all` returns 0. The first failure
//! is logged at warn; later ones at debug.

pub mod store;

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::{CacheConfig, DEFAULT_CACHE_TTL_SECS};

pub use store::{CacheError, CacheStore, FileStore, MemoryStore};

/// Short, non-reversible text fingerprint for logs.
pub fn text_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Canonical JSON: object keys sorted at every level, no insignificant whitespace.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (k, v)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(k.clone()).to_string());
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, v) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(v, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Deterministic cache key for `payload` under `prefix`.
pub fn cache_key<P: Serialize + ?Sized>(prefix: &str, payload: &P) -> Result<String, CacheError> {
    let value = serde_json::to_value(payload)?;
    let digest = Sha256::digest(canonicalize(&value).as_bytes());
    let mut key = String::with_capacity(prefix.len() + 1 + 64);
    key.push_str(prefix);
    key.push(':');
    for b in digest.iter() {
        let _ = write!(&mut key, "{:02x}", b);
    }
    Ok(key)
}

/// Snapshot of cache counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub store: &'static str,
    pub available: bool,
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
}

pub struct ContentCache {
    store: Option<Arc<dyn CacheStore>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    failed_once: AtomicBool,
}

impl ContentCache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self {
            store: Some(store),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            failed_once: AtomicBool::new(false),
        }
    }

    /// In-memory cache with the given default TTL.
    pub fn memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), default_ttl)
    }

    /// A cache that stores nothing; every lookup misses.
    pub fn disabled() -> Self {
        Self {
            store: None,
            default_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            failed_once: AtomicBool::new(false),
        }
    }

    pub fn from_config(cfg: &CacheConfig) -> Self {
        if !cfg.enabled {
            return Self::disabled();
        }
        match &cfg.dir {
            Some(dir) => Self::new(Arc::new(FileStore::new(dir)), cfg.ttl()),
            None => Self::memory(cfg.ttl()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn record_failure(&self, op: &'static str, err: &CacheError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!("cache_errors_total", "op" => op).increment(1);
        if !self.failed_once.swap(true, Ordering::Relaxed) {
            tracing::warn!(target: "cache", op, error = %err, "cache unavailable; continuing without it");
        } else {
            tracing::debug!(target: "cache", op, error = %err, "cache operation failed");
        }
    }

    fn key<P: Serialize + ?Sized>(&self, op: &'static str, prefix: &str, payload: &P) -> Option<String> {
        match cache_key(prefix, payload) {
            Ok(k) => Some(k),
            Err(e) => {
                self.record_failure(op, &e);
                None
            }
        }
    }

    pub async fn get<T, P>(&self, prefix: &str, payload: &P) -> Option<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let store = self.store.as_ref()?;
        let key = self.key("get", prefix, payload)?;
        let found = match store.get(&key).await {
            Ok(v) => v,
            Err(e) => {
                self.record_failure("get", &e);
                return None;
            }
        };
        let decoded = match found.map(serde_json::from_value::<T>) {
            Some(Ok(v)) => Some(v),
            Some(Err(e)) => {
                self.record_failure("get", &e.into());
                None
            }
            None => None,
        };
        if decoded.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            counter!("cache_hits_total", "prefix" => prefix.to_string()).increment(1);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            counter!("cache_misses_total", "prefix" => prefix.to_string()).increment(1);
        }
        decoded
    }

    /// Store with the default TTL.
    pub async fn set<P, R>(&self, prefix: &str, payload: &P, result: &R) -> bool
    where
        P: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        self.set_with_ttl(prefix, payload, result, self.default_ttl).await
    }

    pub async fn set_with_ttl<P, R>(&self, prefix: &str, payload: &P, result: &R, ttl: Duration) -> bool
    where
        P: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        let Some(key) = self.key("set", prefix, payload) else {
            return false;
        };
        let value = match serde_json::to_value(result) {
            Ok(v) => v,
            Err(e) => {
                self.record_failure("set", &e.into());
                return false;
            }
        };
        match store.set(&key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                self.record_failure("set", &e);
                false
            }
        }
    }

    /// `true` if an entry was removed.
    pub async fn delete<P: Serialize + ?Sized>(&self, prefix: &str, payload: &P) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        let Some(key) = self.key("delete", prefix, payload) else {
            return false;
        };
        match store.delete(&key).await {
            Ok(removed) => removed,
            Err(e) => {
                self.record_failure("delete", &e);
                false
            }
        }
    }

    /// Drop all entries, or only those under `prefix`. Returns how many were removed.
    pub async fn clear_all(&self, prefix: Option<&str>) -> usize {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        match store.clear(prefix).await {
            Ok(n) => {
                tracing::info!(target: "cache", prefix = prefix.unwrap_or("*"), removed = n, "cache cleared");
                n
            }
            Err(e) => {
                self.record_failure("clear", &e);
                0
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            store: self.store.as_ref().map(|s| s.name()).unwrap_or("disabled"),
            available: self.store.is_some() && !self.failed_once.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}
