//! Cache keys and the on-disk result cache.
//!
//! Result sets are cached per (phrase, version) under the platform cache
//! dir, one JSON file per key, invalidated by file age. The pipeline only
//! depends on the [`Cache`] capability; the file store is the one
//! implementation shipped here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Make a filesystem-friendly cache key.
///
/// `{phrase}_{version}`, lowercased, every character outside
/// `[a-z0-9-_;.]` replaced with `-`, runs of `-` collapsed to one.
pub fn cache_key(phrase: &str, version: &str) -> String {
    let raw = format!("{phrase}_{version}").to_lowercase();
    let mut key = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let mapped = match ch {
            'a'..='z' | '0'..='9' | '-' | '_' | ';' | '.' => ch,
            _ => '-',
        };
        if mapped == '-' && key.ends_with('-') {
            continue;
        }
        key.push(mapped);
    }
    key
}

/// Read-through cache capability.
///
/// `get_or_compute` serves a fresh entry when one exists and runs `compute`
/// otherwise; compute failures propagate and are never cached.
pub trait Cache {
    fn get_or_compute<T, F>(&self, key: &str, max_age: Duration, compute: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> anyhow::Result<T>;
}

/// Error writing a cache entry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("creating cache directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("serializing cache entry {key}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("writing cache entry {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One JSON file per key; freshness from file mtime. Last write wins.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Read an entry no older than `max_age`. Unreadable or corrupt entries
    /// count as misses.
    fn read_fresh<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Option<T> {
        let path = self.entry_path(key);
        let age = fs::metadata(&path).ok()?.modified().ok()?.elapsed().ok()?;
        if age > max_age {
            debug!(key, age_secs = age.as_secs(), "cache entry stale");
            return None;
        }
        let content = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "discarding corrupt cache entry");
                None
            }
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::CreateDir {
            path: self.root.clone(),
            source,
        })?;
        let json = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        let path = self.entry_path(key);
        fs::write(&path, json).map_err(|source| StoreError::Write { path, source })
    }
}

impl Cache for FileCache {
    fn get_or_compute<T, F>(&self, key: &str, max_age: Duration, compute: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> anyhow::Result<T>,
    {
        if let Some(value) = self.read_fresh(key, max_age) {
            debug!(key, "cache hit");
            return Ok(value);
        }
        debug!(key, "cache miss");
        let value = compute()?;
        // A failed write must not fail the run; the value is already in hand.
        if let Err(e) = self.write(key, &value) {
            warn!(key, error = %e, "failed to write cache entry");
        }
        Ok(value)
    }
}

pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "techouse", "alfred-vue-docs").map_or_else(
        || PathBuf::from(".cache"),
        |dirs| dirs.cache_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_deterministic() {
        assert_eq!(cache_key("router", "3"), cache_key("router", "3"));
        assert_ne!(cache_key("router", "3"), cache_key("router", "2"));
        assert_ne!(cache_key("router", "3"), cache_key("vuex", "3"));
    }

    #[test]
    fn key_is_lowercased_and_sanitized() {
        assert_eq!(cache_key("Composition API", "3"), "composition-api_3");
        assert_eq!(cache_key("what's new?", "2"), "what-s-new-_2");
    }

    #[test]
    fn key_collapses_dash_runs() {
        let key = cache_key("a  ?! b", "3");
        assert_eq!(key, "a-b_3");
        assert!(!key.contains("--"));
    }

    #[test]
    fn key_charset_is_restricted() {
        let key = cache_key("Caché / münü", "3");
        assert!(
            key.chars()
                .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | ';' | '.'))
        );
    }

    #[test]
    fn empty_phrase_still_keys() {
        assert_eq!(cache_key("", "3"), "_3");
    }

    #[test]
    fn fresh_entry_skips_compute() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCache::new(dir.path().to_path_buf());
        let max_age = Duration::from_secs(60);

        let first: Vec<String> = store
            .get_or_compute("k", max_age, || Ok(vec!["a".to_string()]))
            .unwrap();
        assert_eq!(first, vec!["a"]);

        // Second call must be served from disk.
        let second: Vec<String> = store
            .get_or_compute("k", max_age, || panic!("compute ran on a fresh entry"))
            .unwrap();
        assert_eq!(second, vec!["a"]);
    }

    #[test]
    fn stale_entry_recomputes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCache::new(dir.path().to_path_buf());

        let _: Vec<String> = store
            .get_or_compute("k", Duration::from_secs(60), || Ok(vec!["old".to_string()]))
            .unwrap();

        // Zero max-age forces a miss even on a just-written entry.
        let refreshed: Vec<String> = store
            .get_or_compute("k", Duration::ZERO, || Ok(vec!["new".to_string()]))
            .unwrap();
        assert_eq!(refreshed, vec!["new"]);
    }

    #[test]
    fn compute_error_propagates_and_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCache::new(dir.path().to_path_buf());

        let failed: anyhow::Result<Vec<String>> =
            store.get_or_compute("k", Duration::from_secs(60), || {
                anyhow::bail!("remote unavailable")
            });
        assert!(failed.is_err());
        assert!(!store.entry_path("k").exists());
    }

    #[test]
    fn corrupt_entry_counts_as_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCache::new(dir.path().to_path_buf());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(store.entry_path("k"), "not json").unwrap();

        let value: Vec<String> = store
            .get_or_compute("k", Duration::from_secs(60), || Ok(vec!["ok".to_string()]))
            .unwrap();
        assert_eq!(value, vec!["ok"]);
    }
}
