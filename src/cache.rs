//! Incremental cache
//!
//! Content hashes of everything written in previous runs, persisted as JSON
//! next to the output root. A file whose recorded hash matches the incoming
//! content and still exists on disk is skipped. The cache is strictly an
//! optimization: a missing or corrupt cache file degrades to a full rewrite,
//! never an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Error;
use crate::types::{Hash, PathKey};

/// Cache file name, stored in the output root.
pub const CACHE_FILE_NAME: &str = ".mdfold-cache.json";

/// Hash a file body the way cache entries record it.
pub fn content_hash(content: &str) -> String {
    let digest: Hash = *blake3::hash(content.as_bytes()).as_bytes();
    hex::encode(digest)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// blake3 of the file content, hex.
    pub hash: String,
    pub size: u64,
    /// Unix seconds of the write that produced this entry.
    pub modified: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CacheFile {
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
}

/// Loaded cache plus its backing path.
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    /// Load the cache under `output_root`. Corruption is logged and treated
    /// as an empty cache.
    pub fn load(output_root: &Path) -> Self {
        let path = output_root.join(CACHE_FILE_NAME);
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<CacheFile>(&raw) {
                Ok(file) => file.entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "cache file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        debug!(entries = entries.len(), "cache loaded");
        Cache { path, entries }
    }

    /// An empty cache that will persist under `output_root`.
    pub fn empty(output_root: &Path) -> Self {
        Cache {
            path: output_root.join(CACHE_FILE_NAME),
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `path` must be rewritten: no entry, changed content, or the
    /// file has vanished from disk.
    pub fn should_update(&self, path: &PathKey, fs_path: &Path, content: &str) -> bool {
        let entry = match self.entries.get(path.as_str()) {
            Some(entry) => entry,
            None => return true,
        };
        if entry.hash != content_hash(content) {
            return true;
        }
        !fs_path.is_file()
    }

    /// Record a completed write.
    pub fn record(&mut self, path: &PathKey, content: &str) {
        self.entries.insert(
            path.as_str().to_string(),
            CacheEntry {
                hash: content_hash(content),
                size: content.len() as u64,
                modified: Utc::now().timestamp(),
            },
        );
    }

    /// Drop entries for paths not written this run.
    pub fn retain_paths(&mut self, live: &[PathKey]) {
        let keep: std::collections::HashSet<&str> = live.iter().map(|p| p.as_str()).collect();
        self.entries.retain(|k, _| keep.contains(k.as_str()));
    }

    /// Persist the cache to disk.
    pub fn store(&self) -> Result<(), Error> {
        let file = CacheFile {
            entries: self.entries.clone(),
        };
        let raw = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::Config(format!("cache serialization failed: {}", e)))?;
        std::fs::write(&self.path, raw).map_err(|e| Error::io(&self.path, e))?;
        debug!(entries = self.entries.len(), path = %self.path.display(), "cache stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    #[test]
    fn unknown_path_needs_update() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::load(dir.path());
        assert!(cache.is_empty());
        assert!(cache.should_update(&key("a.txt"), &dir.path().join("a.txt"), "hi"));
    }

    #[test]
    fn matching_hash_and_existing_file_skips() {
        let dir = tempfile::tempdir().unwrap();
        let fs_path = dir.path().join("a.txt");
        std::fs::write(&fs_path, "hi").unwrap();
        let mut cache = Cache::load(dir.path());
        cache.record(&key("a.txt"), "hi");
        assert!(!cache.should_update(&key("a.txt"), &fs_path, "hi"));
        assert!(cache.should_update(&key("a.txt"), &fs_path, "changed"));
    }

    #[test]
    fn vanished_file_forces_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::load(dir.path());
        cache.record(&key("gone.txt"), "content");
        assert!(cache.should_update(&key("gone.txt"), &dir.path().join("gone.txt"), "content"));
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let fs_path = dir.path().join("a.txt");
        std::fs::write(&fs_path, "hi").unwrap();
        let mut cache = Cache::load(dir.path());
        cache.record(&key("a.txt"), "hi");
        cache.store().unwrap();

        let reloaded = Cache::load(dir.path());
        assert_eq!(reloaded.len(), 1);
        assert!(!reloaded.should_update(&key("a.txt"), &fs_path, "hi"));
    }

    #[test]
    fn corrupt_cache_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CACHE_FILE_NAME), "{not json").unwrap();
        let cache = Cache::load(dir.path());
        assert!(cache.is_empty());
    }

    #[test]
    fn retain_drops_stale_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = Cache::load(dir.path());
        cache.record(&key("keep.txt"), "a");
        cache.record(&key("stale.txt"), "b");
        cache.retain_paths(&[key("keep.txt")]);
        assert_eq!(cache.len(), 1);
    }
}
