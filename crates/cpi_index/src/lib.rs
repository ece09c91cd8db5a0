//! Persists a [`SymbolIndex`] keyed by
//! `(canonical repo root, HEAD commit hash)`. Backed by an in-process LRU
//! layer plus on-disk JSON files under `<cache_dir>/<sha256(root|commit)>.idx`.

use cpi_api::{Error, ErrorCode, SymbolIndex};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Cache policy. A `SymbolIndex` is naturally bounded by repo count, so
/// eviction only needs an entry-count cap.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub max_entries_in_memory: usize,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_entries_in_memory: 64,
        }
    }
}

/// Deterministic cache key for `(root, commit)`: a pure
/// function of its inputs, stable across process restarts.
pub fn cache_key(repo_root: &Path, commit_hash: &str) -> String {
    let canonical = repo_root
        .canonicalize()
        .unwrap_or_else(|_| repo_root.to_path_buf());
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    hasher.update(b"|");
    hasher.update(commit_hash.as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

struct LruEntry {
    key: String,
    index: SymbolIndex,
}

/// Index cache: `get(root, commit)` checks memory, then disk; `put` writes
/// through both. On-disk failures are logged by the caller (via the `Result`)
/// and never block a fresh rebuild.
pub struct IndexCache {
    policy: CachePolicy,
    cache_dir: PathBuf,
    memory: Vec<LruEntry>,
    lookup: HashMap<String, usize>,
}

impl IndexCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_policy(cache_dir, CachePolicy::default())
    }

    pub fn with_policy(cache_dir: impl Into<PathBuf>, policy: CachePolicy) -> Self {
        Self {
            policy,
            cache_dir: cache_dir.into(),
            memory: Vec::new(),
            lookup: HashMap::new(),
        }
    }

    fn disk_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{key}.idx"))
    }

    /// Returns the cached index for `(repo_root, commit_hash)` if present and
    /// consistent with the requested commit (Invariant I3); `None` on a
    /// cache miss or a `CacheError` (caller should build fresh in that case).
    pub fn get(&mut self, repo_root: &Path, commit_hash: &str) -> Result<Option<SymbolIndex>, Error> {
        let key = cache_key(repo_root, commit_hash);

        if let Some(&pos) = self.lookup.get(&key) {
            let entry = self.memory.remove(pos);
            self.reindex_after_remove(pos);
            let hit = entry.index.clone();
            self.memory.push(LruEntry {
                key: key.clone(),
                index: entry.index,
            });
            self.lookup.insert(key, self.memory.len() - 1);
            return Ok(Some(hit));
        }

        let path = self.disk_path(&key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            Error::new(ErrorCode::CacheError, format!("failed to read cache entry: {e}"))
        })?;
        let index: SymbolIndex = serde_json::from_str(&contents).map_err(|e| {
            Error::new(ErrorCode::CacheError, format!("corrupt cache entry: {e}"))
        })?;
        if index.commit_hash != commit_hash {
            return Ok(None);
        }
        self.insert_memory(key, index.clone());
        Ok(Some(index))
    }

    pub fn put(&mut self, repo_root: &Path, index: &SymbolIndex) -> Result<(), Error> {
        let key = cache_key(repo_root, &index.commit_hash);
        self.insert_memory(key.clone(), index.clone());

        std::fs::create_dir_all(&self.cache_dir).map_err(|e| {
            Error::new(ErrorCode::CacheError, format!("failed to create cache dir: {e}"))
        })?;
        let serialized = serde_json::to_string(index).map_err(|e| {
            Error::new(ErrorCode::CacheError, format!("failed to serialize index: {e}"))
        })?;
        std::fs::write(self.disk_path(&key), serialized).map_err(|e| {
            Error::new(ErrorCode::CacheError, format!("failed to write cache entry: {e}"))
        })?;
        Ok(())
    }

    fn insert_memory(&mut self, key: String, index: SymbolIndex) {
        if let Some(&pos) = self.lookup.get(&key) {
            self.memory[pos].index = index;
            return;
        }
        if self.memory.len() >= self.policy.max_entries_in_memory {
            let evicted = self.memory.remove(0);
            self.lookup.remove(&evicted.key);
            self.reindex_after_remove(0);
        }
        self.memory.push(LruEntry { key: key.clone(), index });
        self.lookup.insert(key, self.memory.len() - 1);
    }

    fn reindex_after_remove(&mut self, removed_pos: usize) {
        for (i, entry) in self.memory.iter().enumerate().skip(removed_pos) {
            self.lookup.insert(entry.key.clone(), i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cpi_index_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn cache_key_is_deterministic_for_same_inputs() {
        let root = tmp_dir("key_root");
        let a = cache_key(&root, "abc123");
        let b = cache_key(&root, "abc123");
        assert_eq!(a, b);
        let c = cache_key(&root, "def456");
        assert_ne!(a, c);
    }

    #[test]
    fn put_then_get_round_trips_through_disk() {
        let repo_root = tmp_dir("repo");
        let cache_dir = tmp_dir("cache");
        let mut cache = IndexCache::new(&cache_dir);

        let mut index = SymbolIndex::new("commit1");
        index.insert_class("com.example.Foo", "Foo.java");

        cache.put(&repo_root, &index).unwrap();

        let mut fresh_cache = IndexCache::new(&cache_dir);
        let loaded = fresh_cache.get(&repo_root, "commit1").unwrap().unwrap();
        assert_eq!(loaded.class_map.get("com.example.Foo").unwrap(), "Foo.java");
    }

    #[test]
    fn stale_commit_hash_is_a_miss() {
        let repo_root = tmp_dir("repo2");
        let cache_dir = tmp_dir("cache2");
        let mut cache = IndexCache::new(&cache_dir);
        let index = SymbolIndex::new("old_commit");
        cache.put(&repo_root, &index).unwrap();

        let miss = cache.get(&repo_root, "new_commit").unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn memory_lru_evicts_oldest_beyond_capacity() {
        let cache_dir = tmp_dir("cache3");
        let mut cache = IndexCache::with_policy(&cache_dir, CachePolicy { max_entries_in_memory: 2 });
        for i in 0..3 {
            let root = tmp_dir(&format!("repo_{i}"));
            let index = SymbolIndex::new(format!("commit_{i}"));
            cache.put(&root, &index).unwrap();
        }
        assert_eq!(cache.memory.len(), 2);
    }
}
