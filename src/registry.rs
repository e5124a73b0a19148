use std::collections::HashSet;
use std::fs;

use camino::Utf8Path;
use sha2::{Digest, Sha256};

/// Content digests of every image already present in the output directory.
///
/// Built once per process by scanning existing files; grows monotonically as
/// new downloads are saved. Discarded at exit and re-derived on the next run.
#[derive(Debug, Default)]
pub struct HashRegistry {
    hashes: HashSet<String>,
}

impl HashRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digest every regular file under `dir`. Files that cannot be read
    /// (permissions, races) are skipped; the scan never fails startup.
    pub fn scan(dir: &Utf8Path) -> Self {
        let mut registry = Self::new();
        let Ok(entries) = fs::read_dir(dir.as_std_path()) else {
            return registry;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Ok(content) = fs::read(&path) {
                registry.insert(content_digest(&content));
            }
        }
        registry
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.hashes.contains(digest)
    }

    pub fn insert(&mut self, digest: String) {
        self.hashes.insert(digest);
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

/// Hex-encoded SHA-256 of raw bytes, used for duplicate detection.
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
