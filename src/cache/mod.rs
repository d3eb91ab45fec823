//! Build cache for revalidation
//!
//! Records when the listing was last generated, and from what, so that
//! `generate` re-queries the content source at most once per revalidation
//! interval.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Cache directory name
pub const CACHE_DIR: &str = ".postlist-cache";

/// Cache file name
const CACHE_FILE: &str = ".postlist-cache/build.json";

/// Record of the latest successful generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildCache {
    /// Version of the cache format
    pub version: u32,
    /// When the listing was last generated
    pub generated_at: Option<DateTime<Utc>>,
    /// Hash of the generated props
    pub content_hash: u64,
    /// Hash of the site config (changes force regeneration)
    pub config_hash: u64,
    /// Posts on the generated first page
    pub post_count: usize,
}

impl BuildCache {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<BuildCache>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, rebuilding cache");
            }
        }
        Self::default()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let cache_path = base_dir.join(CACHE_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Whether the last build is still within its revalidation window
    pub fn is_fresh(&self, now: DateTime<Utc>, revalidate: u64, config_hash: u64) -> bool {
        let Some(generated_at) = self.generated_at else {
            return false;
        };
        if self.config_hash != config_hash {
            return false;
        }

        let age = now.signed_duration_since(generated_at).num_seconds();
        age >= 0 && (age as u64) < revalidate
    }

    /// Seconds until the last build goes stale
    pub fn remaining(&self, now: DateTime<Utc>, revalidate: u64) -> u64 {
        self.generated_at
            .map(|at| {
                let age = now.signed_duration_since(at).num_seconds().max(0) as u64;
                revalidate.saturating_sub(age)
            })
            .unwrap_or(0)
    }

    /// Build a record for a generation that just finished
    pub fn record(now: DateTime<Utc>, content: &str, config_hash: u64, post_count: usize) -> Self {
        Self {
            generated_at: Some(now),
            content_hash: hash_content(content),
            config_hash,
            post_count,
            ..Self::new()
        }
    }
}

/// Calculate hash of content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}
