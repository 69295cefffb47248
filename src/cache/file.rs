//! Disk-backed cache store
//!
//! Each key is persisted as its own JSON file holding the value and its
//! expiry timestamp. Expired entries stay on disk until overwritten but are
//! reported as misses.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::{CacheError, CacheStore};

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// The cached value
    data: String,
    /// When the value was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires, `None` for never
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

/// Stores cache entries as JSON files in a directory
///
/// Defaults to `~/.cache/lumserp/` on Linux. Only UTF-8 values can be
/// stored, which covers both serialized results and HTML pages.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl FileCache {
    /// Creates a new FileCache using the XDG-compliant cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "lumserp")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new FileCache with a custom cache directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    ///
    /// Keys carry raw keywords, so anything outside `[A-Za-z0-9-_]` is
    /// escaped byte by byte to keep distinct keys on distinct files.
    fn cache_path(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("%{:02X}", byte));
            }
        }
        self.cache_dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let content = match fs::read_to_string(self.cache_path(key)).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let entry: CacheEntry = serde_json::from_str(&content)?;

        if entry.expires_at.is_some_and(|expires_at| Utc::now() > expires_at) {
            return Ok(None);
        }
        Ok(Some(entry.data.into_bytes()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let data = String::from_utf8(value).map_err(|_| CacheError::NotUtf8)?;

        // A ttl past chrono's range is stored without an expiry.
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl));
        let entry = CacheEntry {
            data,
            cached_at: now,
            expires_at,
        };
        let json = serde_json::to_string(&entry)?;

        fs::create_dir_all(&self.cache_dir).await?;
        fs::write(self.cache_path(key), json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn create_test_cache() -> (FileCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = FileCache::with_dir(temp_dir.path());
        (cache, temp_dir)
    }

    #[tokio::test]
    async fn test_set_creates_file_in_cache_directory() {
        let (cache, temp_dir) = create_test_cache();

        cache
            .set("luminati-client-reddico-uk-mobile-html", b"<html></html>".to_vec(), DAY)
            .await
            .expect("Write should succeed");

        let expected_path = temp_dir
            .path()
            .join("luminati-client-reddico-uk-mobile-html.json");
        assert!(expected_path.exists(), "Cache file should exist");

        let content = std::fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"expires_at\""));
        assert!(content.contains("<html></html>"));
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();

        let result = cache.get("nonexistent_key").await.expect("Read should succeed");

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[tokio::test]
    async fn test_get_returns_fresh_value() {
        let (cache, _temp_dir) = create_test_cache();

        cache.set("fresh_key", b"fresh".to_vec(), DAY).await.unwrap();

        let result = cache.get("fresh_key").await.unwrap();
        assert_eq!(result, Some(b"fresh".to_vec()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let (cache, _temp_dir) = create_test_cache();

        cache
            .set("expired_key", b"stale".to_vec(), Duration::ZERO)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(cache.get("expired_key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unbounded_ttl_never_expires() {
        let (cache, temp_dir) = create_test_cache();

        cache
            .set("forever", b"kept".to_vec(), Duration::MAX)
            .await
            .expect("Write should succeed");

        assert_eq!(cache.get("forever").await.unwrap(), Some(b"kept".to_vec()));
        let content = std::fs::read_to_string(temp_dir.path().join("forever.json")).unwrap();
        assert!(content.contains("\"expires_at\":null"));
    }

    #[tokio::test]
    async fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = FileCache::with_dir(nested_path.clone());

        cache.set("nested_key", b"1".to_vec(), DAY).await.unwrap();

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("nested_key.json").exists());
    }

    #[tokio::test]
    async fn test_keys_with_unsafe_characters_stay_distinct() {
        let (cache, temp_dir) = create_test_cache();

        cache.set("a b/c", b"first".to_vec(), DAY).await.unwrap();
        cache.set("a_b_c", b"second".to_vec(), DAY).await.unwrap();

        assert_eq!(cache.get("a b/c").await.unwrap(), Some(b"first".to_vec()));
        assert_eq!(cache.get("a_b_c").await.unwrap(), Some(b"second".to_vec()));
        assert!(temp_dir.path().join("a%20b%2Fc.json").exists());
    }

    #[tokio::test]
    async fn test_non_utf8_value_is_rejected() {
        let (cache, _temp_dir) = create_test_cache();

        let err = cache.set("bytes", vec![0xff, 0xfe], DAY).await.unwrap_err();

        assert!(matches!(err, CacheError::NotUtf8));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_an_error() {
        let (cache, temp_dir) = create_test_cache();
        std::fs::write(temp_dir.path().join("corrupt.json"), "not json").unwrap();

        let err = cache.get("corrupt").await.unwrap_err();

        assert!(matches!(err, CacheError::Encoding(_)));
    }

    #[tokio::test]
    async fn test_overwrite_existing_cache() {
        let (cache, _temp_dir) = create_test_cache();

        cache.set("overwrite_key", b"first".to_vec(), DAY).await.unwrap();
        cache.set("overwrite_key", b"second".to_vec(), DAY).await.unwrap();

        assert_eq!(
            cache.get("overwrite_key").await.unwrap(),
            Some(b"second".to_vec()),
            "Cache should contain latest data"
        );
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(cache) = FileCache::new() {
            let path_str = cache.dir().to_string_lossy();
            assert!(path_str.contains("lumserp"), "Cache path should contain project name");
        }
        // Passes when new() returns None (e.g., no home directory in CI)
    }
}
