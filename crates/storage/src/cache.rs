//! File-backed tile cache with TTL expiry.
//!
//! Each entry is two sibling files named after the SHA-256 hex digest of the
//! cache key: `<hex>.bin` holds the raw payload and `<hex>.json` holds
//! `{"headers": {...}, "expiresAt": <epoch seconds>}`. Expired entries are
//! removed lazily on read, or in bulk by [`FileCache::purge_expired`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use tile_common::time::epoch_seconds_now;
use tile_common::{TileError, TileResult};

/// Response headers kept alongside a cached tile.
pub type TileHeaders = BTreeMap<String, String>;

const BODY_EXT: &str = "bin";
const META_EXT: &str = "json";

/// A cache entry as read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPayload {
    pub body: Bytes,
    pub headers: TileHeaders,
    /// Absolute expiry, seconds since the Unix epoch.
    pub expires_at: f64,
}

impl CachedPayload {
    pub fn is_expired(&self) -> bool {
        is_expired_at(self.expires_at, epoch_seconds_now())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMetadata {
    #[serde(default)]
    headers: TileHeaders,
    #[serde(rename = "expiresAt")]
    expires_at: f64,
}

fn is_expired_at(expires_at: f64, now: f64) -> bool {
    now > expires_at
}

/// Filename stem for a cache key (lowercase SHA-256 hex).
pub fn cache_file_stem(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// On-disk tile cache.
///
/// Writes are full replacements, so two concurrent writers for the same key
/// leave one complete entry behind.
#[derive(Debug, Clone)]
pub struct FileCache {
    base_dir: PathBuf,
    ttl_secs: u64,
}

impl FileCache {
    /// Open (and create if needed) the cache directory.
    pub fn new(base_dir: impl Into<PathBuf>, ttl_secs: u64) -> TileResult<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            TileError::CacheError(format!(
                "Failed to create cache directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        Ok(Self { base_dir, ttl_secs })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn entry_paths(&self, key: &str) -> (PathBuf, PathBuf) {
        let stem = cache_file_stem(key);
        (
            self.base_dir.join(format!("{}.{}", stem, BODY_EXT)),
            self.base_dir.join(format!("{}.{}", stem, META_EXT)),
        )
    }

    /// Look up a live entry.
    ///
    /// Missing, orphaned, corrupt and expired entries are all reported as a
    /// miss. Expired entries are deleted on the way out.
    pub async fn get(&self, key: &str) -> Option<CachedPayload> {
        let (body_path, meta_path) = self.entry_paths(key);

        let raw_meta = match tokio::fs::read(&meta_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache metadata");
                return None;
            }
        };

        let meta: CacheMetadata = match serde_json::from_slice(&raw_meta) {
            Ok(meta) => meta,
            Err(e) => {
                warn!(key = %key, error = %e, "Corrupt cache metadata, treating as miss");
                return None;
            }
        };

        if is_expired_at(meta.expires_at, epoch_seconds_now()) {
            debug!(key = %key, "Cache entry expired");
            remove_quietly(&body_path).await;
            remove_quietly(&meta_path).await;
            return None;
        }

        let body = match tokio::fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cache body");
                return None;
            }
        };

        Some(CachedPayload {
            body: Bytes::from(body),
            headers: meta.headers,
            expires_at: meta.expires_at,
        })
    }

    /// Store an entry, replacing whatever was there.
    ///
    /// The body is written before the metadata, so a crash in between leaves
    /// an orphaned body that reads as a miss.
    pub async fn set(&self, key: &str, body: &[u8], headers: &TileHeaders) -> TileResult<()> {
        let (body_path, meta_path) = self.entry_paths(key);
        let meta = CacheMetadata {
            headers: headers.clone(),
            expires_at: epoch_seconds_now() + self.ttl_secs as f64,
        };
        let raw_meta = serde_json::to_vec(&meta)?;

        tokio::fs::write(&body_path, body).await?;
        tokio::fs::write(&meta_path, raw_meta).await?;

        Ok(())
    }

    /// Remove every file in the cache directory. Returns the number removed.
    pub async fn clear(&self) -> usize {
        let mut removed = 0;
        for path in self.list_files().await {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cache file"),
            }
        }
        removed
    }

    /// Remove expired or unreadable entries and orphaned bodies.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let now = epoch_seconds_now();
        let mut removed = 0;

        for path in self.list_files().await {
            let ext = path.extension().and_then(|e| e.to_str());
            match ext {
                Some(META_EXT) => {
                    let stale = match tokio::fs::read(&path).await {
                        Ok(raw) => match serde_json::from_slice::<CacheMetadata>(&raw) {
                            Ok(meta) => is_expired_at(meta.expires_at, now),
                            Err(_) => true,
                        },
                        Err(_) => false,
                    };
                    if stale {
                        remove_quietly(&path.with_extension(BODY_EXT)).await;
                        remove_quietly(&path).await;
                        removed += 1;
                    }
                }
                Some(BODY_EXT) => {
                    let meta_path = path.with_extension(META_EXT);
                    if !tokio::fs::try_exists(&meta_path).await.unwrap_or(true) {
                        remove_quietly(&path).await;
                        removed += 1;
                    }
                }
                _ => {}
            }
        }

        removed
    }

    async fn list_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.base_dir.display(), error = %e, "Failed to list cache directory");
                return files;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => files.push(entry.path()),
                _ => {}
            }
        }
        files
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to delete cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png_headers() -> TileHeaders {
        let mut headers = TileHeaders::new();
        headers.insert("Content-Type".to_string(), "image/png".to_string());
        headers
    }

    #[test]
    fn test_file_stem_is_sha256_hex() {
        assert_eq!(
            cache_file_stem("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), 3600).unwrap();

        cache.set("gibs:A:2024-01-01:1:2:3", b"tile", &png_headers()).await.unwrap();
        let hit = cache.get("gibs:A:2024-01-01:1:2:3").await.unwrap();

        assert_eq!(hit.body, Bytes::from_static(b"tile"));
        assert_eq!(hit.headers, png_headers());
        assert!(!hit.is_expired());
    }

    #[tokio::test]
    async fn test_metadata_file_layout() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), 60).unwrap();
        cache.set("k", b"x", &png_headers()).await.unwrap();

        let stem = cache_file_stem("k");
        let raw = std::fs::read(dir.path().join(format!("{}.json", stem))).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();

        assert_eq!(json["headers"]["Content-Type"], "image/png");
        assert!(json["expiresAt"].as_f64().unwrap() > epoch_seconds_now());
        assert!(dir.path().join(format!("{}.bin", stem)).exists());
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_entry() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), 60).unwrap();

        cache.set("k", b"old", &TileHeaders::new()).await.unwrap();
        cache.set("k", b"new", &png_headers()).await.unwrap();

        let hit = cache.get("k").await.unwrap();
        assert_eq!(hit.body, Bytes::from_static(b"new"));
        assert_eq!(hit.headers, png_headers());
    }

    #[test]
    fn test_expiry_boundary() {
        assert!(!is_expired_at(100.0, 100.0));
        assert!(is_expired_at(100.0, 100.5));
    }

    #[test]
    fn test_new_fails_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, b"").unwrap();

        let err = FileCache::new(&file, 60).unwrap_err();
        assert!(matches!(err, TileError::CacheError(_)));
    }
}
