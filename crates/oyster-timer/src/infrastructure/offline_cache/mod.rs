//! Offline asset cache: install, activate, and cache-first fetch.
//!
//! A generation-named cache of the app's static assets.  Installing a new
//! generation is all-or-nothing and activating it drops the others, so the
//! app shell stays servable while the network is away.
//!
//! # Lifecycle
//!
//! - **install**: pre-fetch [`ASSET_MANIFEST`] from an [`AssetSource`] into
//!   the cache named [`CACHE_NAME`].  All-or-nothing: if any asset fails, the
//!   named cache is left exactly as it was.
//! - **activate**: delete every cache whose name is not [`CACHE_NAME`], so at
//!   most one generation survives.
//! - **fetch**: cache first, then the source, then the cached offline page
//!   (`./index.html`), then [`FetchError`].  Network responses are passed
//!   through and not written back to the cache.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the current cache generation.
pub const CACHE_NAME: &str = "pearl-point-freshness-cache-v2";

/// Assets pre-fetched at install time.
pub const ASSET_MANIFEST: [&str; 7] = [
    "./",
    "./index.html",
    "./styles.css",
    "./app.js",
    "./sw.js",
    "./manifest.json",
    "./logo.png",
];

/// Page served when a request misses the cache and the source is unreachable.
pub const OFFLINE_PAGE: &str = "./index.html";

/// Error type for [`AssetSource`] reads.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("asset '{0}' not found")]
    NotFound(String),

    /// The request path escapes the source root.
    #[error("asset path '{0}' is not allowed")]
    Forbidden(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error type for [`AssetCache::install`].
#[derive(Debug, Error)]
#[error("install of '{cache}' failed at '{path}': {source}")]
pub struct InstallError {
    pub cache: String,
    pub path: String,
    #[source]
    pub source: SourceError,
}

/// Error type for [`AssetCache::fetch`].
#[derive(Debug, Error)]
#[error("'{path}' is not cached, the source failed ({source}), and no offline page is cached")]
pub struct FetchError {
    pub path: String,
    #[source]
    pub source: SourceError,
}

/// Where a fetched response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Served {
    Cache,
    Network,
    /// The offline page, substituted for an unreachable asset.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub body: Vec<u8>,
    pub served: Served,
}

/// Where assets come from when they are not cached (the "network").
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Reads the asset at the normalised request `path` (e.g. `./app.js`).
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the asset cannot be served.
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError>;
}

/// Normalises a request path to the `./name` form used as cache key.
///
/// Leading slashes and `./` are folded, so `""`, `"/"`, and `"./"` all map
/// to `"./"`, and `"/app.js"` maps to `"./app.js"`.
pub fn normalize_request(path: &str) -> String {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.trim_start_matches('/');
    format!("./{trimmed}")
}

type Cache = HashMap<String, Vec<u8>>;

/// Named caches of path → bytes.
#[derive(Debug, Clone)]
pub struct AssetCache {
    current: String,
    caches: BTreeMap<String, Cache>,
}

impl Default for AssetCache {
    fn default() -> Self {
        Self::new(CACHE_NAME)
    }
}

impl AssetCache {
    /// An empty cache store whose current generation is `current`.
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
            caches: BTreeMap::new(),
        }
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    /// Names of all caches present, sorted.
    pub fn cache_names(&self) -> Vec<&str> {
        self.caches.keys().map(String::as_str).collect()
    }

    /// Inserts a cache directly, e.g. one left behind by an older generation.
    pub fn insert_cache(&mut self, name: impl Into<String>, entries: impl IntoIterator<Item = (String, Vec<u8>)>) {
        let cache = entries
            .into_iter()
            .map(|(path, body)| (normalize_request(&path), body))
            .collect();
        self.caches.insert(name.into(), cache);
    }

    /// `true` if the current cache holds `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.caches
            .get(&self.current)
            .is_some_and(|c| c.contains_key(&normalize_request(path)))
    }

    /// Pre-fetches `manifest` into the current cache.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError`] naming the first asset that failed; nothing
    /// is written in that case.
    pub async fn install(&mut self, source: &dyn AssetSource, manifest: &[&str]) -> Result<(), InstallError> {
        let mut staged = Cache::with_capacity(manifest.len());
        for raw in manifest {
            let path = normalize_request(raw);
            let body = source.fetch(&path).await.map_err(|source| InstallError {
                cache: self.current.clone(),
                path: path.clone(),
                source,
            })?;
            staged.insert(path, body);
        }

        let count = staged.len();
        self.caches.entry(self.current.clone()).or_default().extend(staged);
        info!("installed {count} assets into '{}'", self.current);
        Ok(())
    }

    /// Deletes every cache other than the current one; returns the removed names.
    pub fn activate(&mut self) -> Vec<String> {
        let stale: Vec<String> = self
            .caches
            .keys()
            .filter(|name| **name != self.current)
            .cloned()
            .collect();
        for name in &stale {
            self.caches.remove(name);
            debug!("deleted stale cache '{name}'");
        }
        stale
    }

    /// Resolves `path`: cache, then `source`, then the cached offline page.
    ///
    /// The cache lookup spans every named cache, current generation first,
    /// so assets from a generation not yet removed by activation still hit.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when all three fail.
    pub async fn fetch(&self, path: &str, source: &dyn AssetSource) -> Result<AssetResponse, FetchError> {
        let path = normalize_request(path);
        if let Some(body) = self.lookup(&path) {
            return Ok(AssetResponse {
                body: body.clone(),
                served: Served::Cache,
            });
        }

        match source.fetch(&path).await {
            Ok(body) => Ok(AssetResponse {
                body,
                served: Served::Network,
            }),
            Err(err) => match self.lookup(OFFLINE_PAGE) {
                Some(body) => {
                    warn!("'{path}' unavailable ({err}); serving offline page");
                    Ok(AssetResponse {
                        body: body.clone(),
                        served: Served::Fallback,
                    })
                }
                None => Err(FetchError { path, source: err }),
            },
        }
    }

    fn lookup(&self, path: &str) -> Option<&Vec<u8>> {
        let current = self.caches.get(&self.current).and_then(|c| c.get(path));
        current.or_else(|| {
            self.caches
                .iter()
                .filter(|(name, _)| **name != self.current)
                .find_map(|(_, c)| c.get(path))
        })
    }
}

// ── Directory source ──────────────────────────────────────────────────────────

/// Serves assets from a local directory; `./` maps to `index.html`.
#[derive(Debug, Clone)]
pub struct DirectoryAssetSource {
    root: PathBuf,
}

impl DirectoryAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File path backing a normalised request path.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Forbidden`] for paths that leave the root.
    pub fn file_for(&self, path: &str) -> Result<PathBuf, SourceError> {
        let relative = normalize_request(path);
        let relative = relative.trim_start_matches("./");
        let relative = if relative.is_empty() { "index.html" } else { relative };

        let rel_path = Path::new(relative);
        if !rel_path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(SourceError::Forbidden(path.to_string()));
        }
        Ok(self.root.join(rel_path))
    }
}

#[async_trait]
impl AssetSource for DirectoryAssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError> {
        let file = self.file_for(path)?;
        match tokio::fs::read(&file).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SourceError::NotFound(path.to_string())),
            Err(source) => Err(SourceError::Io { path: file, source }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use uuid::Uuid;

    /// In-memory source that can be switched offline.
    struct FakeSource {
        assets: HashMap<String, Vec<u8>>,
        offline: AtomicBool,
    }

    impl FakeSource {
        fn with_manifest() -> Self {
            let assets = ASSET_MANIFEST
                .iter()
                .map(|p| (p.to_string(), format!("body of {p}").into_bytes()))
                .collect();
            Self {
                assets,
                offline: AtomicBool::new(false),
            }
        }

        fn without(mut self, path: &str) -> Self {
            self.assets.remove(path);
            self
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl AssetSource for FakeSource {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>, SourceError> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(SourceError::NotFound(path.to_string()));
            }
            self.assets
                .get(path)
                .cloned()
                .ok_or_else(|| SourceError::NotFound(path.to_string()))
        }
    }

    #[test]
    fn test_normalize_request_folds_prefixes() {
        assert_eq!(normalize_request(""), "./");
        assert_eq!(normalize_request("/"), "./");
        assert_eq!(normalize_request("./"), "./");
        assert_eq!(normalize_request("/app.js"), "./app.js");
        assert_eq!(normalize_request("app.js"), "./app.js");
        assert_eq!(normalize_request("./styles.css"), "./styles.css");
    }

    #[tokio::test]
    async fn test_install_caches_every_manifest_entry() {
        // Arrange
        let source = FakeSource::with_manifest();
        let mut cache = AssetCache::default();

        // Act
        cache.install(&source, &ASSET_MANIFEST).await.unwrap();

        // Assert
        for path in ASSET_MANIFEST {
            assert!(cache.contains(path), "{path} should be cached");
        }
        assert_eq!(cache.cache_names(), vec![CACHE_NAME]);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        // Arrange
        let source = FakeSource::with_manifest().without("./logo.png");
        let mut cache = AssetCache::default();

        // Act
        let err = cache.install(&source, &ASSET_MANIFEST).await.unwrap_err();

        // Assert
        assert_eq!(err.path, "./logo.png");
        assert_eq!(err.cache, CACHE_NAME);
        assert!(!cache.contains("./index.html"));
        assert!(cache.cache_names().is_empty());
    }

    #[tokio::test]
    async fn test_activate_deletes_older_generations() {
        // Arrange
        let mut cache = AssetCache::default();
        cache.insert_cache("pearl-point-freshness-cache-v1", [("./app.js".to_string(), b"old".to_vec())]);
        cache
            .install(&FakeSource::with_manifest(), &ASSET_MANIFEST)
            .await
            .unwrap();

        // Act
        let removed = cache.activate();

        // Assert
        assert_eq!(removed, vec!["pearl-point-freshness-cache-v1".to_string()]);
        assert_eq!(cache.cache_names(), vec![CACHE_NAME]);
    }

    #[tokio::test]
    async fn test_fetch_prefers_cache_over_network() {
        let source = FakeSource::with_manifest();
        let mut cache = AssetCache::default();
        cache.insert_cache(CACHE_NAME, [("./app.js".to_string(), b"cached".to_vec())]);

        let response = cache.fetch("/app.js", &source).await.unwrap();

        assert_eq!(response.served, Served::Cache);
        assert_eq!(response.body, b"cached");
    }

    #[tokio::test]
    async fn test_fetch_falls_through_to_network_without_caching() {
        let source = FakeSource::with_manifest();
        let cache = AssetCache::default();

        let response = cache.fetch("./styles.css", &source).await.unwrap();

        assert_eq!(response.served, Served::Network);
        assert_eq!(response.body, b"body of ./styles.css");
        assert!(!cache.contains("./styles.css"));
    }

    #[tokio::test]
    async fn test_fetch_serves_offline_page_when_source_fails() {
        // Arrange
        let source = FakeSource::with_manifest();
        let mut cache = AssetCache::default();
        cache.install(&source, &ASSET_MANIFEST).await.unwrap();
        source.go_offline();

        // Act
        let response = cache.fetch("./uploads/unknown.png", &source).await.unwrap();

        // Assert
        assert_eq!(response.served, Served::Fallback);
        assert_eq!(response.body, b"body of ./index.html");
    }

    #[tokio::test]
    async fn test_fetch_errors_when_nothing_can_answer() {
        let source = FakeSource::with_manifest();
        source.go_offline();
        let cache = AssetCache::default();

        let err = cache.fetch("./app.js", &source).await.unwrap_err();

        assert_eq!(err.path, "./app.js");
    }

    #[tokio::test]
    async fn test_older_generation_still_answers_before_activation() {
        let source = FakeSource::with_manifest();
        source.go_offline();
        let mut cache = AssetCache::default();
        cache.insert_cache("pearl-point-freshness-cache-v1", [("./app.js".to_string(), b"v1".to_vec())]);

        let response = cache.fetch("./app.js", &source).await.unwrap();

        assert_eq!(response.served, Served::Cache);
        assert_eq!(response.body, b"v1");
    }

    #[test]
    fn test_directory_source_maps_root_to_index() {
        let source = DirectoryAssetSource::new("/srv/www");

        assert_eq!(source.file_for("./").unwrap(), PathBuf::from("/srv/www/index.html"));
        assert_eq!(source.file_for("/app.js").unwrap(), PathBuf::from("/srv/www/app.js"));
        assert!(matches!(source.file_for("../etc/passwd"), Err(SourceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_directory_source_reads_files() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("oyster_assets_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>hi</h1>").unwrap();
        let source = DirectoryAssetSource::new(&dir);

        // Act
        let root = source.fetch("./").await.unwrap();
        let missing = source.fetch("./logo.png").await;

        // Assert
        assert_eq!(root, b"<h1>hi</h1>");
        assert!(matches!(missing, Err(SourceError::NotFound(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
