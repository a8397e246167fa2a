//! Shared fixtures for jail integration tests.
//!
//! Provides a [`RecordingCache`] that wraps a [`MemoryCache`] and records
//! every call it receives, so tests can assert on exactly what a jail
//! delegated and with which source paths.

// Not all tests use all helpers
#![allow(dead_code)]

use metacache_core::{
    CacheEntry, CacheResult, EntryData, FileCache, FileId, FileRef, FolderSizeCache, MemoryCache,
    MoveInfo, ScanStatus, SearchQuery, StorageId,
};
use parking_lot::Mutex;
use std::sync::{Arc, Once};

static TRACING_ONCE: Once = Once::new();

/// Installs a test tracing subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    TRACING_ONCE.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A cache that records delegated calls before forwarding them.
pub struct RecordingCache {
    inner: MemoryCache,
    calls: Mutex<Vec<String>>,
    folder_sizes: bool,
}

impl RecordingCache {
    /// Wraps `inner`, forwarding its folder size capability.
    pub fn new(inner: MemoryCache) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            folder_sizes: true,
        }
    }

    /// Wraps `inner` but hides its folder size capability.
    pub fn without_folder_sizes(inner: MemoryCache) -> Self {
        Self {
            folder_sizes: false,
            ..Self::new(inner)
        }
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Forgets recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    pub fn inner(&self) -> &MemoryCache {
        &self.inner
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl FileCache for RecordingCache {
    fn numeric_storage_id(&self) -> StorageId {
        self.inner.numeric_storage_id()
    }

    fn get(&self, file: FileRef<'_>) -> CacheResult<Option<CacheEntry>> {
        match file {
            FileRef::Path(p) => self.record(format!("get({p})")),
            FileRef::Id(id) => self.record(format!("get(#{id})")),
        }
        self.inner.get(file)
    }

    fn get_folder_contents(&self, folder: &str) -> CacheResult<Vec<CacheEntry>> {
        self.record(format!("get_folder_contents({folder})"));
        self.inner.get_folder_contents(folder)
    }

    fn get_folder_contents_by_id(&self, folder_id: FileId) -> CacheResult<Vec<CacheEntry>> {
        self.record(format!("get_folder_contents_by_id(#{folder_id})"));
        self.inner.get_folder_contents_by_id(folder_id)
    }

    fn put(&self, path: &str, data: &EntryData) -> CacheResult<Option<FileId>> {
        self.record(format!("put({path})"));
        self.inner.put(path, data)
    }

    fn insert(&self, path: &str, data: &EntryData) -> CacheResult<FileId> {
        self.record(format!("insert({path})"));
        self.inner.insert(path, data)
    }

    fn update(&self, id: FileId, data: &EntryData) -> CacheResult<()> {
        self.record(format!("update(#{id})"));
        self.inner.update(id, data)
    }

    fn get_id(&self, path: &str) -> CacheResult<Option<FileId>> {
        self.record(format!("get_id({path})"));
        self.inner.get_id(path)
    }

    fn get_parent_id(&self, path: &str) -> CacheResult<Option<FileId>> {
        self.record(format!("get_parent_id({path})"));
        self.inner.get_parent_id(path)
    }

    fn in_cache(&self, path: &str) -> CacheResult<bool> {
        self.record(format!("in_cache({path})"));
        self.inner.in_cache(path)
    }

    fn remove(&self, path: &str) -> CacheResult<()> {
        self.record(format!("remove({path})"));
        self.inner.remove(path)
    }

    fn move_entry(&self, source: &str, target: &str) -> CacheResult<()> {
        self.record(format!("move_entry({source}, {target})"));
        self.inner.move_entry(source, target)
    }

    fn move_from_cache(
        &self,
        source_cache: &dyn FileCache,
        source_path: &str,
        target_path: &str,
    ) -> CacheResult<()> {
        self.record(format!("move_from_cache({source_path}, {target_path})"));
        self.inner
            .move_from_cache(source_cache, source_path, target_path)
    }

    fn get_move_info(&self, path: &str) -> MoveInfo {
        self.record(format!("get_move_info({path})"));
        self.inner.get_move_info(path)
    }

    fn clear(&self) -> CacheResult<()> {
        self.record("clear()".to_string());
        self.inner.clear()
    }

    fn get_status(&self, path: &str) -> CacheResult<ScanStatus> {
        self.record(format!("get_status({path})"));
        self.inner.get_status(path)
    }

    fn search(&self, pattern: &str) -> CacheResult<Vec<CacheEntry>> {
        self.record(format!("search({pattern})"));
        self.inner.search(pattern)
    }

    fn search_by_mime(&self, mimetype: &str) -> CacheResult<Vec<CacheEntry>> {
        self.record(format!("search_by_mime({mimetype})"));
        self.inner.search_by_mime(mimetype)
    }

    fn search_query(&self, query: &SearchQuery) -> CacheResult<Vec<CacheEntry>> {
        self.record(format!(
            "search_query(limit={:?}, offset={})",
            query.limit, query.offset
        ));
        self.inner.search_query(query)
    }

    fn get_all(&self) -> CacheResult<Vec<FileId>> {
        self.record("get_all()".to_string());
        self.inner.get_all()
    }

    fn get_incomplete(&self) -> CacheResult<Option<String>> {
        self.record("get_incomplete()".to_string());
        self.inner.get_incomplete()
    }

    fn get_path_by_id(&self, id: FileId) -> CacheResult<Option<String>> {
        self.record(format!("get_path_by_id(#{id})"));
        self.inner.get_path_by_id(id)
    }

    fn folder_sizes(&self) -> Option<&dyn FolderSizeCache> {
        if self.folder_sizes {
            self.inner.folder_sizes()
        } else {
            None
        }
    }
}

/// Inserts a folder, panicking on failure.
pub fn folder(cache: &MemoryCache, path: &str) -> FileId {
    cache.insert(path, &EntryData::folder(0)).unwrap()
}

/// Inserts a file, panicking on failure.
pub fn file(cache: &MemoryCache, path: &str, size: i64, mimetype: &str) -> FileId {
    cache
        .insert(path, &EntryData::file(size, 0, mimetype))
        .unwrap()
}

/// The storage layout used across scenarios:
///
/// ```text
/// photos/
///   2023/
///     a.jpg
///   2024/
///     b.jpg
/// docs/
///   c.txt
/// ```
pub fn photo_storage() -> MemoryCache {
    let cache = MemoryCache::new(42);
    folder(&cache, "");
    folder(&cache, "photos");
    folder(&cache, "photos/2023");
    file(&cache, "photos/2023/a.jpg", 100, "image/jpeg");
    folder(&cache, "photos/2024");
    file(&cache, "photos/2024/b.jpg", 200, "image/jpeg");
    folder(&cache, "docs");
    file(&cache, "docs/c.txt", 10, "text/plain");
    cache
}

/// Recording wrapper over [`photo_storage`].
pub fn recording_photo_storage() -> Arc<RecordingCache> {
    Arc::new(RecordingCache::new(photo_storage()))
}

/// Paths of a result set, in order.
pub fn paths(entries: &[CacheEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.path.as_str()).collect()
}
