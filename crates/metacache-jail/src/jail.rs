//! Jailed view over a metadata cache.
//!
//! [`CacheJail`] wraps another [`FileCache`] and exposes only one subtree of
//! it, with that subtree's root presented as the root of an independent
//! storage. Every inbound path is translated to the wrapped cache's
//! namespace before delegating, and every outbound entry is filtered to the
//! jail and translated back.
//!
//! # Pagination
//!
//! The wrapped cache cannot know which of its results the jail will drop,
//! so structured searches are delegated without offset or limit. The jail
//! filters the full result set and paginates what survives.
//!
//! # Unsupported operations
//!
//! `get_all` and `get_incomplete` would need a scan of the whole wrapped
//! cache. The jail answers them with an empty list and `None`.
//!
//! # Moves
//!
//! Move targets are translated but not checked against the jail; the
//! wrapped cache decides whether a move is legal.

use crate::path::JailPath;
use metacache_core::{
    CacheEntry, CacheResult, EntryData, FileCache, FileId, FileRef, FolderSizeCache, MoveInfo,
    ScanStatus, SearchQuery, StorageId,
};
use std::sync::Arc;

/// A [`FileCache`] restricted to one subtree of another cache.
///
/// The jail holds no mutable state: the root is fixed at construction and
/// the wrapped cache is shared. Jails stack, so a jail on `b` over a jail
/// on `a` behaves as a jail on `a/b`.
///
/// # Example
///
/// ```
/// use metacache_core::{EntryData, FileCache, FileRef, MemoryCache};
/// use metacache_jail::CacheJail;
/// use std::sync::Arc;
///
/// let inner = Arc::new(MemoryCache::new(1));
/// inner.insert("shared", &EntryData::folder(0)).unwrap();
/// inner.insert("shared/a.txt", &EntryData::file(3, 0, "text/plain")).unwrap();
/// inner.insert("private.txt", &EntryData::file(5, 0, "text/plain")).unwrap();
///
/// let jail = CacheJail::new(inner, "shared");
/// let entry = jail.get(FileRef::Path("a.txt")).unwrap().unwrap();
/// assert_eq!(entry.path, "a.txt");
/// assert_eq!(jail.search("%.txt").unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct CacheJail<C: ?Sized> {
    jail: JailPath,
    cache: Arc<C>,
}

impl<C: FileCache + ?Sized> CacheJail<C> {
    /// Creates a jail on `root` over `cache`.
    ///
    /// The root is not required to exist in `cache`. An empty root makes
    /// the jail pass-through.
    pub fn new(cache: Arc<C>, root: impl AsRef<str>) -> Self {
        let jail = JailPath::new(root);
        tracing::debug!(root = jail.root(), "Created cache jail");
        Self { jail, cache }
    }

    /// The jail root in the wrapped cache's namespace.
    pub fn root(&self) -> &str {
        self.jail.root()
    }

    /// The wrapped cache.
    pub fn source_cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Translates a jailed path to the wrapped cache's namespace.
    pub fn source_path(&self, path: &str) -> String {
        let source = self.jail.to_source(path);
        tracing::trace!(jailed = path, source = %source, "Translated jailed path");
        source
    }

    /// Translates a wrapped-cache path into the jail, if it is inside.
    pub fn jailed_path<'a>(&self, source: &'a str) -> Option<&'a str> {
        self.jail.to_jailed(source)
    }

    /// Returns true if the entry (in the wrapped cache's namespace) is
    /// visible through the jail.
    pub fn contains(&self, entry: &CacheEntry) -> bool {
        self.jail.contains(&entry.path)
    }

    /// Rewrites an entry's path into the jail, or drops it if outside.
    fn format_entry(&self, mut entry: CacheEntry) -> Option<CacheEntry> {
        let jailed = self.jail.to_jailed(&entry.path)?.to_string();
        entry.path = jailed;
        Some(entry)
    }

    /// Filters a batch to the jail and rewrites the survivors, keeping order.
    fn format_result_set(&self, entries: Vec<CacheEntry>) -> Vec<CacheEntry> {
        let total = entries.len();
        let visible: Vec<CacheEntry> = entries
            .into_iter()
            .filter_map(|entry| self.format_entry(entry))
            .collect();
        if visible.len() < total {
            tracing::debug!(
                root = self.jail.root(),
                total,
                dropped = total - visible.len(),
                "Filtered entries outside jail"
            );
        }
        visible
    }

    /// Converts an entry handed in by a caller back to the wrapped cache's
    /// namespace.
    fn unformat_entry(&self, entry: &CacheEntry) -> CacheEntry {
        CacheEntry {
            path: self.jail.to_source(&entry.path),
            ..entry.clone()
        }
    }
}

impl<C: FileCache + ?Sized> FileCache for CacheJail<C> {
    fn numeric_storage_id(&self) -> StorageId {
        self.cache.numeric_storage_id()
    }

    fn get(&self, file: FileRef<'_>) -> CacheResult<Option<CacheEntry>> {
        let entry = match file {
            FileRef::Path(path) => {
                let source = self.source_path(path);
                self.cache.get(FileRef::Path(&source))?
            }
            FileRef::Id(id) => self.cache.get(FileRef::Id(id))?,
        };
        Ok(entry.and_then(|e| self.format_entry(e)))
    }

    fn get_folder_contents(&self, folder: &str) -> CacheResult<Vec<CacheEntry>> {
        let entries = self.cache.get_folder_contents(&self.source_path(folder))?;
        Ok(self.format_result_set(entries))
    }

    fn get_folder_contents_by_id(&self, folder_id: FileId) -> CacheResult<Vec<CacheEntry>> {
        let entries = self.cache.get_folder_contents_by_id(folder_id)?;
        Ok(self.format_result_set(entries))
    }

    fn put(&self, path: &str, data: &EntryData) -> CacheResult<Option<FileId>> {
        self.cache.put(&self.source_path(path), data)
    }

    fn insert(&self, path: &str, data: &EntryData) -> CacheResult<FileId> {
        self.cache.insert(&self.source_path(path), data)
    }

    fn update(&self, id: FileId, data: &EntryData) -> CacheResult<()> {
        self.cache.update(id, data)
    }

    fn get_id(&self, path: &str) -> CacheResult<Option<FileId>> {
        self.cache.get_id(&self.source_path(path))
    }

    fn get_parent_id(&self, path: &str) -> CacheResult<Option<FileId>> {
        self.cache.get_parent_id(&self.source_path(path))
    }

    fn in_cache(&self, path: &str) -> CacheResult<bool> {
        self.cache.in_cache(&self.source_path(path))
    }

    fn remove(&self, path: &str) -> CacheResult<()> {
        self.cache.remove(&self.source_path(path))
    }

    fn move_entry(&self, source: &str, target: &str) -> CacheResult<()> {
        self.cache
            .move_entry(&self.source_path(source), &self.source_path(target))
    }

    fn move_from_cache(
        &self,
        source_cache: &dyn FileCache,
        source_path: &str,
        target_path: &str,
    ) -> CacheResult<()> {
        if std::ptr::addr_eq(source_cache as *const dyn FileCache, self as *const Self) {
            tracing::debug!(
                root = self.jail.root(),
                "Move from the same jail, using a plain move"
            );
            return self.move_entry(source_path, target_path);
        }
        self.cache
            .move_from_cache(source_cache, source_path, &self.source_path(target_path))
    }

    fn get_move_info(&self, path: &str) -> MoveInfo {
        // each stacked jail adds its own root on the way down
        self.cache.get_move_info(&self.source_path(path))
    }

    fn clear(&self) -> CacheResult<()> {
        tracing::debug!(root = self.jail.root(), "Clearing jailed subtree");
        self.cache.remove(self.jail.root())
    }

    fn get_status(&self, path: &str) -> CacheResult<ScanStatus> {
        self.cache.get_status(&self.source_path(path))
    }

    fn search(&self, pattern: &str) -> CacheResult<Vec<CacheEntry>> {
        let entries = self.cache.search(pattern)?;
        Ok(self.format_result_set(entries))
    }

    fn search_by_mime(&self, mimetype: &str) -> CacheResult<Vec<CacheEntry>> {
        let entries = self.cache.search_by_mime(mimetype)?;
        Ok(self.format_result_set(entries))
    }

    fn search_query(&self, query: &SearchQuery) -> CacheResult<Vec<CacheEntry>> {
        let entries = self.cache.search_query(&query.unpaginated())?;
        let visible = self.format_result_set(entries);
        Ok(query.paginate(visible))
    }

    fn get_all(&self) -> CacheResult<Vec<FileId>> {
        Ok(Vec::new())
    }

    fn get_incomplete(&self) -> CacheResult<Option<String>> {
        Ok(None)
    }

    fn get_path_by_id(&self, id: FileId) -> CacheResult<Option<String>> {
        let source = self.cache.get_path_by_id(id)?;
        Ok(source.and_then(|p| self.jail.to_jailed(&p).map(str::to_string)))
    }

    fn folder_sizes(&self) -> Option<&dyn FolderSizeCache> {
        self.cache.folder_sizes().map(|_| self as &dyn FolderSizeCache)
    }
}

impl<C: FileCache + ?Sized> FolderSizeCache for CacheJail<C> {
    fn correct_folder_size(
        &self,
        path: &str,
        data: Option<&CacheEntry>,
        is_background_scan: bool,
    ) -> CacheResult<()> {
        let Some(sizes) = self.cache.folder_sizes() else {
            tracing::debug!(path, "Wrapped cache has no folder sizes, skipping correction");
            return Ok(());
        };
        let data = data.map(|d| self.unformat_entry(d));
        sizes.correct_folder_size(&self.source_path(path), data.as_ref(), is_background_scan)
    }

    fn calculate_folder_size(&self, path: &str, entry: Option<&CacheEntry>) -> CacheResult<i64> {
        let Some(sizes) = self.cache.folder_sizes() else {
            tracing::debug!(path, "Wrapped cache has no folder sizes, reporting 0");
            return Ok(0);
        };
        let entry = entry.map(|e| self.unformat_entry(e));
        sizes.calculate_folder_size(&self.source_path(path), entry.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metacache_core::{CacheError, MemoryCache, SearchOperation};

    fn make_inner() -> Arc<MemoryCache> {
        let cache = MemoryCache::new(3);
        cache.insert("", &EntryData::folder(0)).unwrap();
        cache.insert("photos", &EntryData::folder(0)).unwrap();
        cache.insert("photos/2023", &EntryData::folder(0)).unwrap();
        cache
            .insert("photos/2023/a.jpg", &EntryData::file(10, 1, "image/jpeg"))
            .unwrap();
        cache.insert("photos/2024", &EntryData::folder(0)).unwrap();
        cache
            .insert("photos/2024/b.jpg", &EntryData::file(20, 1, "image/jpeg"))
            .unwrap();
        cache.insert("docs", &EntryData::folder(0)).unwrap();
        cache
            .insert("docs/c.txt", &EntryData::file(30, 1, "text/plain"))
            .unwrap();
        Arc::new(cache)
    }

    #[test]
    fn test_get_root_and_child() {
        let jail = CacheJail::new(make_inner(), "photos/2023");
        let root = jail.get(FileRef::Path("")).unwrap().unwrap();
        assert_eq!(root.path, "");
        assert_eq!(root.name, "2023");

        let child = jail.get(FileRef::Path("a.jpg")).unwrap().unwrap();
        assert_eq!(child.path, "a.jpg");
    }

    #[test]
    fn test_get_by_id_outside_jail_is_none() {
        let inner = make_inner();
        let outside = inner.get_id("docs/c.txt").unwrap().unwrap();
        let inside = inner.get_id("photos/2023/a.jpg").unwrap().unwrap();
        let jail = CacheJail::new(inner, "photos/2023");

        assert!(jail.get(FileRef::Id(outside)).unwrap().is_none());
        let entry = jail.get(FileRef::Id(inside)).unwrap().unwrap();
        assert_eq!(entry.id, inside);
        assert_eq!(entry.path, "a.jpg");
    }

    #[test]
    fn test_insert_translates_path() {
        let inner = make_inner();
        let jail = CacheJail::new(Arc::clone(&inner), "photos/2023");
        let id = jail
            .insert("new.jpg", &EntryData::file(1, 1, "image/jpeg"))
            .unwrap();
        assert_eq!(
            inner.get_path_by_id(id).unwrap().as_deref(),
            Some("photos/2023/new.jpg")
        );
        assert_eq!(jail.get_path_by_id(id).unwrap().as_deref(), Some("new.jpg"));
    }

    #[test]
    fn test_insert_duplicate_propagates() {
        let jail = CacheJail::new(make_inner(), "photos/2023");
        let err = jail
            .insert("a.jpg", &EntryData::file(1, 1, "image/jpeg"))
            .unwrap_err();
        assert!(matches!(
            err,
            CacheError::AlreadyExists { ref path } if path == "photos/2023/a.jpg"
        ));
    }

    #[test]
    fn test_update_by_id_is_not_jailed() {
        let inner = make_inner();
        let outside = inner.get_id("docs/c.txt").unwrap().unwrap();
        let jail = CacheJail::new(Arc::clone(&inner), "photos/2023");
        let data = EntryData::default().with_etag("x");
        jail.update(outside, &data).unwrap();
        assert_eq!(inner.get(FileRef::Id(outside)).unwrap().unwrap().etag, "x");
    }

    #[test]
    fn test_path_lookups() {
        let inner = make_inner();
        let jail = CacheJail::new(Arc::clone(&inner), "photos/2023");
        assert_eq!(
            jail.get_id("a.jpg").unwrap(),
            inner.get_id("photos/2023/a.jpg").unwrap()
        );
        assert_eq!(
            jail.get_parent_id("a.jpg").unwrap(),
            inner.get_id("photos/2023").unwrap()
        );
        assert!(jail.in_cache("a.jpg").unwrap());
        assert!(!jail.in_cache("b.jpg").unwrap());
        assert_eq!(jail.get_status("").unwrap(), ScanStatus::Shallow);
        assert_eq!(jail.get_status("a.jpg").unwrap(), ScanStatus::Complete);
        assert_eq!(jail.get_status("zzz").unwrap(), ScanStatus::NotFound);
    }

    #[test]
    fn test_folder_contents_are_jailed() {
        let jail = CacheJail::new(make_inner(), "photos/2023");
        let contents = jail.get_folder_contents("").unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].path, "a.jpg");
    }

    #[test]
    fn test_move_info() {
        let jail = CacheJail::new(make_inner(), "photos/2023");
        let info = jail.get_move_info("a.jpg");
        assert_eq!(info.storage_id, 3);
        assert_eq!(info.path, "photos/2023/a.jpg");
    }

    #[test]
    fn test_move_info_through_stacked_jails() {
        let outer = Arc::new(CacheJail::new(make_inner(), "photos"));
        let nested = CacheJail::new(outer, "2023");
        let info = nested.get_move_info("a.jpg");
        assert_eq!(info.storage_id, 3);
        assert_eq!(info.path, "photos/2023/a.jpg");
    }

    #[test]
    fn test_remove_and_move() {
        let inner = make_inner();
        let jail = CacheJail::new(Arc::clone(&inner), "photos");
        jail.move_entry("2023/a.jpg", "2024/a.jpg").unwrap();
        assert!(inner.in_cache("photos/2024/a.jpg").unwrap());

        jail.remove("2024").unwrap();
        assert!(!inner.in_cache("photos/2024").unwrap());
        assert!(inner.in_cache("photos/2023").unwrap());
    }

    #[test]
    fn test_clear_removes_only_jailed_subtree() {
        let inner = make_inner();
        let jail = CacheJail::new(Arc::clone(&inner), "photos");
        jail.clear().unwrap();
        assert!(!inner.in_cache("photos").unwrap());
        assert!(!inner.in_cache("photos/2024/b.jpg").unwrap());
        assert!(inner.in_cache("docs/c.txt").unwrap());
    }

    #[test]
    fn test_unsupported_operations() {
        let jail = CacheJail::new(make_inner(), "photos");
        assert!(jail.get_all().unwrap().is_empty());
        assert_eq!(jail.get_incomplete().unwrap(), None);
    }

    #[test]
    fn test_search_query_unbounded_passthrough() {
        let jail = CacheJail::new(make_inner(), "");
        let found = jail
            .search_query(&SearchQuery::new(SearchOperation::All))
            .unwrap();
        assert_eq!(found.len(), 8);
    }

    #[test]
    fn test_folder_size_capability_forwarded() {
        let jail = CacheJail::new(make_inner(), "photos");
        assert!(jail.folder_sizes().is_some());

        assert_eq!(jail.calculate_folder_size("2023", None).unwrap(), 10);
        jail.correct_folder_size("2024", None, false).unwrap();
        assert_eq!(jail.get(FileRef::Path("2024")).unwrap().unwrap().size, 20);
        // propagation reached the jail root
        assert_eq!(jail.get(FileRef::Path("")).unwrap().unwrap().size, 30);
    }

    #[test]
    fn test_calculate_with_jailed_entry() {
        let jail = CacheJail::new(make_inner(), "photos");
        let entry = jail.get(FileRef::Path("2023")).unwrap().unwrap();
        assert_eq!(jail.calculate_folder_size("2023", Some(&entry)).unwrap(), 10);
    }
}
