//! The file metadata cache contract.
//!
//! [`FileCache`] is implemented by storage-backed caches and by decorators
//! layered over them. Paths are always in the implementor's own namespace;
//! numeric ids are opaque and shared across layers.
//!
//! # Capabilities
//!
//! Folder size maintenance is optional. A cache that can recompute folder
//! sizes exposes it through [`FileCache::folder_sizes`]; decorators forward
//! the capability of the cache they wrap, so callers can probe any stack
//! depth without knowing the concrete types involved.

use crate::entry::{CacheEntry, EntryData, FileId, FileRef, MoveInfo, ScanStatus, StorageId};
use crate::error::CacheResult;
use crate::search::SearchQuery;

/// A path-indexed store of file and folder metadata for one storage.
pub trait FileCache: Send + Sync {
    /// Numeric id of the storage this cache describes.
    fn numeric_storage_id(&self) -> StorageId;

    /// Looks up an entry by path or id.
    fn get(&self, file: FileRef<'_>) -> CacheResult<Option<CacheEntry>>;

    /// Lists the direct children of a folder.
    fn get_folder_contents(&self, folder: &str) -> CacheResult<Vec<CacheEntry>>;

    /// Lists the direct children of the folder with the given id.
    fn get_folder_contents_by_id(&self, folder_id: FileId) -> CacheResult<Vec<CacheEntry>>;

    /// Inserts or updates an entry.
    ///
    /// Returns `None` when the data is incomplete and only a partial entry
    /// was recorded.
    fn put(&self, path: &str, data: &EntryData) -> CacheResult<Option<FileId>>;

    /// Inserts a new entry and returns its id.
    fn insert(&self, path: &str, data: &EntryData) -> CacheResult<FileId>;

    /// Updates the metadata of an existing entry.
    fn update(&self, id: FileId, data: &EntryData) -> CacheResult<()>;

    /// Returns the id of the entry at `path`.
    fn get_id(&self, path: &str) -> CacheResult<Option<FileId>>;

    /// Returns the id of the parent folder of `path`.
    fn get_parent_id(&self, path: &str) -> CacheResult<Option<FileId>>;

    /// Returns true if `path` has a complete entry.
    fn in_cache(&self, path: &str) -> CacheResult<bool>;

    /// Removes an entry and all its descendants.
    fn remove(&self, path: &str) -> CacheResult<()>;

    /// Moves or renames an entry and all its descendants.
    fn move_entry(&self, source: &str, target: &str) -> CacheResult<()>;

    /// Moves an entry subtree from another cache into this one.
    ///
    /// When [`get_move_info`](FileCache::get_move_info) of `source_cache`
    /// names this cache's storage, the move is local and ids are kept.
    fn move_from_cache(
        &self,
        source_cache: &dyn FileCache,
        source_path: &str,
        target_path: &str,
    ) -> CacheResult<()>;

    /// Returns the storage and path holding `path` for cross-storage moves.
    fn get_move_info(&self, path: &str) -> MoveInfo;

    /// Removes every entry this cache exposes.
    fn clear(&self) -> CacheResult<()>;

    /// Returns how completely `path` has been scanned.
    fn get_status(&self, path: &str) -> CacheResult<ScanStatus>;

    /// Searches entry names with a SQL-LIKE / glob style pattern.
    fn search(&self, pattern: &str) -> CacheResult<Vec<CacheEntry>>;

    /// Searches by full mimetype (`image/png`) or mimetype part (`image`).
    fn search_by_mime(&self, mimetype: &str) -> CacheResult<Vec<CacheEntry>>;

    /// Runs a structured query.
    fn search_query(&self, query: &SearchQuery) -> CacheResult<Vec<CacheEntry>>;

    /// Returns the ids of all entries.
    fn get_all(&self) -> CacheResult<Vec<FileId>>;

    /// Returns the path of a folder whose size still needs computing.
    fn get_incomplete(&self) -> CacheResult<Option<String>>;

    /// Resolves an id to a path in this cache's namespace.
    fn get_path_by_id(&self, id: FileId) -> CacheResult<Option<String>>;

    /// Folder size capability, if this cache supports it.
    fn folder_sizes(&self) -> Option<&dyn FolderSizeCache> {
        None
    }
}

/// Caches that can recompute folder sizes from their children.
pub trait FolderSizeCache: Send + Sync {
    /// Recomputes the size of `path` and propagates it to its ancestors.
    ///
    /// `data` is the already fetched entry for `path`, if the caller has it.
    /// In background-scan mode propagation stops at ancestors that are not
    /// fully scanned yet.
    fn correct_folder_size(
        &self,
        path: &str,
        data: Option<&CacheEntry>,
        is_background_scan: bool,
    ) -> CacheResult<()>;

    /// Recomputes and stores the size of the folder at `path`.
    ///
    /// Returns `0` for files and unknown paths.
    fn calculate_folder_size(&self, path: &str, entry: Option<&CacheEntry>) -> CacheResult<i64>;
}
