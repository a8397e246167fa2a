//! In-memory file metadata cache.
//!
//! [`MemoryCache`] is the primitive [`FileCache`] implementation: it owns
//! the path-to-id and id-to-entry tables for one storage and computes
//! folder sizes itself, so it exposes the [`FolderSizeCache`] capability.
//!
//! # Design
//!
//! Entries live in two maps guarded by a single `RwLock`:
//! - `path_to_id`: normalized path → id, ordered so listings and searches
//!   come back in path order
//! - `id_to_entry`: id → entry
//!
//! Entries whose metadata is still incomplete (no size, mtime or mimetype)
//! are kept aside as *partial* entries. They are visible through `get` and
//! `get_status` but have no id until the missing fields arrive.
//!
//! Ids come from an atomic counter starting at 1. `Ordering::Relaxed` is
//! enough since ids only need to be unique.

use crate::cache::{FileCache, FolderSizeCache};
use crate::entry::{
    CacheEntry, EntryData, FileId, FileRef, MoveInfo, Permissions, ScanStatus, StorageId,
    UNKNOWN_SIZE,
};
use crate::error::{CacheError, CacheResult};
use crate::path;
use crate::search::{NamePattern, SearchQuery};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Tables {
    path_to_id: BTreeMap<String, FileId>,
    id_to_entry: HashMap<FileId, CacheEntry>,
    partial: HashMap<String, EntryData>,
}

impl Tables {
    fn entry_at(&self, path: &str) -> Option<&CacheEntry> {
        self.path_to_id
            .get(path)
            .and_then(|id| self.id_to_entry.get(id))
    }

    /// Entries in path order.
    fn ordered(&self) -> impl Iterator<Item = &CacheEntry> {
        self.path_to_id
            .values()
            .filter_map(|id| self.id_to_entry.get(id))
    }

    fn children(&self, folder_id: FileId) -> Vec<CacheEntry> {
        self.ordered()
            .filter(|e| e.parent == Some(folder_id))
            .cloned()
            .collect()
    }

    fn ids_within(&self, root: &str) -> Vec<(String, FileId)> {
        self.path_to_id
            .iter()
            .filter(|(p, _)| path::is_within(p, root))
            .map(|(p, id)| (p.clone(), *id))
            .collect()
    }
}

/// Thread-safe in-memory metadata cache for one storage.
///
/// # Example
///
/// ```
/// use metacache_core::{EntryData, FileCache, FileRef, MemoryCache};
///
/// let cache = MemoryCache::new(1);
/// cache.insert("docs", &EntryData::folder(100)).unwrap();
/// let id = cache.insert("docs/a.txt", &EntryData::file(12, 100, "text/plain")).unwrap();
///
/// let entry = cache.get(FileRef::Id(id)).unwrap().unwrap();
/// assert_eq!(entry.path, "docs/a.txt");
/// assert_eq!(entry.name, "a.txt");
/// ```
#[derive(Debug)]
pub struct MemoryCache {
    storage_id: StorageId,
    tables: RwLock<Tables>,
    next_id: AtomicU64,
}

impl MemoryCache {
    /// Creates an empty cache for the given storage.
    pub fn new(storage_id: StorageId) -> Self {
        Self {
            storage_id,
            tables: RwLock::new(Tables::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the number of complete entries.
    pub fn len(&self) -> usize {
        self.tables.read().id_to_entry.len()
    }

    /// Returns true if the cache holds no complete entries.
    pub fn is_empty(&self) -> bool {
        self.tables.read().id_to_entry.is_empty()
    }

    #[inline]
    fn allocate_id(&self) -> FileId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn build_entry(
        &self,
        id: FileId,
        path: &str,
        parent: Option<FileId>,
        data: &EntryData,
    ) -> CacheEntry {
        let mtime = data.mtime.unwrap_or_default();
        let mut entry = CacheEntry {
            id,
            storage_id: self.storage_id,
            path: path.to_string(),
            parent,
            name: path::file_name(path).to_string(),
            mimetype: String::new(),
            mimepart: String::new(),
            size: UNKNOWN_SIZE,
            mtime,
            storage_mtime: data.storage_mtime.unwrap_or(mtime),
            etag: String::new(),
            permissions: Permissions::ALL,
            status: ScanStatus::Shallow,
        };
        apply(&mut entry, data);
        entry
    }

    fn partial_entry(&self, path: &str, data: &EntryData) -> CacheEntry {
        let mut entry = self.build_entry(0, path, None, data);
        entry.status = ScanStatus::Partial;
        entry
    }

    fn incomplete_children_count(&self, folder_id: FileId) -> usize {
        self.tables
            .read()
            .children(folder_id)
            .iter()
            .filter(|e| e.size < 0)
            .count()
    }
}

/// Writes the fields set in `data` onto `entry`.
fn apply(entry: &mut CacheEntry, data: &EntryData) {
    if let Some(size) = data.size {
        entry.size = size;
    }
    if let Some(mtime) = data.mtime {
        entry.mtime = mtime;
    }
    if let Some(storage_mtime) = data.storage_mtime {
        entry.storage_mtime = storage_mtime;
    }
    if let Some(mimetype) = &data.mimetype {
        entry.mimetype.clone_from(mimetype);
        entry.mimepart = mimetype.split('/').next().unwrap_or_default().to_string();
    }
    if let Some(etag) = &data.etag {
        entry.etag.clone_from(etag);
    }
    if let Some(permissions) = data.permissions {
        entry.permissions = permissions;
    }
    entry.status = if entry.size < 0 {
        ScanStatus::Shallow
    } else {
        ScanStatus::Complete
    };
}

impl FileCache for MemoryCache {
    fn numeric_storage_id(&self) -> StorageId {
        self.storage_id
    }

    fn get(&self, file: FileRef<'_>) -> CacheResult<Option<CacheEntry>> {
        let tables = self.tables.read();
        match file {
            FileRef::Id(id) => Ok(tables.id_to_entry.get(&id).cloned()),
            FileRef::Path(p) => {
                let p = path::normalize(p);
                if let Some(entry) = tables.entry_at(&p) {
                    return Ok(Some(entry.clone()));
                }
                Ok(tables
                    .partial
                    .get(&p)
                    .map(|data| self.partial_entry(&p, data)))
            }
        }
    }

    fn get_folder_contents(&self, folder: &str) -> CacheResult<Vec<CacheEntry>> {
        let folder = path::normalize(folder);
        let tables = self.tables.read();
        Ok(tables
            .path_to_id
            .get(&folder)
            .map(|id| tables.children(*id))
            .unwrap_or_default())
    }

    fn get_folder_contents_by_id(&self, folder_id: FileId) -> CacheResult<Vec<CacheEntry>> {
        Ok(self.tables.read().children(folder_id))
    }

    fn put(&self, path: &str, data: &EntryData) -> CacheResult<Option<FileId>> {
        let path = path::normalize(path);
        if let Some(id) = self.get_id(&path)? {
            self.update(id, data)?;
            return Ok(Some(id));
        }

        let mut merged = self
            .tables
            .read()
            .partial
            .get(&path)
            .cloned()
            .unwrap_or_default();
        merged.merge(data);
        if merged.missing_required_field().is_some() {
            tracing::trace!(path = %path, "Recording partial cache entry");
            self.tables.write().partial.insert(path, merged);
            return Ok(None);
        }
        self.insert(&path, &merged).map(Some)
    }

    fn insert(&self, path: &str, data: &EntryData) -> CacheResult<FileId> {
        let path = path::normalize(path);
        let mut tables = self.tables.write();
        if tables.path_to_id.contains_key(&path) {
            return Err(CacheError::already_exists(path));
        }

        let mut merged = tables.partial.get(&path).cloned().unwrap_or_default();
        merged.merge(data);
        if let Some(field) = merged.missing_required_field() {
            return Err(CacheError::MissingField { path, field });
        }

        let parent = path::parent(&path).and_then(|p| tables.path_to_id.get(&p).copied());
        let id = self.allocate_id();
        let entry = self.build_entry(id, &path, parent, &merged);
        tables.partial.remove(&path);
        tables.path_to_id.insert(path.clone(), id);
        tables.id_to_entry.insert(id, entry);
        tracing::debug!(storage = self.storage_id, id, path = %path, "Inserted cache entry");
        Ok(id)
    }

    fn update(&self, id: FileId, data: &EntryData) -> CacheResult<()> {
        let mut tables = self.tables.write();
        let entry = tables
            .id_to_entry
            .get_mut(&id)
            .ok_or_else(|| CacheError::not_found(format!("#{id}")))?;
        apply(entry, data);
        Ok(())
    }

    fn get_id(&self, path: &str) -> CacheResult<Option<FileId>> {
        let path = path::normalize(path);
        Ok(self.tables.read().path_to_id.get(&path).copied())
    }

    fn get_parent_id(&self, path: &str) -> CacheResult<Option<FileId>> {
        match path::parent(&path::normalize(path)) {
            Some(parent) => self.get_id(&parent),
            None => Ok(None),
        }
    }

    fn in_cache(&self, path: &str) -> CacheResult<bool> {
        Ok(self.get_id(path)?.is_some())
    }

    fn remove(&self, path: &str) -> CacheResult<()> {
        let root = path::normalize(path);
        let mut tables = self.tables.write();
        let doomed = tables.ids_within(&root);
        for (p, id) in &doomed {
            tables.path_to_id.remove(p);
            tables.id_to_entry.remove(id);
        }
        tables.partial.retain(|p, _| !path::is_within(p, &root));
        tracing::debug!(
            storage = self.storage_id,
            path = %root,
            removed = doomed.len(),
            "Removed cache subtree"
        );
        Ok(())
    }

    fn move_entry(&self, source: &str, target: &str) -> CacheResult<()> {
        let source = path::normalize(source);
        let target = path::normalize(target);
        if source == target {
            return Ok(());
        }

        let mut tables = self.tables.write();
        let Some(&root_id) = tables.path_to_id.get(&source) else {
            return Err(CacheError::not_found(source));
        };
        if tables.path_to_id.contains_key(&target) {
            return Err(CacheError::already_exists(target));
        }
        if path::is_within(&target, &source) {
            return Err(CacheError::Storage(format!(
                "cannot move {source} into its own subtree {target}"
            )));
        }

        let new_parent = path::parent(&target).and_then(|p| tables.path_to_id.get(&p).copied());
        let moved = tables.ids_within(&source);
        for (old_path, id) in &moved {
            let Some(new_path) = path::rebase(old_path, &source, &target) else {
                continue;
            };
            tables.path_to_id.remove(old_path);
            tables.path_to_id.insert(new_path.clone(), *id);
            if let Some(entry) = tables.id_to_entry.get_mut(id) {
                entry.name = path::file_name(&new_path).to_string();
                entry.path = new_path;
                if *id == root_id {
                    entry.parent = new_parent;
                }
            }
        }
        tracing::debug!(
            storage = self.storage_id,
            from = %source,
            to = %target,
            moved = moved.len(),
            "Moved cache subtree"
        );
        Ok(())
    }

    fn move_from_cache(
        &self,
        source_cache: &dyn FileCache,
        source_path: &str,
        target_path: &str,
    ) -> CacheResult<()> {
        if std::ptr::addr_eq(source_cache as *const dyn FileCache, self as *const Self) {
            return self.move_entry(source_path, target_path);
        }
        // same storage seen through another view: move in place, keep ids
        let info = source_cache.get_move_info(source_path);
        if info.storage_id == self.storage_id {
            tracing::debug!(
                storage = self.storage_id,
                from = %info.path,
                "Move within the same storage, using a plain move"
            );
            return self.move_entry(&info.path, target_path);
        }

        let root = source_cache
            .get(FileRef::Path(source_path))?
            .ok_or_else(|| CacheError::not_found(source_path))?;
        let target = path::normalize(target_path);
        if self.in_cache(&target)? {
            return Err(CacheError::already_exists(target));
        }

        let mut pending = vec![(root, target)];
        let mut copied = 0_usize;
        while let Some((entry, target)) = pending.pop() {
            self.insert(&target, &EntryData::from_entry(&entry))?;
            copied += 1;
            if entry.is_folder() {
                for child in source_cache.get_folder_contents_by_id(entry.id)? {
                    let child_target = path::join(&target, &child.name);
                    pending.push((child, child_target));
                }
            }
        }
        source_cache.remove(source_path)?;
        tracing::debug!(
            from_storage = source_cache.numeric_storage_id(),
            to_storage = self.storage_id,
            copied,
            "Moved subtree between caches"
        );
        Ok(())
    }

    fn get_move_info(&self, path: &str) -> MoveInfo {
        MoveInfo {
            storage_id: self.storage_id,
            path: path::normalize(path),
        }
    }

    fn clear(&self) -> CacheResult<()> {
        let mut tables = self.tables.write();
        tables.path_to_id.clear();
        tables.id_to_entry.clear();
        tables.partial.clear();
        Ok(())
    }

    fn get_status(&self, path: &str) -> CacheResult<ScanStatus> {
        let path = path::normalize(path);
        let tables = self.tables.read();
        if let Some(entry) = tables.entry_at(&path) {
            return Ok(entry.status);
        }
        if tables.partial.contains_key(&path) {
            return Ok(ScanStatus::Partial);
        }
        Ok(ScanStatus::NotFound)
    }

    fn search(&self, pattern: &str) -> CacheResult<Vec<CacheEntry>> {
        let pattern = NamePattern::new(pattern)?;
        Ok(self
            .tables
            .read()
            .ordered()
            .filter(|e| pattern.is_match(&e.name))
            .cloned()
            .collect())
    }

    fn search_by_mime(&self, mimetype: &str) -> CacheResult<Vec<CacheEntry>> {
        let full = mimetype.contains('/');
        Ok(self
            .tables
            .read()
            .ordered()
            .filter(|e| {
                if full {
                    e.mimetype == mimetype
                } else {
                    e.mimepart == mimetype
                }
            })
            .cloned()
            .collect())
    }

    fn search_query(&self, query: &SearchQuery) -> CacheResult<Vec<CacheEntry>> {
        let mut matched = Vec::new();
        for entry in self.tables.read().ordered() {
            if query.operation.matches(entry)? {
                matched.push(entry.clone());
            }
        }
        matched.sort_by(|a, b| query.compare(a, b));
        Ok(query.paginate(matched))
    }

    fn get_all(&self) -> CacheResult<Vec<FileId>> {
        Ok(self.tables.read().path_to_id.values().copied().collect())
    }

    fn get_incomplete(&self) -> CacheResult<Option<String>> {
        Ok(self
            .tables
            .read()
            .id_to_entry
            .values()
            .filter(|e| e.is_folder() && e.size < 0)
            .max_by_key(|e| e.id)
            .map(|e| e.path.clone()))
    }

    fn get_path_by_id(&self, id: FileId) -> CacheResult<Option<String>> {
        Ok(self
            .tables
            .read()
            .id_to_entry
            .get(&id)
            .map(|e| e.path.clone()))
    }

    fn folder_sizes(&self) -> Option<&dyn FolderSizeCache> {
        Some(self)
    }
}

impl FolderSizeCache for MemoryCache {
    fn correct_folder_size(
        &self,
        path: &str,
        data: Option<&CacheEntry>,
        is_background_scan: bool,
    ) -> CacheResult<()> {
        let mut current = path::normalize(path);
        let mut data = data.cloned();
        loop {
            self.calculate_folder_size(&current, data.as_ref())?;
            let Some(parent) = path::parent(&current) else {
                break;
            };
            data = if is_background_scan {
                let Some(parent_data) = self.get(FileRef::Path(&parent))? else {
                    break;
                };
                if parent_data.size < 0 || self.incomplete_children_count(parent_data.id) > 0 {
                    break;
                }
                Some(parent_data)
            } else {
                None
            };
            current = parent;
        }
        Ok(())
    }

    fn calculate_folder_size(&self, path: &str, entry: Option<&CacheEntry>) -> CacheResult<i64> {
        let entry = match entry {
            Some(entry) => entry.clone(),
            None => match self.get(FileRef::Path(path))? {
                Some(entry) => entry,
                None => return Ok(0),
            },
        };
        if !entry.is_folder() || entry.id == 0 {
            return Ok(0);
        }

        let children = self.get_folder_contents_by_id(entry.id)?;
        let total = if children.iter().any(|c| c.size < 0) {
            UNKNOWN_SIZE
        } else {
            children.iter().map(|c| c.size).sum()
        };
        tracing::trace!(path = %entry.path, total, "Recomputed folder size");

        if total != entry.size {
            self.update(
                entry.id,
                &EntryData {
                    size: Some(total),
                    ..EntryData::default()
                },
            )?;
        }
        Ok(total)
    }
}
