//! Cache entry model.
//!
//! A [`CacheEntry`] is a fixed-shape record describing one file or folder on
//! a storage. [`EntryData`] is the partial form accepted by insert and update
//! operations, where every field is optional.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a cache entry. Opaque to callers.
pub type FileId = u64;

/// Numeric identifier of the storage a cache belongs to.
pub type StorageId = u64;

/// Mimetype used for folders.
pub const FOLDER_MIMETYPE: &str = "httpd/unix-directory";

/// Size value for folders whose size has not been computed yet.
pub const UNKNOWN_SIZE: i64 = -1;

/// Permission bits of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u32);

impl Permissions {
    /// No permissions.
    pub const NONE: Permissions = Permissions(0);
    /// Read access.
    pub const READ: Permissions = Permissions(1);
    /// Update existing content.
    pub const UPDATE: Permissions = Permissions(2);
    /// Create children.
    pub const CREATE: Permissions = Permissions(4);
    /// Delete the entry.
    pub const DELETE: Permissions = Permissions(8);
    /// Share the entry.
    pub const SHARE: Permissions = Permissions(16);
    /// All permissions.
    pub const ALL: Permissions = Permissions(31);

    /// Creates permissions from raw bits. Unknown bits are dropped.
    pub const fn from_bits(bits: u32) -> Self {
        Permissions(bits & Self::ALL.0)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if all bits of `other` are set.
    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

/// How completely an entry has been scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// The path is not in the cache.
    NotFound,
    /// Only part of the entry's metadata is known.
    Partial,
    /// The entry is known but its folder size is not computed yet.
    Shallow,
    /// The entry is fully scanned.
    Complete,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanStatus::NotFound => "not_found",
            ScanStatus::Partial => "partial",
            ScanStatus::Shallow => "shallow",
            ScanStatus::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// Metadata for one file or folder.
///
/// The `path` is relative to whatever cache produced the entry. Decorators
/// that change the path namespace rewrite `path` (and `name` only when it
/// is derived from it) but never `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: FileId,
    pub storage_id: StorageId,
    pub path: String,
    pub parent: Option<FileId>,
    pub name: String,
    pub mimetype: String,
    pub mimepart: String,
    pub size: i64,
    pub mtime: i64,
    pub storage_mtime: i64,
    pub etag: String,
    pub permissions: Permissions,
    pub status: ScanStatus,
}

impl CacheEntry {
    /// Returns true if this entry is a folder.
    pub fn is_folder(&self) -> bool {
        self.mimetype == FOLDER_MIMETYPE
    }
}

/// Partial entry metadata used by insert, update and put.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryData {
    pub size: Option<i64>,
    pub mtime: Option<i64>,
    pub storage_mtime: Option<i64>,
    pub mimetype: Option<String>,
    pub etag: Option<String>,
    pub permissions: Option<Permissions>,
}

impl EntryData {
    /// Data for a file with a known size.
    pub fn file(size: i64, mtime: i64, mimetype: impl Into<String>) -> Self {
        Self {
            size: Some(size),
            mtime: Some(mtime),
            mimetype: Some(mimetype.into()),
            ..Self::default()
        }
    }

    /// Data for a folder whose size is not computed yet.
    pub fn folder(mtime: i64) -> Self {
        Self {
            size: Some(UNKNOWN_SIZE),
            mtime: Some(mtime),
            mimetype: Some(FOLDER_MIMETYPE.to_string()),
            ..Self::default()
        }
    }

    /// Sets the etag.
    #[must_use]
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Sets the size.
    #[must_use]
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the permissions.
    #[must_use]
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Returns the name of the first field a complete entry needs that is
    /// missing here, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        if self.size.is_none() {
            Some("size")
        } else if self.mtime.is_none() {
            Some("mtime")
        } else if self.mimetype.is_none() {
            Some("mimetype")
        } else {
            None
        }
    }

    /// Merges `other` on top of `self`, keeping fields `other` leaves unset.
    pub fn merge(&mut self, other: &EntryData) {
        if other.size.is_some() {
            self.size = other.size;
        }
        if other.mtime.is_some() {
            self.mtime = other.mtime;
        }
        if other.storage_mtime.is_some() {
            self.storage_mtime = other.storage_mtime;
        }
        if other.mimetype.is_some() {
            self.mimetype.clone_from(&other.mimetype);
        }
        if other.etag.is_some() {
            self.etag.clone_from(&other.etag);
        }
        if other.permissions.is_some() {
            self.permissions = other.permissions;
        }
    }

    /// Captures all fields of an existing entry.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            size: Some(entry.size),
            mtime: Some(entry.mtime),
            storage_mtime: Some(entry.storage_mtime),
            mimetype: Some(entry.mimetype.clone()),
            etag: Some(entry.etag.clone()),
            permissions: Some(entry.permissions),
        }
    }
}

/// Identifies an entry either by path or by numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef<'a> {
    /// Lookup by path in the cache's own namespace.
    Path(&'a str),
    /// Lookup by numeric id.
    Id(FileId),
}

impl<'a> From<&'a str> for FileRef<'a> {
    fn from(path: &'a str) -> Self {
        FileRef::Path(path)
    }
}

impl<'a> From<&'a String> for FileRef<'a> {
    fn from(path: &'a String) -> Self {
        FileRef::Path(path.as_str())
    }
}

impl From<FileId> for FileRef<'_> {
    fn from(id: FileId) -> Self {
        FileRef::Id(id)
    }
}

/// Where an entry lives, for cross-storage move orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    /// Numeric id of the storage holding the entry.
    pub storage_id: StorageId,
    /// Path of the entry within that storage.
    pub path: String,
}
