//! Path-indexed file metadata cache.
//!
//! This crate defines the contract shared by every metadata cache layer and
//! ships the primitive in-memory implementation.
//!
//! # Components
//!
//! - [`FileCache`] - The cache contract: lookups, mutations, moves, searches
//! - [`FolderSizeCache`] - Optional folder size capability, probed through
//!   [`FileCache::folder_sizes`]
//! - [`CacheEntry`] / [`EntryData`] - Complete and partial entry metadata
//! - [`SearchQuery`] - Structured search with ordering and pagination
//! - [`MemoryCache`] - In-memory cache for one storage
//! - [`CacheError`] - Error type for cache operations

pub mod cache;
pub mod entry;
pub mod error;
pub mod memory;
pub mod path;
pub mod search;

pub use cache::{FileCache, FolderSizeCache};
pub use entry::{
    CacheEntry, EntryData, FOLDER_MIMETYPE, FileId, FileRef, MoveInfo, Permissions, ScanStatus,
    StorageId, UNKNOWN_SIZE,
};
pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use search::{
    Comparison, Direction, NamePattern, SearchField, SearchOperation, SearchOrder, SearchQuery,
    SearchValue,
};
