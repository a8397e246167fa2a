//! Jailed views over a file metadata cache.
//!
//! A jail makes one subtree of a [`FileCache`](metacache_core::FileCache)
//! look like an independent storage root. It is how sub-mounts such as a
//! shared folder or a group folder see only their own metadata.
//!
//! # Components
//!
//! - [`JailPath`] - Translation between jailed-relative and source paths
//! - [`CacheJail`] - The jailed [`FileCache`](metacache_core::FileCache)
//! - [`JailsConfig`] - Named jail roots loaded from TOML
//!
//! # Path namespaces
//!
//! Callers of a jail use *jailed-relative* paths, where `""` is the jail
//! root. The wrapped cache uses *source* paths. Ids are the same in both.
//! Source paths outside the jail have no jailed form, so entries at those
//! paths are never returned:
//!
//! ```
//! use metacache_core::{EntryData, FileCache, MemoryCache};
//! use metacache_jail::CacheJail;
//! use std::sync::Arc;
//!
//! let inner = Arc::new(MemoryCache::new(1));
//! let outside = inner.insert("docs/c.txt", &EntryData::file(1, 0, "text/plain")).unwrap();
//!
//! let jail = CacheJail::new(inner, "photos");
//! assert_eq!(jail.get_path_by_id(outside).unwrap(), None);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod jail;
mod path;

pub use config::{ConfigError, JailConfig, JailsConfig};
pub use jail::CacheJail;
pub use path::JailPath;
