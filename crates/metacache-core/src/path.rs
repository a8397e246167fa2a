//! Path helpers for cache keys.
//!
//! Cache paths use `/` as the separator regardless of the host OS and never
//! carry a leading or trailing slash. The storage root is the empty string.

use relative_path::RelativePath;

/// Normalizes a cache path by stripping leading and trailing slashes.
///
/// # Examples
///
/// ```
/// use metacache_core::path::normalize;
///
/// assert_eq!(normalize("/files/report.txt"), "files/report.txt");
/// assert_eq!(normalize("files/"), "files");
/// assert_eq!(normalize("/"), "");
/// ```
pub fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

/// Returns the parent of a normalized cache path.
///
/// Returns `None` for the root path; top-level entries have the root (`""`)
/// as their parent.
///
/// # Examples
///
/// ```
/// use metacache_core::path::parent;
///
/// assert_eq!(parent("photos/a.jpg").as_deref(), Some("photos"));
/// assert_eq!(parent("photos").as_deref(), Some(""));
/// assert_eq!(parent(""), None);
/// ```
pub fn parent(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    RelativePath::new(path)
        .parent()
        .map(|p| p.as_str().to_string())
}

/// Returns the final component of a normalized cache path.
///
/// The root path has an empty name.
pub fn file_name(path: &str) -> &str {
    RelativePath::new(path).file_name().unwrap_or("")
}

/// Returns true if `path` is `ancestor` itself or lies beneath it.
///
/// The empty ancestor (the storage root) contains every path.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor.is_empty() || path == ancestor {
        return true;
    }
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Rewrites `path` from under `from` to under `to`.
///
/// Returns `None` if `path` is not within `from`.
///
/// # Examples
///
/// ```
/// use metacache_core::path::rebase;
///
/// assert_eq!(rebase("a/b/c.txt", "a/b", "x").as_deref(), Some("x/c.txt"));
/// assert_eq!(rebase("a/b", "a/b", "x").as_deref(), Some("x"));
/// assert_eq!(rebase("a/bc", "a/b", "x"), None);
/// ```
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if !is_within(path, from) {
        return None;
    }
    let rest = if from.is_empty() {
        path
    } else {
        path[from.len()..].trim_start_matches('/')
    };
    Some(join(to, rest))
}

/// Joins two normalized cache paths, treating empty components as the root.
pub fn join(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{rest}"),
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn rel_path() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z0-9]{1,6}", 0..4).prop_map(|parts| parts.join("/"))
    }

    proptest! {
        /// Moving a subtree and moving it back restores every path.
        #[test]
        fn rebase_is_reversible(from in rel_path(), to in rel_path(), rest in rel_path()) {
            let path = join(&from, &rest);
            let moved = rebase(&path, &from, &to).unwrap();
            prop_assert_eq!(rebase(&moved, &to, &from), Some(path));
        }

        #[test]
        fn parent_of_join_is_base(base in rel_path(), name in "[a-z0-9]{1,6}") {
            let child = join(&base, &name);
            prop_assert_eq!(parent(&child), Some(base));
            prop_assert_eq!(file_name(&child), name.as_str());
        }
    }
}
