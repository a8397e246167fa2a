//! Translation between jailed-relative and source-absolute paths.
//!
//! A jail root of `photos/2023` maps the jailed path `a.jpg` to the source
//! path `photos/2023/a.jpg` and back. Source paths outside the root have no
//! jailed form. An empty root is pass-through: both directions are identity.

/// Path translator for one jail root.
///
/// # Example
///
/// ```
/// use metacache_jail::JailPath;
///
/// let jail = JailPath::new("photos/2023");
/// assert_eq!(jail.to_source("a.jpg"), "photos/2023/a.jpg");
/// assert_eq!(jail.to_source(""), "photos/2023");
/// assert_eq!(jail.to_jailed("photos/2023/a.jpg"), Some("a.jpg"));
/// assert_eq!(jail.to_jailed("photos/2023"), Some(""));
/// assert_eq!(jail.to_jailed("photos/2024/b.jpg"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JailPath {
    root: String,
}

impl JailPath {
    /// Creates a translator for `root`. Leading and trailing slashes are
    /// dropped, so `/shared/` and `shared` are the same jail.
    ///
    /// Source paths are expected in normalized form, without leading or
    /// trailing slashes, as every `metacache_core` cache stores them.
    pub fn new(root: impl AsRef<str>) -> Self {
        Self {
            root: root.as_ref().trim_matches('/').to_string(),
        }
    }

    /// The source-absolute root of the jail.
    #[inline]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns true if the jail does not restrict anything.
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.root.is_empty()
    }

    /// Converts a jailed-relative path to its source-absolute form.
    ///
    /// Leading and trailing slashes on `relative` are ignored. Never fails.
    pub fn to_source(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else if self.root.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{relative}", self.root)
        }
    }

    /// Converts a source-absolute path to its jailed-relative form.
    ///
    /// Returns `None` if `source` lies outside the jail.
    pub fn to_jailed<'a>(&self, source: &'a str) -> Option<&'a str> {
        if self.root.is_empty() {
            return Some(source);
        }
        let rest = source.strip_prefix(self.root.as_str())?;
        if rest.is_empty() {
            Some("")
        } else {
            rest.strip_prefix('/')
        }
    }

    /// Returns true if `source` is the jail root or lies beneath it.
    pub fn contains(&self, source: &str) -> bool {
        self.to_jailed(source).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_identity() {
        let jail = JailPath::new("shared");
        assert_eq!(jail.to_source(""), "shared");
        assert_eq!(jail.to_jailed("shared"), Some(""));
    }

    #[test]
    fn test_leading_slash_is_stripped() {
        let jail = JailPath::new("shared");
        assert_eq!(jail.to_source("/docs/a.txt"), "shared/docs/a.txt");
        assert_eq!(jail.to_source("/"), "shared");
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        let jail = JailPath::new("shared");
        assert_eq!(jail.to_source("docs/"), "shared/docs");
        assert_eq!(jail.to_source("//"), "shared");
        assert_eq!(JailPath::new("").to_source("/docs/"), "docs");
    }

    #[test]
    fn test_root_is_normalized() {
        assert_eq!(JailPath::new("/shared/").root(), "shared");
        assert_eq!(JailPath::new("/"), JailPath::new(""));
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_outside() {
        let jail = JailPath::new("shared");
        assert_eq!(jail.to_jailed("shared2/a.txt"), None);
        assert_eq!(jail.to_jailed("sharedfile"), None);
        assert_eq!(jail.to_jailed("share"), None);
        assert_eq!(jail.to_jailed(""), None);
        assert!(!jail.contains("other/shared"));
    }

    #[test]
    fn test_passthrough() {
        let jail = JailPath::new("");
        assert!(jail.is_passthrough());
        assert_eq!(jail.to_source("a/b"), "a/b");
        assert_eq!(jail.to_source(""), "");
        assert_eq!(jail.to_jailed("a/b"), Some("a/b"));
        assert_eq!(jail.to_jailed(""), Some(""));
    }

    #[test]
    fn test_nested_root() {
        let jail = JailPath::new("photos/2023");
        assert_eq!(jail.to_jailed("photos/2023/trip/x.jpg"), Some("trip/x.jpg"));
        assert_eq!(jail.to_jailed("photos"), None);
    }
}
