//! Structured search queries.
//!
//! A [`SearchQuery`] is an operation tree over entry fields plus ordering,
//! pagination and the acting user. Cache implementations evaluate the tree
//! with [`SearchOperation::matches`]; decorators may rewrite pagination
//! before delegating.

use crate::entry::CacheEntry;
use crate::error::{CacheError, CacheResult};
use globset::{GlobBuilder, GlobMatcher};
use std::cmp::Ordering;

/// Entry field a comparison or ordering refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
    Path,
    Mimetype,
    Size,
    Mtime,
    Etag,
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    /// SQL-LIKE style match: `%` or `*` for any run, `_` or `?` for one char.
    Like,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
}

/// Literal value a field is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchValue {
    Text(String),
    Int(i64),
}

impl From<&str> for SearchValue {
    fn from(value: &str) -> Self {
        SearchValue::Text(value.to_string())
    }
}

impl From<i64> for SearchValue {
    fn from(value: i64) -> Self {
        SearchValue::Int(value)
    }
}

/// Operation tree of a search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOperation {
    /// Matches every entry.
    All,
    And(Vec<SearchOperation>),
    Or(Vec<SearchOperation>),
    Not(Box<SearchOperation>),
    Compare {
        field: SearchField,
        comparison: Comparison,
        value: SearchValue,
    },
}

impl SearchOperation {
    /// Builds a single field comparison.
    pub fn compare(
        field: SearchField,
        comparison: Comparison,
        value: impl Into<SearchValue>,
    ) -> Self {
        SearchOperation::Compare {
            field,
            comparison,
            value: value.into(),
        }
    }

    /// Evaluates the tree against one entry.
    ///
    /// An invalid `Like` pattern is reported as an error rather than
    /// treated as a non-match.
    pub fn matches(&self, entry: &CacheEntry) -> CacheResult<bool> {
        match self {
            SearchOperation::All => Ok(true),
            SearchOperation::And(ops) => {
                for op in ops {
                    if !op.matches(entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            SearchOperation::Or(ops) => {
                for op in ops {
                    if op.matches(entry)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            SearchOperation::Not(op) => Ok(!op.matches(entry)?),
            SearchOperation::Compare {
                field,
                comparison,
                value,
            } => compare_field(entry, *field, *comparison, value),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One ordering key of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOrder {
    pub field: SearchField,
    pub direction: Direction,
}

impl SearchOrder {
    pub fn asc(field: SearchField) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: SearchField) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }
}

/// A structured search with ordering and pagination.
///
/// `limit: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub operation: SearchOperation,
    pub order: Vec<SearchOrder>,
    pub limit: Option<usize>,
    pub offset: usize,
    /// The user on whose behalf the search runs.
    pub user: Option<String>,
}

impl SearchQuery {
    /// Creates an unordered, unbounded query.
    pub fn new(operation: SearchOperation) -> Self {
        Self {
            operation,
            order: Vec::new(),
            limit: None,
            offset: 0,
            user: None,
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: SearchOrder) -> Self {
        self.order.push(order);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Returns a copy of this query with pagination disabled.
    #[must_use]
    pub fn unpaginated(&self) -> Self {
        Self {
            limit: None,
            offset: 0,
            ..self.clone()
        }
    }

    /// Compares two entries by this query's ordering keys.
    ///
    /// Entries equal on every key compare equal, so a stable sort keeps
    /// their incoming order.
    pub fn compare(&self, a: &CacheEntry, b: &CacheEntry) -> Ordering {
        for order in &self.order {
            let ord = compare_values(a, b, order.field);
            let ord = match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    /// Applies this query's offset and limit to an already ordered sequence.
    pub fn paginate<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let iter = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

/// Case-insensitive name matcher for SQL-LIKE / glob style patterns.
#[derive(Debug, Clone)]
pub struct NamePattern {
    matcher: GlobMatcher,
}

impl NamePattern {
    /// Compiles a pattern. `%` and `*` match any run of characters, `_` and
    /// `?` match exactly one; every other character is literal.
    pub fn new(pattern: &str) -> CacheResult<Self> {
        let glob = like_to_glob(pattern);
        let matcher = GlobBuilder::new(&glob)
            .case_insensitive(true)
            .literal_separator(false)
            .backslash_escape(false)
            .build()
            .map_err(|source| CacheError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();
        Ok(Self { matcher })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

fn like_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' | '*' if glob.ends_with('*') => {}
            '%' | '*' => glob.push('*'),
            '_' | '?' => glob.push('?'),
            '[' | ']' | '{' | '}' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            _ => glob.push(c),
        }
    }
    glob
}

fn text_field(entry: &CacheEntry, field: SearchField) -> Option<&str> {
    match field {
        SearchField::Name => Some(&entry.name),
        SearchField::Path => Some(&entry.path),
        SearchField::Mimetype => Some(&entry.mimetype),
        SearchField::Etag => Some(&entry.etag),
        SearchField::Size | SearchField::Mtime => None,
    }
}

fn int_field(entry: &CacheEntry, field: SearchField) -> Option<i64> {
    match field {
        SearchField::Size => Some(entry.size),
        SearchField::Mtime => Some(entry.mtime),
        _ => None,
    }
}

fn compare_values(a: &CacheEntry, b: &CacheEntry, field: SearchField) -> Ordering {
    match (int_field(a, field), int_field(b, field)) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => text_field(a, field).cmp(&text_field(b, field)),
    }
}

fn compare_field(
    entry: &CacheEntry,
    field: SearchField,
    comparison: Comparison,
    value: &SearchValue,
) -> CacheResult<bool> {
    let ord = match (value, int_field(entry, field), text_field(entry, field)) {
        (SearchValue::Text(pattern), _, Some(text)) if comparison == Comparison::Like => {
            return Ok(NamePattern::new(pattern)?.is_match(text));
        }
        (SearchValue::Int(v), Some(actual), _) => actual.cmp(v),
        (SearchValue::Text(v), _, Some(actual)) => actual.cmp(v.as_str()),
        _ => return Ok(false),
    };

    Ok(match comparison {
        Comparison::Equal => ord == Ordering::Equal,
        Comparison::GreaterThan => ord == Ordering::Greater,
        Comparison::GreaterThanEqual => ord != Ordering::Less,
        Comparison::LessThan => ord == Ordering::Less,
        Comparison::LessThanEqual => ord != Ordering::Greater,
        // Like on a numeric field
        Comparison::Like => false,
    })
}
