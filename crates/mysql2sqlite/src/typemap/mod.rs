//! Type mapping between MySQL and SQLite.
//!
//! The mapping is lexical, not semantic: SQLite accepts any type name and
//! derives a storage affinity from it, so MySQL type strings are passed
//! through as-is except for qualifiers SQLite's grammar rejects.

/// Qualifier tokens dropped from MySQL column types.
const DROPPED_QUALIFIERS: &[&str] = &["unsigned"];

/// Map a raw MySQL column type to a SQLite column type.
///
/// Removes the `unsigned` token and trims surrounding whitespace; all other
/// tokens pass through unchanged.
pub fn map_column_type(raw_type: &str) -> String {
    raw_type
        .split_whitespace()
        .filter(|token| {
            !DROPPED_QUALIFIERS
                .iter()
                .any(|q| q.eq_ignore_ascii_case(token))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parsed MySQL column type, used to pick a decoder for row values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceType {
    /// Lowercase base type name without length, e.g. `varchar`.
    pub base: String,

    /// Whether the `unsigned` qualifier is present.
    pub unsigned: bool,
}

impl SourceType {
    /// Parse a raw type such as `int(10) unsigned zerofill`.
    pub fn parse(raw_type: &str) -> Self {
        let lower = raw_type.trim().to_lowercase();
        let base = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string();
        let unsigned = lower.split_whitespace().any(|t| t == "unsigned");
        Self { base, unsigned }
    }
}
