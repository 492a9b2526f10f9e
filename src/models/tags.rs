//! Tag sets and reply normalization.

use std::collections::HashSet;
use std::fmt;

/// Characters treated as quotes around the whole reply or around a tag.
const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{AB}', '\u{BB}'];

/// Separator used whenever a tag set is written back as text.
pub const TAG_SEPARATOR: &str = ", ";

/// Ordered, duplicate-free sequence of uppercase tags.
///
/// A `TagSet` can only be built through normalization, so every instance
/// upholds the invariants: tags are non-empty, trimmed, uppercase, and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<String>,
}

impl TagSet {
    /// Creates an empty tag set.
    #[must_use]
    pub const fn new() -> Self {
        Self { tags: Vec::new() }
    }

    /// Builds a tag set from individual tags, normalizing each one.
    #[must_use]
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        let mut seen = HashSet::new();
        for tag in tags {
            set.push_normalized(tag.as_ref(), &mut seen);
        }
        set
    }

    /// Returns the tags in first-seen order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    /// Iterates over the tags.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.tags.iter()
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Whether the set contains `tag` (compared after normalization).
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        normalize_token(tag).is_some_and(|t| self.tags.contains(&t))
    }

    /// Joins the tags with `", "`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.tags.join(TAG_SEPARATOR)
    }

    fn push_normalized(&mut self, raw: &str, seen: &mut HashSet<String>) {
        if let Some(tag) = normalize_token(raw) {
            if seen.insert(tag.clone()) {
                self.tags.push(tag);
            }
        }
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

/// Normalizes a raw completion reply into a [`TagSet`].
///
/// Strips one leading and one trailing quote from the whole reply, splits on
/// commas, trims and uppercases each piece, drops empties, and removes
/// duplicates keeping the first occurrence. Total: a reply without usable
/// tags yields an empty set.
#[must_use]
pub fn normalize(reply: &str) -> TagSet {
    let trimmed = reply.trim();
    let unquoted = trimmed.strip_prefix(QUOTE_CHARS).unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix(QUOTE_CHARS).unwrap_or(unquoted);

    TagSet::from_tags(unquoted.split(','))
}

/// Normalizes a single tag, returning `None` when nothing is left.
fn normalize_token(raw: &str) -> Option<String> {
    let token = raw.trim_matches(|c: char| c.is_whitespace() || QUOTE_CHARS.contains(&c));
    if token.is_empty() {
        return None;
    }
    Some(token.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(set: &TagSet) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_normalize_dedup_preserves_order() {
        let set = normalize("AI, Tech, AI");
        assert_eq!(tags(&set), vec!["AI", "TECH"]);
    }

    #[test]
    fn test_normalize_case_and_whitespace_duplicates() {
        let set = normalize("  rust , RUST,Rust  ,  tokio");
        assert_eq!(tags(&set), vec!["RUST", "TOKIO"]);
    }

    #[test]
    fn test_normalize_strips_wrapping_quotes() {
        let set = normalize("\"machine learning, 2025, FÉVRIER\"");
        assert_eq!(tags(&set), vec!["MACHINE LEARNING", "2025", "FÉVRIER"]);
    }

    #[test]
    fn test_normalize_strips_quotes_per_tag() {
        let set = normalize(r#""AI", "data""#);
        assert_eq!(tags(&set), vec!["AI", "DATA"]);
    }

    #[test]
    fn test_normalize_empty_reply() {
        assert!(normalize("").is_empty());
        assert!(normalize(" , ,, ").is_empty());
        assert!(normalize("\"\"").is_empty());
    }

    #[test]
    fn test_normalize_idempotent_on_joined() {
        let first = normalize("  \"b\" , a, B,  c ");
        let second = normalize(&first.joined());
        assert_eq!(first, second);
    }

    #[test]
    fn test_unicode_uppercase() {
        let set = normalize("août 2025, été");
        assert_eq!(tags(&set), vec!["AOÛT 2025", "ÉTÉ"]);
    }

    #[test]
    fn test_joined_and_display() {
        let set = TagSet::from_tags(["a", "b"]);
        assert_eq!(set.joined(), "A, B");
        assert_eq!(set.to_string(), "A, B");
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
        assert_eq!(set.len(), 2);
    }
}
