/// Placeholder parsing for `[[name]]` templates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const OPEN: &str = "[[";
const CLOSE: &str = "]]";

/// Separates literal alternatives: `big|huge|vast`.
pub const ALTERNATIVE_SEPARATOR: char = '|';

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderItem {
    /// Literal text, one alternative chosen uniformly each time it is read.
    Literal(Vec<String>),
    /// Reference to a named table: `[[name]]`.
    TableReference(String),
}

impl PlaceholderItem {
    /// Build a literal from raw text, splitting it on `|`.
    pub fn literal(text: &str) -> Self {
        PlaceholderItem::Literal(
            text.split(ALTERNATIVE_SEPARATOR)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Pick one alternative of a literal. References have no text of their own.
    pub fn literal_text(&self, rng: &mut StdRng) -> Option<&str> {
        match self {
            PlaceholderItem::Literal(alternatives) => {
                alternatives.choose(rng).map(String::as_str)
            }
            PlaceholderItem::TableReference(_) => None,
        }
    }

    pub fn table_name(&self) -> Option<&str> {
        match self {
            PlaceholderItem::TableReference(name) => Some(name),
            PlaceholderItem::Literal(_) => None,
        }
    }
}

/// Location of a placeholder inside a string, in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderMatch<'a> {
    /// Offset of the opening `[[`.
    pub start: usize,
    /// Offset just past the closing `]]`.
    pub end: usize,
    /// Text between the brackets.
    pub name: &'a str,
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'|')
}

/// Find the leftmost `[[...]]` whose contents are letters, digits, `_`, `-` or `|`.
///
/// Brackets around anything else are not placeholders and stay in the text.
pub fn find_placeholder(text: &str) -> Option<PlaceholderMatch<'_>> {
    let bytes = text.as_bytes();
    let mut from = 0;

    while let Some(offset) = text[from..].find(OPEN) {
        let start = from + offset;
        let name_start = start + OPEN.len();
        let mut name_end = name_start;
        while name_end < bytes.len() && is_name_char(bytes[name_end]) {
            name_end += 1;
        }
        if text[name_end..].starts_with(CLOSE) {
            return Some(PlaceholderMatch {
                start,
                end: name_end + CLOSE.len(),
                name: &text[name_start..name_end],
            });
        }
        from = start + 1;
    }
    None
}

pub fn contains_placeholder(text: &str) -> bool {
    find_placeholder(text).is_some()
}

/// Split a template into literal and table-reference items.
///
/// `"Hello [[name]]!"` becomes `Literal(["Hello "])`, `TableReference("name")`,
/// `Literal(["!"])`. Adjacent placeholders produce no empty literal between them.
pub fn parse(raw: &str) -> Vec<PlaceholderItem> {
    let mut items = Vec::new();
    let mut rest = raw;

    while let Some(m) = find_placeholder(rest) {
        if m.start > 0 {
            items.push(PlaceholderItem::literal(&rest[..m.start]));
        }
        items.push(PlaceholderItem::TableReference(m.name.to_string()));
        rest = &rest[m.end..];
    }

    if !rest.is_empty() {
        items.push(PlaceholderItem::literal(rest));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn lit(parts: &[&str]) -> PlaceholderItem {
        PlaceholderItem::Literal(parts.iter().map(|s| s.to_string()).collect())
    }

    fn reference(name: &str) -> PlaceholderItem {
        PlaceholderItem::TableReference(name.to_string())
    }

    #[test]
    fn parse_literal_only() {
        assert_eq!(parse("Hello, world."), vec![lit(&["Hello, world."])]);
    }

    #[test]
    fn parse_surrounded_reference() {
        assert_eq!(
            parse("Hello [[name]]!"),
            vec![lit(&["Hello "]), reference("name"), lit(&["!"])]
        );
    }

    #[test]
    fn parse_adjacent_references() {
        assert_eq!(parse("[[a]][[b]]"), vec![reference("a"), reference("b")]);
    }

    #[test]
    fn parse_empty_string() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn parse_splits_literal_alternatives() {
        assert_eq!(
            parse("a big|huge [[thing]]"),
            vec![lit(&["a big", "huge "]), reference("thing")]
        );
    }

    #[test]
    fn reference_names_are_not_split() {
        assert_eq!(parse("[[left|right]]"), vec![reference("left|right")]);
    }

    #[test]
    fn reference_name_charset() {
        assert_eq!(
            parse("[[Snake_case-99]]"),
            vec![reference("Snake_case-99")]
        );
    }

    #[test]
    fn malformed_placeholders_stay_literal() {
        assert_eq!(parse("[[two words]]"), vec![lit(&["[[two words]]"])]);
        assert_eq!(parse("[[open"), vec![lit(&["[[open"])]);
        assert_eq!(parse("[single]"), vec![lit(&["[single]"])]);
    }

    #[test]
    fn leftmost_valid_match_wins() {
        assert_eq!(
            parse("[[[inner]]]"),
            vec![lit(&["["]), reference("inner"), lit(&["]"])]
        );
    }

    #[test]
    fn empty_brackets_are_a_reference() {
        assert_eq!(parse("x[[]]y"), vec![lit(&["x"]), reference(""), lit(&["y"])]);
    }

    #[test]
    fn find_placeholder_offsets() {
        let m = find_placeholder("ab [[cd]] ef").unwrap();
        assert_eq!(m.start, 3);
        assert_eq!(m.end, 9);
        assert_eq!(m.name, "cd");
    }

    #[test]
    fn find_placeholder_after_multibyte_text() {
        let text = "café [[drink]]";
        let m = find_placeholder(text).unwrap();
        assert_eq!(&text[m.start..m.end], "[[drink]]");
    }

    #[test]
    fn contains_placeholder_detects() {
        assert!(contains_placeholder("a [[b]] c"));
        assert!(!contains_placeholder("a [b] c"));
    }

    #[test]
    fn literal_text_picks_alternatives() {
        let item = PlaceholderItem::literal("red|blue");
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            seen.insert(item.literal_text(&mut rng).unwrap().to_string());
        }
        assert_eq!(seen.len(), 2);
        assert!(seen.contains("red") && seen.contains("blue"));
    }

    #[test]
    fn reference_has_no_literal_text() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(reference("x").literal_text(&mut rng).is_none());
        assert_eq!(reference("x").table_name(), Some("x"));
    }
}
