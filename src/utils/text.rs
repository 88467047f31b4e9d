// src/utils/text.rs
//! Text cleanup shared by cell parsing and fuzzy label matching.
//!
//! HTML entities are already decoded by the parser; what reaches these
//! helpers is decoded Unicode text that still carries non-breaking spaces,
//! typographic punctuation and irregular whitespace from the source filings.

/// Folds typographic characters to their ASCII equivalents, drops any other
/// non-ASCII character, and collapses runs of whitespace to a single space.
/// Literal `&nbsp;`/`&#160;` remnants are folded too in case an escaped
/// fragment slipped past the parser.
pub fn clean_cell_text(raw: &str) -> String {
    let unescaped = raw.replace("&nbsp;", " ").replace("&#160;", " ");
    let folded: String = unescaped
        .chars()
        .filter_map(|c| match c {
            '\u{a0}' => Some(' '),                    // non-breaking space
            '\u{2018}' | '\u{2019}' => Some('\''),    // curly single quotes
            '\u{201c}' | '\u{201d}' => Some('"'),     // curly double quotes
            '\u{2013}' | '\u{2014}' => Some('-'),     // en/em dash
            c if c.is_ascii() => Some(c),
            _ => None,
        })
        .collect();
    collapse_whitespace(&folded)
}

/// Collapses all whitespace runs to single spaces and trims the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalizes a label for fuzzy comparison: lowercase, ASCII alphanumerics
/// and single spaces only. Both sides of a comparison must go through this.
pub fn normalize_for_match(text: &str) -> String {
    let kept: String = clean_cell_text(text)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect();
    collapse_whitespace(&kept)
}

/// Normalizes an item code cell ("Item 1A.") to its compact form ("Item1A").
pub fn normalize_item_code(raw: &str) -> String {
    clean_cell_text(raw)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_nbsp_and_typographic_punctuation() {
        assert_eq!(
            clean_cell_text("Management\u{2019}s\u{a0}Discussion \u{2013} Analysis"),
            "Management's Discussion - Analysis"
        );
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
    }

    #[test]
    fn literal_entity_remnants_are_folded() {
        assert_eq!(clean_cell_text("Item&nbsp;8"), "Item 8");
        assert_eq!(clean_cell_text("&#160;"), "");
    }

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_for_match("Risk  Factors."), "risk factors");
        assert_eq!(normalize_for_match("RISK FACTORS"), "risk factors");
        assert_eq!(normalize_for_match(""), "");
    }

    #[test]
    fn item_codes_lose_dots_and_spaces() {
        assert_eq!(normalize_item_code("Item 1A."), "Item1A");
        assert_eq!(normalize_item_code("Item\u{a0}7"), "Item7");
    }
}
