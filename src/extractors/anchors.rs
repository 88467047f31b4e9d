// src/extractors/anchors.rs
//! Anchor indexing: the ordered, deduplicated href list that defines
//! section boundaries.
//!
//! The index table at the top of a filing links every section to an in-body
//! anchor, so the *first* occurrence of each href is the table's own
//! self-reference and the later occurrence marks the real content boundary.
//! Dedup rule: drop the first occurrence of every href, then keep each
//! survivor once, in first-seen order. Hrefs that appear only once have no
//! in-body twin and drop out entirely.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashMap;

static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("Failed to compile ANCHOR_SELECTOR"));

/// Collects every non-empty `href` from the document's `a` elements, in
/// document order.
pub fn collect_hrefs(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the ordered anchor index from raw hrefs (see module docs for the
/// dedup rule). Output values are unique.
pub fn index_anchors<I>(hrefs: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut first_seen: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for href in hrefs {
        let count = counts.entry(href.clone()).or_insert(0);
        if *count == 0 {
            first_seen.push(href);
        }
        *count += 1;
    }

    first_seen
        .into_iter()
        .filter(|href| counts[href] >= 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hrefs(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn repeated_hrefs_survive_once_in_first_seen_order() {
        let input = hrefs(&["#a1", "#b1", "#a1", "#c1", "#a1"]);
        assert_eq!(index_anchors(input), hrefs(&["#a1"]));
    }

    #[test]
    fn single_occurrences_are_dropped() {
        let input = hrefs(&["#toc", "#item1", "#item1", "#item2", "#item2", "#stray"]);
        assert_eq!(index_anchors(input), hrefs(&["#item1", "#item2"]));
    }

    #[test]
    fn empty_input_yields_empty_index() {
        assert!(index_anchors(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn collect_hrefs_skips_anchors_without_href() {
        let html = Html::parse_document(
            r##"<body>
                <a href="#item1">Item 1</a>
                <a id="item1"></a>
                <a href="#item1">back</a>
                <a href="">empty</a>
            </body>"##,
        );
        let collected = collect_hrefs(&html);
        assert_eq!(collected, hrefs(&["#item1", "#item1"]));
        assert_eq!(index_anchors(collected), hrefs(&["#item1"]));
    }
}
