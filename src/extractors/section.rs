// src/extractors/section.rs
//! Anchor-bounded section extraction.
//!
//! Sections are not syntactically delimited in the source documents: the
//! only boundaries are the in-body anchors the index table links to, and
//! sub-headings inside a section are distinguishable from body text only by
//! stylistic cues (bold/underline markers, numeric font weights). The
//! extractor therefore walks forward from the start anchor with a
//! sibling/parent-climbing traversal, accumulating text under the most
//! recent sub-heading until it reaches the end anchor.

use crate::utils::text::clean_cell_text;
use once_cell::sync::Lazy;
use regex::Regex;
use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td, th").expect("Failed to compile CELL_SELECTOR"));

// Matches inline numeric font weights ("font-weight: 700"); 700+ reads as a
// sub-heading cue alongside the literal bold/underline markers.
static FONT_WEIGHT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"font-weight:\s*(\d{3})").expect("Failed to compile FONT_WEIGHT_RE"));

const SUBHEADING_FONT_WEIGHT: u32 = 700;

type DomNode<'a> = NodeRef<'a, Node>;

/// Extracts the content between two anchors as a sub-heading → text map.
///
/// A missing start or end anchor (or both ids resolving to the same node)
/// yields an empty map: "no content", never an error. `end_href` of `None`
/// means extract to the end of the document.
pub fn extract_between_anchors(
    document: &Html,
    start_href: &str,
    end_href: Option<&str>,
) -> HashMap<String, String> {
    let start_id = start_href.trim_start_matches('#');
    let end_id = end_href.map(|href| href.trim_start_matches('#'));

    let mut sections = HashMap::new();

    let Some(start_node) = find_node_by_id(document, start_id) else {
        return sections;
    };
    let end_node = match end_id {
        Some(id) => match find_node_by_id(document, id) {
            Some(node) => Some(node),
            None => return sections,
        },
        None => None,
    };

    let mut current_key = String::new();
    let mut current = Some(start_node);

    while let Some(node) = current {
        if let Some(end) = end_node {
            if node.id() == end.id() {
                break;
            }
        }

        if let Some(element) = ElementRef::wrap(node) {
            // The end anchor may be nested inside a container rather than
            // appearing as a sibling boundary; stop before descending past it.
            if let Some(id) = end_id {
                if element.inner_html().contains(id) {
                    break;
                }
            }

            if element.value().name() == "table" {
                fold_table(element, &mut sections);
            } else {
                let text = clean_cell_text(&element.text().collect::<String>());
                if !text.is_empty() {
                    if is_subheading(element) {
                        current_key = text;
                        sections.entry(current_key.clone()).or_default();
                    } else {
                        append_under_key(&mut sections, &current_key, &text);
                    }
                }
            }
        } else if let Node::Text(text_node) = node.value() {
            let text = clean_cell_text(&text_node.text);
            if !text.is_empty() {
                append_under_key(&mut sections, &current_key, &text);
            }
        }

        current = next_node(node);
    }

    sections
}

/// Sub-heading detection: inline bold/underline markers, or a numeric font
/// weight at or above 700, anywhere in the element's HTML.
fn is_subheading(element: ElementRef<'_>) -> bool {
    let html = element.html();
    if html.contains("font-weight:bold") || html.contains("text-decoration:underline") {
        return true;
    }
    FONT_WEIGHT_RE
        .captures(&html)
        .and_then(|captures| captures[1].parse::<u32>().ok())
        .is_some_and(|weight| weight >= SUBHEADING_FONT_WEIGHT)
}

fn append_under_key(sections: &mut HashMap<String, String>, key: &str, text: &str) {
    let entry = sections.entry(key.to_string()).or_default();
    if !entry.is_empty() {
        entry.push(' ');
    }
    entry.push_str(text);
}

/// Folds an embedded table into the section map: the first row's cells are
/// keys, each later row's cells are values accumulated under those keys.
fn fold_table(table: ElementRef<'_>, sections: &mut HashMap<String, String>) {
    let mut rows = table.select(&ROW_SELECTOR);
    let Some(header_row) = rows.next() else {
        return;
    };
    let keys: Vec<String> = header_row
        .select(&CELL_SELECTOR)
        .map(|cell| clean_cell_text(&cell.text().collect::<String>()))
        .collect();
    if keys.is_empty() {
        return;
    }

    for row in rows {
        for (i, cell) in row.select(&CELL_SELECTOR).enumerate() {
            let Some(key) = keys.get(i) else {
                break;
            };
            let value = clean_cell_text(&cell.text().collect::<String>());
            if value.is_empty() {
                continue;
            }
            append_under_key(sections, key, &value);
        }
    }
}

/// Pre-order continuation without descent: next sibling, else climb parents
/// until one has a next sibling. Page-break markers and stray
/// "Table of Contents" back-references are stepped over.
fn next_node(node: DomNode<'_>) -> Option<DomNode<'_>> {
    let mut current = node;
    while current.next_sibling().is_none() {
        current = current.parent()?;
    }

    let mut next = current.next_sibling();
    while let Some(candidate) = next {
        if is_skippable(candidate) {
            next = candidate.next_sibling();
        } else {
            break;
        }
    }
    next
}

fn is_skippable(node: DomNode<'_>) -> bool {
    let Some(element) = ElementRef::wrap(node) else {
        return false;
    };
    if element
        .value()
        .attr("style")
        .is_some_and(|style| style.contains("page-break-after:always"))
    {
        return true;
    }
    element.value().name() == "div"
        && element
            .text()
            .collect::<String>()
            .contains("Table of Contents")
}

fn find_node_by_id<'a>(document: &'a Html, id: &str) -> Option<DomNode<'a>> {
    document.root_element().descendants().find(|node| {
        ElementRef::wrap(*node).is_some_and(|el| el.value().attr("id") == Some(id))
    })
}
