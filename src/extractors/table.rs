// src/extractors/table.rs
//! Index-table location.
//!
//! Filing documents come from many publishing tools with no common DOM
//! shape, so the index table is found by layered heuristics: a text-marker
//! scan first, then a coarser sweep over the body's top-level divs. A
//! document that defeats both is reported unparseable by the caller.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

const INDEX_MARKERS: [&str; 2] = ["INDEX", "TABLE OF CONTENTS"];
const PART_MARKER: &str = "PART";
/// How many siblings past an index marker to examine for the PART heading.
const MARKER_SIBLING_SCAN: usize = 8;

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("Failed to compile BODY_SELECTOR"));

/// Finds the index/table-of-contents table. First heuristic that succeeds
/// wins; `None` means the document layout defeated both.
pub fn locate_index_table(document: &Html) -> Option<ElementRef<'_>> {
    locate_by_marker_text(document).or_else(|| locate_by_body_divs(document))
}

/// Heuristic 1: find a text node carrying an index marker, scan a bounded
/// number of its parent's following siblings for the "PART" heading, then
/// take the next table in document order.
fn locate_by_marker_text(document: &Html) -> Option<ElementRef<'_>> {
    for node in document.root_element().descendants() {
        let is_marker = match node.value() {
            Node::Text(text) => INDEX_MARKERS.iter().any(|m| text.contains(m)),
            _ => false,
        };
        if !is_marker {
            continue;
        }
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let part = parent
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take(MARKER_SIBLING_SCAN)
            .find(|el| el.text().collect::<String>().contains(PART_MARKER));
        if let Some(part) = part {
            if let Some(table) = first_table_after(document, part) {
                tracing::debug!("Located index table via marker-text heuristic");
                return Some(table);
            }
        }
    }
    None
}

/// Heuristic 2: sweep the body's direct `div` children for one whose inner
/// HTML carries an index marker, advance to the next non-blank div, and
/// accept a `table` child directly or nested one level deeper.
fn locate_by_body_divs(document: &Html) -> Option<ElementRef<'_>> {
    let body = document.select(&BODY_SELECTOR).next()?;
    let divs: Vec<ElementRef> = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "div")
        .collect();

    let marker_pos = divs.iter().position(|el| {
        let html = el.inner_html();
        INDEX_MARKERS.iter().any(|m| html.contains(m))
    })?;

    let target = divs
        .iter()
        .skip(marker_pos + 1)
        .find(|el| !el.text().collect::<String>().trim().is_empty())?;

    let table = direct_child_table(*target)
        .or_else(|| {
            target
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|el| el.value().name() == "div")
                .find_map(direct_child_table)
        });
    if table.is_some() {
        tracing::debug!("Located index table via body-div heuristic");
    }
    table
}

fn direct_child_table(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}

fn first_table_after<'a>(document: &'a Html, after: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut past_marker = false;
    for node in document.root_element().descendants() {
        if node.id() == after.id() {
            past_marker = true;
            continue;
        }
        if !past_marker {
            continue;
        }
        if let Some(el) = ElementRef::wrap(node) {
            if el.value().name() == "table" {
                return Some(el);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_text_heuristic_finds_table_after_part_heading() {
        let html = Html::parse_document(
            r#"<body><div>
                <p>TABLE OF CONTENTS</p>
                <p>Some filler</p>
                <p>PART I</p>
                <table id="index"><tr><td>Item 1.</td><td>Business</td></tr></table>
            </div></body>"#,
        );
        let table = locate_index_table(&html).expect("table should be located");
        assert_eq!(table.value().attr("id"), Some("index"));
    }

    #[test]
    fn body_div_heuristic_accepts_direct_table_child() {
        let html = Html::parse_document(
            r#"<body>
                <div>INDEX</div>
                <div>   </div>
                <div><table id="index"><tr><td>Item 1.</td></tr></table></div>
            </body>"#,
        );
        let table = locate_index_table(&html).expect("table should be located");
        assert_eq!(table.value().attr("id"), Some("index"));
    }

    #[test]
    fn body_div_heuristic_accepts_nested_table() {
        let html = Html::parse_document(
            r#"<body>
                <div><span>INDEX</span></div>
                <div><div><table id="nested"><tr><td>Item 1.</td></tr></table></div></div>
            </body>"#,
        );
        let table = locate_index_table(&html).expect("table should be located");
        assert_eq!(table.value().attr("id"), Some("nested"));
    }

    #[test]
    fn document_without_markers_yields_none() {
        let html = Html::parse_document(
            r#"<body><div>Annual report</div><table><tr><td>x</td></tr></table></body>"#,
        );
        assert!(locate_index_table(&html).is_none());
    }

    #[test]
    fn blank_sibling_divs_are_skipped() {
        let html = Html::parse_document(
            r#"<body>
                <div>TABLE OF CONTENTS</div>
                <div> </div>
                <div>&#160;</div>
                <div><table id="after-blanks"><tr><td>Item 1.</td></tr></table></div>
            </body>"#,
        );
        let table = locate_index_table(&html).expect("table should be located");
        assert_eq!(table.value().attr("id"), Some("after-blanks"));
    }
}
