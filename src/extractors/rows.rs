// src/extractors/rows.rs
//! Index-table row parsing: rows become `ItemRecord`s, labels are resolved
//! against the section taxonomy, and anchored rows pull their section
//! content out of the document body.

use crate::extractors::section::extract_between_anchors;
use crate::taxonomy::{self, matcher, CanonicalLabel, FORM_10K_SECTIONS};
use crate::utils::error::ExtractError;
use crate::utils::text::{clean_cell_text, normalize_item_code};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile ROW_SELECTOR"));
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile CELL_SELECTOR"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("Failed to compile LINK_SELECTOR"));

/// One parsed index-table row and the section content extracted for it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemRecord {
    pub item_code: String,
    pub item_label: String,
    #[serde(skip)]
    pub resolved_section: Option<&'static CanonicalLabel>,
    pub anchor_href: Option<String>,
    pub section_content: HashMap<String, String>,
}

impl ItemRecord {
    /// Code used for target filtering and ordering: the resolved canonical
    /// code, else the literal code normalized from the first cell.
    pub fn effective_code(&self) -> String {
        match self.resolved_section {
            Some(section) => section.code.to_string(),
            None => normalize_item_code(&self.item_code),
        }
    }

    pub fn canonical_order(&self) -> u32 {
        taxonomy::section_order(&self.effective_code())
    }
}

/// Parses the index table's rows into item records.
///
/// Rows without the literal "Item" marker are not item rows and are
/// skipped. An unresolved label is logged but kept (subject to target
/// filtering); a nested link whose href is absent from the anchor index is
/// a structural violation that aborts this document's extraction.
pub fn parse_rows(
    table: ElementRef<'_>,
    anchors: &[String],
    document: &Html,
    targets: &HashSet<String>,
) -> Result<Vec<ItemRecord>, ExtractError> {
    let rows: Vec<ElementRef> = table.select(&ROW_SELECTOR).collect();
    if rows.is_empty() {
        return Err(ExtractError::NoRows);
    }

    let mut records = Vec::new();
    for row in rows {
        if let Some(record) = parse_row(row, anchors, document, targets)? {
            records.push(record);
        }
    }
    Ok(records)
}

fn parse_row(
    row: ElementRef<'_>,
    anchors: &[String],
    document: &Html,
    targets: &HashSet<String>,
) -> Result<Option<ItemRecord>, ExtractError> {
    let cells: Vec<ElementRef> = row.select(&CELL_SELECTOR).collect();
    if cells.len() < 2 {
        return Ok(None);
    }

    let cell_texts: Vec<String> = cells
        .iter()
        .map(|cell| clean_cell_text(&cell.text().collect::<String>()))
        .collect();
    if !cell_texts.iter().any(|text| text.contains("Item")) {
        return Ok(None);
    }

    let item_code = cell_texts[0].replace('.', "");
    let item_label = cell_texts[1].clone();

    let resolved_section = matcher::resolve(&item_label, FORM_10K_SECTIONS);
    if resolved_section.is_none() {
        tracing::warn!(
            "Could not resolve item label '{}' against the section taxonomy",
            item_label
        );
    }

    let mut record = ItemRecord {
        item_code,
        item_label,
        resolved_section,
        anchor_href: None,
        section_content: HashMap::new(),
    };

    if !targets.contains(&record.effective_code()) {
        tracing::debug!("Skipping non-target item '{}'", record.item_code);
        return Ok(None);
    }

    if let Some(href) = cells[1]
        .select(&LINK_SELECTOR)
        .next()
        .and_then(|link| link.value().attr("href"))
    {
        let position = anchors
            .iter()
            .position(|anchor| anchor == href)
            .ok_or_else(|| ExtractError::AnchorNotIndexed(href.to_string()))?;
        let end_href = anchors.get(position + 1).map(String::as_str);
        record.section_content = extract_between_anchors(document, href, end_href);
        record.anchor_href = Some(href.to_string());
    }

    Ok(Some(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::anchors::{collect_hrefs, index_anchors};

    fn targets(codes: &[&str]) -> HashSet<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn first_table(document: &Html) -> ElementRef<'_> {
        let selector = Selector::parse("table").unwrap();
        document.select(&selector).next().unwrap()
    }

    const FILING_HTML: &str = r##"
        <!DOCTYPE html>
        <html><body>
        <div>
        <table>
            <tr><td>Item 1.</td><td><a href="#item1">Business</a></td></tr>
            <tr><td>Item 1A.</td><td><a href="#item1a">Risk Factors</a></td></tr>
            <tr><td>Item 2.</td><td><a href="#item2">Properties</a></td></tr>
            <tr><td>&#160;</td><td>Page</td></tr>
        </table>
        </div>
        <a href="#item1"></a><a id="item1"></a>
        <div>Business overview text.</div>
        <a href="#item1a"></a><a id="item1a"></a>
        <div>Risk factor text.</div>
        <a href="#item2"></a><a id="item2"></a>
        <div>Property text.</div>
        </body></html>
    "##;

    #[test]
    fn parses_item_rows_and_attaches_section_content() {
        let document = Html::parse_document(FILING_HTML);
        let anchors = index_anchors(collect_hrefs(&document));
        let table = first_table(&document);

        let records = parse_rows(
            table,
            &anchors,
            &document,
            &targets(&["Item1", "Item1A", "Item2"]),
        )
        .unwrap();

        assert_eq!(records.len(), 3);
        let business = &records[0];
        assert_eq!(business.item_code, "Item 1");
        assert_eq!(business.resolved_section.unwrap().code, "Item1");
        assert_eq!(business.anchor_href.as_deref(), Some("#item1"));
        let content: String = business.section_content.values().cloned().collect();
        assert!(content.contains("Business overview text."));
    }

    #[test]
    fn rows_outside_the_target_set_are_discarded() {
        let document = Html::parse_document(FILING_HTML);
        let anchors = index_anchors(collect_hrefs(&document));
        let table = first_table(&document);

        let records = parse_rows(table, &anchors, &document, &targets(&["Item1A"])).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].resolved_section.unwrap().code, "Item1A");
    }

    #[test]
    fn table_without_item_rows_yields_no_records() {
        let html = Html::parse_document(
            r#"<body><table>
                <tr><td>Page</td><td>Description</td></tr>
                <tr><td>1</td><td>Cover</td></tr>
            </table></body>"#,
        );
        let table = first_table(&html);
        let records = parse_rows(table, &[], &html, &targets(&["Item1"])).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn empty_table_is_a_structural_error() {
        let html = Html::parse_document(r#"<body><table></table></body>"#);
        let table = first_table(&html);
        let result = parse_rows(table, &[], &html, &targets(&["Item1"]));
        assert!(matches!(result, Err(ExtractError::NoRows)));
    }

    #[test]
    fn unindexed_anchor_aborts_the_document() {
        let html = Html::parse_document(
            r##"<body><table>
                <tr><td>Item 1.</td><td><a href="#missing">Business</a></td></tr>
            </table></body>"##,
        );
        let table = first_table(&html);
        let result = parse_rows(table, &[], &html, &targets(&["Item1"]));
        assert!(matches!(result, Err(ExtractError::AnchorNotIndexed(_))));
    }

    #[test]
    fn effective_code_prefers_resolved_section_over_literal() {
        let mut record = ItemRecord {
            item_code: "Item 1A".to_string(),
            item_label: "Risk Factors".to_string(),
            resolved_section: taxonomy::section_by_code("Item1A"),
            anchor_href: None,
            section_content: HashMap::new(),
        };
        assert_eq!(record.effective_code(), "Item1A");
        assert_eq!(record.canonical_order(), 2);

        // With no resolution, the literal code from the first cell is
        // normalized and used instead.
        record.resolved_section = None;
        assert_eq!(record.effective_code(), "Item1A");
    }
}
