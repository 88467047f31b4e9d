// src/taxonomy/mod.rs
pub mod matcher;

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A canonical identifier with its natural-language description.
///
/// Enumerations are plain data tables: adding an entry requires no change to
/// the matching or extraction logic. `order` is the position used to sort
/// extracted items into canonical section order.
#[derive(Debug, PartialEq, Eq)]
pub struct CanonicalLabel {
    pub code: &'static str,
    pub description: &'static str,
    pub order: u32,
}

const fn label(code: &'static str, description: &'static str, order: u32) -> CanonicalLabel {
    CanonicalLabel {
        code,
        description,
        order,
    }
}

/// Supported filing form types; descriptions are the official form names
/// used in search requests and file names.
pub static FORM_TYPES: &[CanonicalLabel] = &[
    label("Sec10K", "10-K", 1),
    label("Sec10Q", "10-Q", 2),
];

/// The 10-K section taxonomy. Descriptions are the official item titles the
/// index tables of real filings are matched against.
pub static FORM_10K_SECTIONS: &[CanonicalLabel] = &[
    label("Item1", "Business", 1),
    label("Item1A", "Risk Factors", 2),
    label("Item1B", "Unresolved Staff Comments", 3),
    label("Item1C", "Cybersecurity", 4),
    label("Item2", "Properties", 5),
    label("Item3", "Legal Proceedings", 6),
    label("Item4", "Mine Safety Disclosures", 7),
    label(
        "Item5",
        "Market for Registrant's Common Equity, Related Stockholder Matters and Issuer Purchases of Equity Securities",
        8,
    ),
    label("Item6", "Selected Financial Data", 9),
    label(
        "Item7",
        "Management's Discussion and Analysis of Financial Condition and Results of Operations",
        10,
    ),
    label(
        "Item7A",
        "Quantitative and Qualitative Disclosures about Market Risk",
        11,
    ),
    label("Item8", "Financial Statements and Supplementary Data", 12),
    label(
        "Item9",
        "Changes in and Disagreements with Accountants on Accounting and Financial Disclosure",
        13,
    ),
    label("Item9A", "Controls and Procedures", 14),
    label("Item9B", "Other Information", 15),
    label(
        "Item10",
        "Directors, Executive Officers and Corporate Governance",
        16,
    ),
    label("Item11", "Executive Compensation", 17),
    label(
        "Item12",
        "Security Ownership of Certain Beneficial Owners and Management and Related Stockholder Matters",
        18,
    ),
    label(
        "Item13",
        "Certain Relationships and Related Transactions, and Director Independence",
        19,
    ),
    label("Item14", "Principal Accountant Fees and Services", 20),
    label("Item15", "Exhibits and Financial Statement Schedules", 21),
    label("Item16", "Form 10-K Summary", 22),
];

/// Tracked companies: ticker symbol paired with the registrant name as it
/// appears in the EDGAR company ticker file.
pub static COMPANY_TICKERS: &[CanonicalLabel] = &[
    label("MSFT", "Microsoft Corp", 1),
    label("AAPL", "Apple Inc", 2),
    label("NVDA", "NVIDIA Corp", 3),
    label("GOOGL", "Alphabet Inc", 4),
    label("AMZN", "Amazon Com Inc", 5),
    label("META", "Meta Platforms Inc", 6),
    label("BRK-B", "Berkshire Hathaway Inc", 7),
    label("LLY", "Eli Lilly Co", 8),
    label("TSM", "Taiwan Semiconductor Manufacturing Co Ltd", 9),
    label("AVGO", "Broadcom Inc", 10),
    label("V", "Visa Inc", 11),
    label("JPM", "JPMorgan Chase Co", 12),
    label("XOM", "Exxon Mobil Corp", 13),
    label("WMT", "Walmart Inc", 14),
    label("TSLA", "Tesla Inc", 15),
    label("UNH", "UnitedHealth Group Inc", 16),
    label("MA", "Mastercard Inc", 17),
    label("PG", "Procter Gamble Co", 18),
    label("JNJ", "Johnson Johnson", 19),
    label("HD", "Home Depot Inc", 20),
    label("MRK", "Merck Co Inc", 21),
    label("COST", "Costco Wholesale Corp", 22),
    label("ORCL", "Oracle Corp", 23),
    label("BAC", "Bank of America Corp", 24),
    label("CVX", "Chevron Corp", 25),
    label("KO", "Coca Cola Co", 26),
    label("NFLX", "Netflix Inc", 27),
    label("AMD", "Advanced Micro Devices Inc", 28),
    label("PEP", "PepsiCo Inc", 29),
    label("ADBE", "Adobe Inc", 30),
    label("DIS", "Walt Disney Co", 31),
    label("MCD", "McDonalds Corp", 32),
    label("CSCO", "Cisco Systems Inc", 33),
];

static SECTION_INDEX: Lazy<HashMap<&'static str, &'static CanonicalLabel>> =
    Lazy::new(|| FORM_10K_SECTIONS.iter().map(|l| (l.code, l)).collect());

/// Looks up a 10-K section by its canonical code ("Item1A").
pub fn section_by_code(code: &str) -> Option<&'static CanonicalLabel> {
    SECTION_INDEX.get(code).copied()
}

/// Canonical sort position for a section code; unknown codes sort last.
pub fn section_order(code: &str) -> u32 {
    section_by_code(code).map(|l| l.order).unwrap_or(u32::MAX)
}

/// All canonical 10-K section codes, used as the default target set.
pub fn all_section_codes() -> Vec<String> {
    FORM_10K_SECTIONS.iter().map(|l| l.code.to_string()).collect()
}

/// Looks up a form type by its official name ("10-K"), case-insensitively.
pub fn form_type_by_name(name: &str) -> Option<&'static CanonicalLabel> {
    let trimmed = name.trim();
    FORM_TYPES
        .iter()
        .find(|l| l.description.eq_ignore_ascii_case(trimmed))
}
