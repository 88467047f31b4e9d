// src/edgar/models.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Tuning knobs for the rate-limited EDGAR client.
///
/// Deserializable so deployments can override the defaults from a JSON
/// config file; every field falls back to the conservative values below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum concurrent in-flight requests.
    pub max_concurrent_requests: usize,
    /// Cool-down held after each request before its slot is released,
    /// bounding request rate rather than just concurrency.
    pub request_cooldown_ms: u64,
    /// Retries after the initial attempt for transient failures.
    pub retry_count: u32,
    /// Request timeout.
    pub timeout_secs: u64,
    /// Failures within `failure_window_secs` that open the circuit.
    pub failure_threshold: usize,
    pub failure_window_secs: u64,
    /// How long the circuit stays open before a half-open trial.
    pub break_duration_secs: u64,
    /// SEC requires a descriptive User-Agent identifying the caller.
    pub user_agent: String,
    /// Host header for archive document requests.
    pub archive_host: String,
    /// Host header for full-text search requests.
    pub search_host: String,
    /// Search endpoint template; `{cik}`, `{form}`, `{start}`, `{end}` are
    /// substituted per request.
    pub search_url_template: String,
    /// Source of the raw company ticker table.
    pub company_tickers_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 10,
            request_cooldown_ms: 1000,
            retry_count: 3,
            timeout_secs: 30,
            failure_threshold: 5,
            failure_window_secs: 60,
            break_duration_secs: 20,
            user_agent: "filing_parser research contact@example.com".to_string(),
            archive_host: "www.sec.gov".to_string(),
            search_host: "efts.sec.gov".to_string(),
            search_url_template:
                "https://efts.sec.gov/LATEST/search-index?q=%22{cik}%22&forms={form}&dateRange=custom&startdt={start}&enddt={end}"
                    .to_string(),
            company_tickers_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn request_cooldown(&self) -> Duration {
        Duration::from_millis(self.request_cooldown_ms)
    }

    pub fn failure_window(&self) -> Duration {
        Duration::from_secs(self.failure_window_secs)
    }

    pub fn break_duration(&self) -> Duration {
        Duration::from_secs(self.break_duration_secs)
    }

    pub fn search_url(&self, cik: &str, form: &str, start: &str, end: &str) -> String {
        self.search_url_template
            .replace("{cik}", cik)
            .replace("{form}", form)
            .replace("{start}", start)
            .replace("{end}", end)
    }
}

/// Response shape of the EDGAR full-text search API; only the hit ids are
/// consumed downstream.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub hits: SearchHits,
}

#[derive(Debug, Deserialize)]
pub struct SearchHits {
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: String,
}

/// One entry of the EDGAR company ticker file
/// (`{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct CompanyTickerEntry {
    pub cik_str: u64,
    pub ticker: String,
    pub title: String,
}

/// Transformed company record persisted to the lookup cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub cik_padded: String,
    pub ticker: String,
    pub title: String,
}

impl From<CompanyTickerEntry> for CompanyRecord {
    fn from(entry: CompanyTickerEntry) -> Self {
        Self {
            // CIKs are zero-padded to 10 digits everywhere EDGAR accepts them
            cik_padded: format!("{:010}", entry.cik_str),
            ticker: entry.ticker,
            title: entry.title,
        }
    }
}

/// Parses the raw ticker file (keyed by row index) into records.
pub fn parse_company_ticker_file(json: &str) -> Result<Vec<CompanyRecord>, serde_json::Error> {
    let entries: HashMap<String, CompanyTickerEntry> = serde_json::from_str(json)?;
    let mut records: Vec<CompanyRecord> = entries.into_values().map(CompanyRecord::from).collect();
    records.sort_by(|a, b| a.ticker.cmp(&b.ticker));
    Ok(records)
}

/// Converts a search hit id (`"0000320193-23-000106:aapl-20230930.htm"`)
/// into the archive URL of the referenced document.
pub fn archive_url_from_hit_id(hit_id: &str) -> Option<String> {
    let (accession, file) = hit_id.split_once(':')?;
    let mut parts = accession.splitn(3, '-');
    let (prefix, middle, suffix) = (parts.next()?, parts.next()?, parts.next()?);
    if prefix.is_empty() || middle.is_empty() || suffix.is_empty() {
        return None;
    }
    let cik = prefix.trim_start_matches('0');
    Some(format!(
        "https://www.sec.gov/Archives/edgar/data/{}/{}{}{}/{}",
        cik, prefix, middle, suffix, file
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_id_becomes_archive_url() {
        let url = archive_url_from_hit_id("0000320193-23-000106:aapl-20230930.htm").unwrap();
        assert_eq!(
            url,
            "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm"
        );
    }

    #[test]
    fn malformed_hit_ids_are_rejected() {
        assert!(archive_url_from_hit_id("no-colon-here").is_none());
        assert!(archive_url_from_hit_id("missing-parts:file.htm").is_none());
    }

    #[test]
    fn ticker_file_parses_and_pads_ciks() {
        let json = r#"{
            "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
            "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}
        }"#;
        let records = parse_company_ticker_file(json).unwrap();
        assert_eq!(records.len(), 2);
        let apple = records.iter().find(|r| r.ticker == "AAPL").unwrap();
        assert_eq!(apple.cik_padded, "0000320193");
    }

    #[test]
    fn search_url_substitutes_all_tokens() {
        let config = FetchConfig::default();
        let url = config.search_url("0000320193", "10-K", "2020-01-01", "2023-12-31");
        assert!(url.contains("0000320193"));
        assert!(url.contains("forms=10-K"));
        assert!(url.contains("startdt=2020-01-01"));
        assert!(url.contains("enddt=2023-12-31"));
    }
}
