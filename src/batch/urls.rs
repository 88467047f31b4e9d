// src/batch/urls.rs
//! Batch URL generation: company → CIK lookup → full-text search → archive
//! URLs, persisted per company for later parse runs.

use crate::edgar::models::{archive_url_from_hit_id, parse_company_ticker_file, CompanyRecord};
use crate::edgar::EdgarClient;
use crate::storage::{StorageManager, BATCH_URL_DIR, PERSISTENT_DIR};
use crate::taxonomy::{matcher, COMPANY_TICKERS};
use crate::utils::error::AppError;

/// Request surface for URL generation, passed in as plain values.
#[derive(Debug, Clone)]
pub struct BatchUrlRequest {
    /// Tickers, or free-text company names resolved against the company
    /// taxonomy.
    pub companies: Vec<String>,
    pub form_type: String,
    pub start_date: String,
    pub end_date: String,
}

/// Generates archive URLs for every requested company and persists each
/// company's list under a timestamped file name. Companies that cannot be
/// resolved or return no hits are skipped with a warning, not an error.
pub async fn generate_batch_urls(
    client: &EdgarClient,
    storage: &StorageManager,
    request: &BatchUrlRequest,
) -> Result<Vec<String>, AppError> {
    let records = company_lookup(client, storage).await?;
    let mut all_urls = Vec::new();

    for company in &request.companies {
        let ticker = resolve_ticker(company);
        let Some(record) = records
            .iter()
            .find(|r| r.ticker.eq_ignore_ascii_case(&ticker))
        else {
            tracing::warn!("No CIK found for company '{}', skipping", company);
            continue;
        };

        let response = client
            .search(
                &record.cik_padded,
                &request.form_type,
                &request.start_date,
                &request.end_date,
            )
            .await?;
        let urls: Vec<String> = response
            .hits
            .hits
            .iter()
            .filter_map(|hit| archive_url_from_hit_id(&hit.id))
            .collect();
        if urls.is_empty() {
            tracing::warn!("Search returned no filings for {}", record.ticker);
            continue;
        }

        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let file_name = format!(
            "secUrls_{}_{}_{}.txt",
            record.ticker, request.form_type, timestamp
        );
        storage.write_lines(BATCH_URL_DIR, &file_name, &urls)?;
        tracing::info!("Saved {} urls for {}", urls.len(), record.ticker);
        all_urls.extend(urls);
    }

    Ok(all_urls)
}

/// Accepts a ticker verbatim; anything else is fuzzy-resolved as a company
/// name against the company taxonomy.
fn resolve_ticker(company: &str) -> String {
    let upper = company.trim().to_uppercase();
    if COMPANY_TICKERS.iter().any(|c| c.code == upper) {
        return upper;
    }
    match matcher::resolve(company, COMPANY_TICKERS) {
        Some(label) => label.code.to_string(),
        None => upper,
    }
}

/// CIK lookup with a transformed-file cache: the raw ticker table is read
/// (or fetched) once, transformed to padded records and persisted; later
/// runs read the transformed copy directly.
async fn company_lookup(
    client: &EdgarClient,
    storage: &StorageManager,
) -> Result<Vec<CompanyRecord>, AppError> {
    let existing = storage.exists(PERSISTENT_DIR, "transformed_company_tickers*")?;
    if let Some(path) = existing.first() {
        let json = storage.read_text(path)?;
        return serde_json::from_str(&json).map_err(|e| AppError::Processing(e.to_string()));
    }

    let raw = match storage.exists(PERSISTENT_DIR, "company_tickers.json")?.first() {
        Some(path) => storage.read_text(path)?,
        None => {
            let body = client.get_company_tickers().await?;
            storage.write_text(PERSISTENT_DIR, "company_tickers.json", &body)?;
            body
        }
    };

    let records =
        parse_company_ticker_file(&raw).map_err(|e| AppError::Processing(e.to_string()))?;
    let json = serde_json::to_string(&records).map_err(|e| AppError::Processing(e.to_string()))?;
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    storage.write_text(
        PERSISTENT_DIR,
        &format!("transformed_company_tickers_{timestamp}.json"),
        &json,
    )?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edgar::FetchConfig;
    use tempfile::tempdir;

    const RAW_TICKERS: &str = r#"{
        "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"}
    }"#;

    #[test]
    fn tickers_pass_through_and_names_resolve_fuzzily() {
        assert_eq!(resolve_ticker("aapl"), "AAPL");
        assert_eq!(resolve_ticker("MSFT"), "MSFT");
        assert_eq!(resolve_ticker("Apple Inc"), "AAPL");
        assert_eq!(resolve_ticker("Microsoft Corporation"), "MSFT");
    }

    #[tokio::test]
    async fn company_lookup_transforms_then_reuses_the_cache() {
        let dir = tempdir().unwrap();
        let storage = StorageManager::new(dir.path()).unwrap();
        let client = EdgarClient::new(FetchConfig::default()).unwrap();
        storage
            .write_text(PERSISTENT_DIR, "company_tickers.json", RAW_TICKERS)
            .unwrap();

        let records = company_lookup(&client, &storage).await.unwrap();
        assert_eq!(records.len(), 2);
        let apple = records.iter().find(|r| r.ticker == "AAPL").unwrap();
        assert_eq!(apple.cik_padded, "0000320193");

        // Transformed cache written and used on the next call.
        let transformed = storage
            .exists(PERSISTENT_DIR, "transformed_company_tickers*")
            .unwrap();
        assert_eq!(transformed.len(), 1);

        let again = company_lookup(&client, &storage).await.unwrap();
        assert_eq!(again.len(), 2);
        let still_one = storage
            .exists(PERSISTENT_DIR, "transformed_company_tickers*")
            .unwrap();
        assert_eq!(still_one.len(), 1, "cache must not be rewritten");
    }
}
