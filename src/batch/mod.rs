// src/batch/mod.rs
//! Batch orchestration: chunked, concurrent per-document extraction with
//! partial-failure tolerance. One failing document never takes down its
//! chunk or the batch; it leaves a failure record behind instead.

pub mod urls;

use crate::edgar::EdgarClient;
use crate::extractors::anchors::{collect_hrefs, index_anchors};
use crate::extractors::rows::{parse_rows, ItemRecord};
use crate::extractors::table::locate_index_table;
use crate::storage::StorageManager;
use crate::utils::error::{AppError, ExtractError};
use scraper::Html;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

pub const DEFAULT_CHUNK_SIZE: usize = 20;

/// Extraction outcome for a single document. Owned exclusively by the task
/// that processed the URL until it is handed back to the orchestrator.
#[derive(Debug, Serialize)]
pub struct DocumentResult {
    pub source_url: String,
    pub items: Vec<ItemRecord>,
    pub item_count: usize,
}

/// Aggregate over one batch request. Totals are derived from the document
/// results, never stored separately.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub form_type: String,
    pub requested_urls: usize,
    pub total_items: usize,
    pub documents: Vec<DocumentResult>,
}

impl BatchResult {
    pub fn count_total_items(&self) -> usize {
        self.documents.iter().map(|d| d.items.len()).sum()
    }

    pub fn per_section_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for document in &self.documents {
            for item in &document.items {
                *counts.entry(item.effective_code()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Splits the URL set into fixed-size chunks processed one after another.
pub fn split_into_chunks<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    items
        .chunks(chunk_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

pub struct BatchOrchestrator {
    client: Arc<EdgarClient>,
    storage: Arc<StorageManager>,
    chunk_size: usize,
}

impl BatchOrchestrator {
    pub fn new(client: Arc<EdgarClient>, storage: Arc<StorageManager>, chunk_size: usize) -> Self {
        Self {
            client,
            storage,
            chunk_size,
        }
    }

    /// Runs the extraction pipeline over every URL. Within a chunk,
    /// documents are processed concurrently and awaited together; chunks
    /// run sequentially, bounding peak concurrency and memory.
    pub async fn run(
        &self,
        urls: &[String],
        targets: &HashSet<String>,
        form_type: &str,
    ) -> BatchResult {
        let mut documents = Vec::new();

        for (index, chunk) in split_into_chunks(urls, self.chunk_size).into_iter().enumerate() {
            tracing::info!("Processing chunk {} ({} urls)", index + 1, chunk.len());
            let mut tasks = JoinSet::new();
            for url in chunk {
                let client = Arc::clone(&self.client);
                let storage = Arc::clone(&self.storage);
                let targets = targets.clone();
                tasks.spawn(async move { process_url(client, storage, url, targets).await });
            }
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(document) => documents.push(document),
                    Err(err) => tracing::error!("Document task did not complete: {}", err),
                }
            }
        }

        self.audit(&documents, targets);

        let mut batch = BatchResult {
            form_type: form_type.to_string(),
            requested_urls: urls.len(),
            total_items: 0,
            documents,
        };
        batch.total_items = batch.count_total_items();
        batch
    }

    /// Flags documents that parsed but are missing requested sections.
    /// Reportable, never fatal: the record lands next to the other failure
    /// records and the batch result is returned as-is.
    fn audit(&self, documents: &[DocumentResult], targets: &HashSet<String>) {
        for document in documents {
            if document.items.is_empty() {
                // Already covered by the extraction failure record.
                continue;
            }
            let present: HashSet<String> =
                document.items.iter().map(|i| i.effective_code()).collect();
            let mut missing: Vec<&str> =
                targets.difference(&present).map(String::as_str).collect();
            if missing.is_empty() {
                continue;
            }
            missing.sort_unstable();
            let reason = format!("missing sections: {}", missing.join(", "));
            tracing::warn!("Audit mismatch for {}: {}", document.source_url, reason);
            if let Err(err) = self.storage.record_failure(&document.source_url, &reason) {
                tracing::error!("Failed to write audit record: {}", err);
            }
        }
    }
}

async fn process_url(
    client: Arc<EdgarClient>,
    storage: Arc<StorageManager>,
    url: String,
    targets: HashSet<String>,
) -> DocumentResult {
    match extract_document(&client, &storage, &url, &targets).await {
        Ok(items) => DocumentResult {
            item_count: items.len(),
            items,
            source_url: url,
        },
        Err(err) => {
            tracing::error!("Failed to parse {}: {}", url, err);
            if let Err(record_err) = storage.record_failure(&url, &err.to_string()) {
                tracing::error!("Failed to write failure record for {}: {}", url, record_err);
            }
            DocumentResult {
                source_url: url,
                items: Vec::new(),
                item_count: 0,
            }
        }
    }
}

async fn extract_document(
    client: &EdgarClient,
    storage: &StorageManager,
    url: &str,
    targets: &HashSet<String>,
) -> Result<Vec<ItemRecord>, AppError> {
    let content = load_document(client, storage, url).await?;

    let document = Html::parse_document(&content);
    let table = locate_index_table(&document).ok_or(ExtractError::NoIndexTable)?;
    let anchors = index_anchors(collect_hrefs(&document));
    let mut items = parse_rows(table, &anchors, &document, targets)?;
    if items.is_empty() {
        return Err(ExtractError::NoItems.into());
    }

    // Canonical section order, not index-row order.
    items.sort_by_key(|item| item.canonical_order());

    storage.save_result_json(url, &items)?;

    Ok(items)
}

/// Check-before-fetch, write-after-fetch against the raw document cache.
async fn load_document(
    client: &EdgarClient,
    storage: &StorageManager,
    url: &str,
) -> Result<String, AppError> {
    if let Some(cached) = storage.cached_document(url)? {
        tracing::debug!("Raw cache hit for {}", url);
        return Ok(cached);
    }
    let content = client.get_document(url).await?;
    storage.cache_document(url, &content)?;
    Ok(content)
}
