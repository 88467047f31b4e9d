// src/main.rs
mod batch;
mod edgar;
mod extractors;
mod storage;
mod taxonomy;
mod utils;

use batch::urls::{generate_batch_urls, BatchUrlRequest};
use batch::{BatchOrchestrator, DEFAULT_CHUNK_SIZE};
use clap::{Parser, Subcommand};
use edgar::{EdgarClient, FetchConfig};
use std::collections::HashSet;
use std::sync::Arc;
use storage::StorageManager;
use utils::text::normalize_item_code;
use utils::AppError;

/// Command line interface for the filing section parser
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output directory for cached documents, results and failure records
    #[arg(short, long, default_value = "./data")]
    output_dir: String,

    /// JSON file overriding the fetch configuration defaults
    #[arg(long)]
    fetch_config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract section content from filing documents
    Parse {
        /// File containing one document URL per line
        #[arg(long)]
        url_file: Option<String>,

        /// Document URL given inline (repeatable)
        #[arg(long = "url")]
        urls: Vec<String>,

        /// Target section code, e.g. Item1 (repeatable); every canonical
        /// section if omitted
        #[arg(long = "item")]
        items: Vec<String>,

        /// Form type of the documents
        #[arg(long, default_value = "10-K")]
        form_type: String,

        /// URLs processed concurrently per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
    /// Generate document URL lists via the full-text search API
    BatchUrls {
        /// Ticker or company name (repeatable)
        #[arg(long = "company", required = true)]
        companies: Vec<String>,

        /// Form type to search for
        #[arg(long, default_value = "10-K")]
        form_type: String,

        /// Search window start (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,

        /// Search window end (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let cli = Cli::parse();
    tracing::info!("Starting with args: {:?}", cli);

    // 3. Initialize storage and the shared rate-limited client
    let storage = Arc::new(StorageManager::new(&cli.output_dir)?);
    let fetch_config = load_fetch_config(cli.fetch_config.as_deref())?;
    let client = Arc::new(EdgarClient::new(fetch_config)?);

    match cli.command {
        Command::Parse {
            url_file,
            urls,
            items,
            form_type,
            chunk_size,
        } => run_parse(client, storage, url_file, urls, items, form_type, chunk_size).await,
        Command::BatchUrls {
            companies,
            form_type,
            start_date,
            end_date,
        } => {
            let form = taxonomy::form_type_by_name(&form_type)
                .ok_or_else(|| AppError::Config(format!("Unsupported form type: {}", form_type)))?;
            let request = BatchUrlRequest {
                companies,
                form_type: form.description.to_string(),
                start_date,
                end_date,
            };
            let urls = generate_batch_urls(&client, &storage, &request).await?;
            if urls.is_empty() {
                return Err(AppError::Processing(
                    "No filing URLs generated for the requested companies".to_string(),
                ));
            }
            tracing::info!("Generated {} filing URLs", urls.len());
            Ok(())
        }
    }
}

fn load_fetch_config(path: Option<&str>) -> Result<FetchConfig, AppError> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str(&json)
                .map_err(|e| AppError::Config(format!("Invalid fetch config {}: {}", path, e)))
        }
        None => Ok(FetchConfig::default()),
    }
}

async fn run_parse(
    client: Arc<EdgarClient>,
    storage: Arc<StorageManager>,
    url_file: Option<String>,
    mut urls: Vec<String>,
    items: Vec<String>,
    form_type: String,
    chunk_size: usize,
) -> Result<(), AppError> {
    if let Some(path) = url_file {
        let text = std::fs::read_to_string(&path)?;
        urls.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    if urls.is_empty() {
        return Err(AppError::Config(
            "No document URLs given; use --url or --url-file".to_string(),
        ));
    }

    let form = taxonomy::form_type_by_name(&form_type)
        .ok_or_else(|| AppError::Config(format!("Unsupported form type: {}", form_type)))?;

    // Target sections are an explicit parameter threaded through the whole
    // pipeline; omitting --item means every canonical section.
    let targets: HashSet<String> = if items.is_empty() {
        taxonomy::all_section_codes().into_iter().collect()
    } else {
        items.iter().map(|item| normalize_item_code(item)).collect()
    };

    tracing::info!(
        "Parsing {} documents for {} target sections",
        urls.len(),
        targets.len()
    );

    let orchestrator = BatchOrchestrator::new(client, Arc::clone(&storage), chunk_size);
    let result = orchestrator.run(&urls, &targets, form.description).await;

    let extracted = result.documents.iter().filter(|d| d.item_count > 0).count();
    let failed = result.documents.len() - extracted;
    tracing::info!(
        "Processing finished. Documents: {} ok, {} failed; {} items total",
        extracted,
        failed,
        result.total_items
    );

    let mut per_section: Vec<(String, usize)> = result.per_section_counts().into_iter().collect();
    per_section.sort_by_key(|(code, _)| taxonomy::section_order(code));
    for (code, count) in per_section {
        tracing::info!("  {}: {}", code, count);
    }

    let json =
        serde_json::to_string_pretty(&result).map_err(|e| AppError::Processing(e.to_string()))?;
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    storage.write_text(
        storage::RESULT_DIR,
        &format!("batch_summary_{}.json", timestamp),
        &json,
    )?;

    if extracted == 0 {
        return Err(AppError::Processing(format!(
            "Failed to extract items from all {} documents",
            failed
        )));
    }
    Ok(())
}
