// src/storage/mod.rs
use crate::utils::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory for cached raw filing documents.
pub const RAW_DIR: &str = "raw";
/// Subdirectory for per-document result JSON.
pub const RESULT_DIR: &str = "results";
/// Subdirectory for failure records.
pub const FAILED_DIR: &str = "failed";
/// Subdirectory for generated batch URL lists.
pub const BATCH_URL_DIR: &str = "batch_urls";
/// Subdirectory for long-lived lookup data (company ticker tables).
pub const PERSISTENT_DIR: &str = "persistent";

/// Filesystem collaborator for the pipeline: raw-document cache, result
/// persistence, failure records and lookup data. Policy stays with the
/// callers; this layer only checks-before-reading and writes-after.
pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager rooted at the given directory.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();
        if !base_path.exists() {
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Lists files in a subdirectory whose names match `pattern`, where the
    /// pattern is a file-name glob with at most one `*` ("transformed_*").
    pub fn exists(&self, subdir: &str, pattern: &str) -> Result<Vec<PathBuf>, StorageError> {
        let dir = self.base_dir.join(subdir);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let (prefix, suffix) = match pattern.split_once('*') {
            Some((prefix, suffix)) => (prefix, suffix),
            None => (pattern, ""),
        };

        let mut matches = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let matched = if pattern.contains('*') {
                name.starts_with(prefix) && name.ends_with(suffix)
            } else {
                name == pattern
            };
            if matched {
                matches.push(entry.path());
            }
        }
        matches.sort();
        Ok(matches)
    }

    pub fn read_text(&self, path: &Path) -> Result<String, StorageError> {
        Ok(fs::read_to_string(path)?)
    }

    /// Writes text to `subdir/file_name`, creating directories as needed.
    pub fn write_text(
        &self,
        subdir: &str,
        file_name: &str,
        text: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.base_dir.join(subdir);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, text)?;
        tracing::debug!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(path)
    }

    /// Writes one line per entry to `subdir/file_name`.
    pub fn write_lines(
        &self,
        subdir: &str,
        file_name: &str,
        lines: &[String],
    ) -> Result<PathBuf, StorageError> {
        self.write_text(subdir, file_name, &(lines.join("\n") + "\n"))
    }

    /// Returns the cached raw document for a URL, if present.
    pub fn cached_document(&self, url: &str) -> Result<Option<String>, StorageError> {
        let path = self.base_dir.join(RAW_DIR).join(file_name_from_url(url));
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.read_text(&path)?))
    }

    /// Caches the raw document for a URL.
    pub fn cache_document(&self, url: &str, content: &str) -> Result<PathBuf, StorageError> {
        self.write_text(RAW_DIR, &file_name_from_url(url), content)
    }

    /// Serializes and saves a document's extracted items, named after the
    /// source document.
    pub fn save_result_json<T: serde::Serialize>(
        &self,
        url: &str,
        data: &T,
    ) -> Result<PathBuf, StorageError> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut name = file_name_from_url(url);
        name = match name.rsplit_once('.') {
            Some((stem, _)) => format!("{stem}.json"),
            None => format!("{name}.json"),
        };
        self.write_text(RESULT_DIR, &name, &json)
    }

    /// Records a per-document failure: the source URL plus a reason, stamped
    /// with the current time. Each record is its own file so concurrent
    /// writers never clobber each other.
    pub fn record_failure(&self, url: &str, reason: &str) -> Result<PathBuf, StorageError> {
        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S%3f");
        let file_name = format!("{}_{}.txt", timestamp, file_name_from_url(url));
        let body = format!("{url}\n{reason}\n");
        self.write_text(FAILED_DIR, &file_name, &body)
    }
}

/// File-name component of a URL ("https://host/a/b/doc.htm" → "doc.htm").
pub fn file_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    // Keep names filesystem-safe; query strings occasionally leak into
    // archive URLs.
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            c
        } else {
            '_'
        })
        .collect()
}
