use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::extractor::{ProductRecord, ProductRow};
use crate::sinks::{RecordSink, SinkError, SinkOutcome, timestamped_path, write_file};

/// Pretty-printed JSON array of rows.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Timestamped file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(timestamped_path(dir, "json", Local::now()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonFileSink {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn write(&self, records: &[ProductRecord]) -> Result<SinkOutcome, SinkError> {
        if records.is_empty() {
            return Ok(SinkOutcome::Skipped);
        }

        let rows: Vec<ProductRow> = records.iter().map(ProductRecord::to_row).collect();
        let body = serde_json::to_vec_pretty(&rows)?;
        write_file(&self.path, body).await?;

        Ok(SinkOutcome::Written {
            rows: rows.len(),
            location: self.path.display().to_string(),
        })
    }
}
