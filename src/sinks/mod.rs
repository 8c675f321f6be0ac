//! Where a finished run's records end up. Sinks only read the records; each
//! one succeeds or fails on its own.

pub mod csv;
pub mod json;
pub mod postgres;

pub use self::csv::CsvFileSink;
pub use self::json::JsonFileSink;
pub use self::postgres::PostgresSink;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::extractor::ProductRecord;

/// Stem shared by every export file and the database table.
pub const EXPORT_STEM: &str = "universal_products";

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv encoding failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("record index {0} does not fit the index column")]
    IndexOutOfRange(usize),

    #[error("database write failed: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOutcome {
    Written { rows: usize, location: String },
    /// Nothing to write.
    Skipped,
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn write(&self, records: &[ProductRecord]) -> Result<SinkOutcome, SinkError>;
}

/// Run every sink, regardless of how the others fared.
pub async fn write_all(
    sinks: &[Box<dyn RecordSink>],
    records: &[ProductRecord],
) -> Vec<(&'static str, Result<SinkOutcome, SinkError>)> {
    let mut results = Vec::with_capacity(sinks.len());
    for sink in sinks {
        let result = sink.write(records).await;
        match &result {
            Ok(SinkOutcome::Written { rows, location }) => {
                info!(sink = sink.name(), rows, location = %location, "records saved")
            }
            Ok(SinkOutcome::Skipped) => info!(sink = sink.name(), "no records to save"),
            Err(e) => warn!(sink = sink.name(), error = %e, "sink failed"),
        }
        results.push((sink.name(), result));
    }
    results
}

/// `<dir>/universal_products_<YYYYmmdd_HHMMSS>.<extension>`
pub fn timestamped_path(dir: &Path, extension: &str, at: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{EXPORT_STEM}_{}.{extension}",
        at.format("%Y%m%d_%H%M%S")
    ))
}

async fn write_file(path: &Path, contents: Vec<u8>) -> Result<(), SinkError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| SinkError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })
}
