use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};

use crate::extractor::ProductRecord;
use crate::sinks::{RecordSink, SinkError, SinkOutcome, timestamped_path, write_file};

/// Header row plus one line per record, offers joined with `"; "`.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Timestamped file name inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(timestamped_path(dir, "csv", Local::now()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Encode rows with a header taken from the row's field names.
pub fn encode(records: &[ProductRecord]) -> Result<Vec<u8>, SinkError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record.to_row())?;
    }
    writer.flush().map_err(::csv::Error::from)?;
    writer
        .into_inner()
        .map_err(|e| SinkError::Csv(::csv::Error::from(e.into_error())))
}

#[async_trait]
impl RecordSink for CsvFileSink {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn write(&self, records: &[ProductRecord]) -> Result<SinkOutcome, SinkError> {
        if records.is_empty() {
            return Ok(SinkOutcome::Skipped);
        }

        let body = encode(records)?;
        write_file(&self.path, body).await?;

        Ok(SinkOutcome::Written {
            rows: records.len(),
            location: self.path.display().to_string(),
        })
    }
}
