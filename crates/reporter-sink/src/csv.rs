use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use reporter_core::{config::SinkConfig, ResultRecord};

use crate::error::{Result, SinkError};
use crate::ResultSink;

/// Append-only delimited text file, one `timestamp<delim>value` row per record.
///
/// The file is opened in append mode for every record and synced before
/// `append` returns, so a row the scheduler believes saved survives a crash.
pub struct CsvSink {
    path: PathBuf,
    delimiter: char,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>, delimiter: char) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(&config.path, config.delimiter)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SinkError {
        SinkError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ResultSink for CsvSink {
    fn append(&mut self, record: &ResultRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let line = format_row(record, self.delimiter);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data())
            .map_err(|e| self.io_err(e))?;

        debug!(path = %self.path.display(), "result row appended");
        Ok(())
    }
}

/// Render one record as a newline-terminated row.
pub fn format_row(record: &ResultRecord, delimiter: char) -> String {
    let timestamp = format!("{:.6}", record.timestamp);
    let value = match &record.value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!(
        "{}{}{}\n",
        quote_field(&timestamp, delimiter),
        delimiter,
        quote_field(&value, delimiter)
    )
}

// Minimal quoting: only fields that would break the row get wrapped.
fn quote_field(field: &str, delimiter: char) -> String {
    let needs_quotes = field
        .chars()
        .any(|c| c == delimiter || c == '"' || c == '\r' || c == '\n');
    if needs_quotes {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
