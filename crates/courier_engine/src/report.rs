use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use crate::types::OutcomeRecord;

pub const REPORT_HEADER: &str = "address;name;outcome;detail;timestamp";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the report directory exists; create if missing.
fn ensure_report_dir(dir: &Path) -> Result<(), ReportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ReportError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ReportError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ReportError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Append-only report stream, one row per contact, flushed per row so any
/// interrupted run still leaves a consistent prefix on disk.
pub struct ReportWriter {
    file: File,
    path: PathBuf,
}

impl ReportWriter {
    /// Create a freshly named, timestamped report file for this run.
    pub fn create(dir: &Path) -> Result<Self, ReportError> {
        ensure_report_dir(dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("dispatch_report_{stamp}.csv"));
        let mut file = File::create(&path)?;
        writeln!(file, "{REPORT_HEADER}")?;
        file.flush()?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, record: &OutcomeRecord) -> Result<(), ReportError> {
        writeln!(
            self.file,
            "{};{};{};{};{}",
            field(&record.address),
            field(&record.name),
            record.outcome,
            field(&record.detail),
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )?;
        self.file.flush()?;
        Ok(())
    }
}

/// Keep free-text cells from breaking the row format.
fn field(value: &str) -> String {
    value.replace(['\n', '\r'], " ").replace(';', ",")
}

#[cfg(test)]
mod tests {
    use super::field;

    #[test]
    fn field_neutralizes_delimiters_and_newlines() {
        assert_eq!(field("a;b\nc"), "a,b c");
    }
}
