//! Writers that render result records for downstream tools.
//!
//! Both writers consume records one at a time, so a run streams from the payload reader to
//! the sink without holding the full result set in memory.

use crate::record::VariantRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Unsupported format: {0}. Use 'text' or 'json'.")]
    UnsupportedFormat(String),

    #[error("Failed to create output file {path:?}: {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("Output I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Output serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Parsed case-insensitively, on the command line and in config files alike.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "String")]
pub enum OutputFormat {
    /// One variant per line.
    #[default]
    Text,
    /// A JSON array with one object per record.
    Json,
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(OutputError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = OutputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
        }
    }
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    original: &'a str,
    obfuscated: &'a str,
    technique: &'a str,
    technique_category: &'a str,
    timestamp: String,
}

/// Opens the destination for a run: the file at `path`, created or truncated, or stdout.
pub fn open_sink(path: Option<&Path>) -> Result<Box<dyn Write>, OutputError> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|source| OutputError::Create {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Writes one variant per line. Returns the number of records written.
pub fn write_text<I, W>(records: I, sink: &mut W) -> Result<usize, OutputError>
where
    I: IntoIterator<Item = VariantRecord>,
    W: Write + ?Sized,
{
    let mut count = 0;
    for record in records {
        writeln!(sink, "{}", record.variant)?;
        count += 1;
    }
    sink.flush()?;
    info!("Wrote {} obfuscated payloads (text format)", count);
    Ok(count)
}

/// Writes a JSON array, one object per line, each stamped with the time it was written.
/// Returns the number of records written.
pub fn write_json<I, W>(records: I, sink: &mut W) -> Result<usize, OutputError>
where
    I: IntoIterator<Item = VariantRecord>,
    W: Write + ?Sized,
{
    sink.write_all(b"[\n")?;
    let mut count = 0;
    for record in records {
        if count > 0 {
            sink.write_all(b",\n")?;
        }
        let entry = JsonEntry {
            original: &record.original,
            obfuscated: &record.variant,
            technique: record.technique_name(),
            technique_category: record.category_name(),
            timestamp: Utc::now().to_rfc3339(),
        };
        sink.write_all(b"  ")?;
        serde_json::to_writer(&mut *sink, &entry)?;
        count += 1;
    }
    sink.write_all(b"\n]\n")?;
    sink.flush()?;
    info!("Wrote {} obfuscated payloads (JSON format)", count);
    Ok(count)
}

pub fn write_records<I, W>(
    format: OutputFormat,
    records: I,
    sink: &mut W,
) -> Result<usize, OutputError>
where
    I: IntoIterator<Item = VariantRecord>,
    W: Write + ?Sized,
{
    match format {
        OutputFormat::Text => write_text(records, sink),
        OutputFormat::Json => write_json(records, sink),
    }
}
