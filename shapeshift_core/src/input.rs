use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Not a regular file: {0:?}")]
    NotAFile(PathBuf),

    #[error("File not readable: {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("Input is not valid UTF-8 (line {line})")]
    InvalidUtf8 { line: usize },

    #[error("Failed to read line {line}: {source}")]
    Read { line: usize, source: io::Error },
}

/// Lazily yields payloads from a line-oriented source.
///
/// Blank lines and lines whose first non-whitespace character is `#` are skipped. Line
/// endings are stripped; any other whitespace is part of the payload.
pub struct PayloadReader<R: BufRead> {
    reader: R,
    line_number: usize,
    buffer: Vec<u8>,
}

impl<R: BufRead> PayloadReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buffer: Vec::new(),
        }
    }
}

impl<R: BufRead> Iterator for PayloadReader<R> {
    type Item = Result<String, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(InputError::Read {
                        line: self.line_number + 1,
                        source,
                    }));
                }
            }
            self.line_number += 1;

            let line = match std::str::from_utf8(&self.buffer) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(_) => {
                    return Some(Err(InputError::InvalidUtf8 {
                        line: self.line_number,
                    }));
                }
            };
            if line.is_empty() || line.trim_start().starts_with('#') {
                debug!("Skipping line {} (empty or comment)", self.line_number);
                continue;
            }
            return Some(Ok(line.to_string()));
        }
    }
}

/// Opens `path` for reading payloads, failing up front if it is missing, not a regular
/// file, or unreadable.
pub fn read_payloads(path: &Path) -> Result<PayloadReader<BufReader<File>>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(InputError::NotAFile(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PayloadReader::new(BufReader::new(file)))
}
