//! Flat-file storage
//!
//! Each record type lives in its own line-oriented file inside the data
//! directory. Reads are whole-file; writes go to a temporary file that is then
//! renamed over the original.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::{CodecError, CodecResult};

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Types persisted as one line per record
pub trait Record: Sized {
    /// File name inside the data directory
    const KEY: &'static str;

    /// Encode into a single line (without the trailing newline)
    fn encode(&self) -> String;

    /// Decode one line
    fn decode(line: &str) -> CodecResult<Self>;
}

/// A line that could not be decoded
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    pub file: &'static str,
    /// 1-based line number
    pub line: usize,
    pub error: CodecError,
}

impl fmt::Display for RejectedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.error)
    }
}

/// Decoded contents of one record file
#[derive(Debug)]
pub struct Loaded<T> {
    /// Decoded records with their 1-based line numbers, in file order
    pub records: Vec<(usize, T)>,
    pub rejected: Vec<RejectedLine>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Storage manager for the data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Ensure the data directory exists
    fn ensure_dir(&self) -> StorageResult<()> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).map_err(|e| StorageError::io(&self.data_dir, e))?;
            debug!("Created data directory: {:?}", self.data_dir);
        }
        Ok(())
    }

    pub fn file_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(key)
    }

    /// Read a file's raw contents
    ///
    /// Returns None if the file doesn't exist.
    pub fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.file_path(key);

        if !path.exists() {
            debug!("Data file not found: {}", key);
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::io(&path, e))
    }

    /// Load and decode every line of a record file
    ///
    /// Blank lines are skipped. Lines that fail to decode are reported in
    /// [`Loaded::rejected`] and do not stop the load.
    pub fn load<T: Record>(&self) -> StorageResult<Loaded<T>> {
        let mut loaded = Loaded::default();

        let Some(content) = self.read(T::KEY)? else {
            return Ok(loaded);
        };

        for (index, line) in content.lines().enumerate() {
            let line_no = index + 1;
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }
            match T::decode(line) {
                Ok(record) => loaded.records.push((line_no, record)),
                Err(error) => {
                    warn!("Skipping {}:{}: {}", T::KEY, line_no, error);
                    loaded.rejected.push(RejectedLine {
                        file: T::KEY,
                        line: line_no,
                        error,
                    });
                }
            }
        }

        debug!(
            "Loaded {}: {} records, {} rejected",
            T::KEY,
            loaded.records.len(),
            loaded.rejected.len()
        );

        Ok(loaded)
    }

    /// Write raw lines to a file
    ///
    /// Writes atomically by first writing to a temp file, then renaming.
    pub fn write_lines<I, S>(&self, key: &str, lines: I) -> StorageResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_dir()?;

        let path = self.file_path(key);
        let temp_path = self.file_path(&format!("{}.tmp", key));

        let mut content = String::new();
        let mut count = 0;
        for line in lines {
            content.push_str(line.as_ref());
            content.push('\n');
            count += 1;
        }

        fs::write(&temp_path, &content).map_err(|e| StorageError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| StorageError::io(&path, e))?;

        debug!("Saved {}: {} records", key, count);
        Ok(count)
    }

    /// Encode and write records to their file
    pub fn save<'a, T, I>(&self, records: I) -> StorageResult<usize>
    where
        T: Record + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.write_lines(T::KEY, records.into_iter().map(|record| record.encode()))
    }
}
