use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `arcmap` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A query was rejected before any I/O took place (blank archive path,
    /// blank filter pattern).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The filter pattern was supplied but is not a valid regular expression.
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// An I/O error occurred while opening or reading the archive.
    /// Includes the path where the error happened when one is known.
    #[error("I/O error on '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    /// The archive bytes do not form a valid ZIP structure.
    #[error("not a valid ZIP archive: {0}")]
    Format(String),

    /// The archive's manifest exists but cannot be parsed.
    #[error("malformed manifest: {0}")]
    Manifest(String),

    /// Manifest information was requested but the archive carries no
    /// `META-INF/MANIFEST.MF` entry.
    #[error("archive has no manifest")]
    ManifestMissing,

    /// The sequential stream ended before an entry's expected byte count
    /// was satisfied.
    #[error("truncated entry '{path}': expected {expected} bytes, read {actual}")]
    Truncated {
        path: String,
        expected: u64,
        actual: u64,
    },
}

impl Error {
    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
