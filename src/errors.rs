use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::splits::SplitLabel;
use crate::types::LineNumber;

/// Error type for dataset loading, encoding, sampling, and batching failures.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A split file could not be opened or read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A line does not follow the `relation<TAB>entity...` layout.
    #[error("{split} line {line}: {reason}")]
    MalformedLine {
        split: SplitLabel,
        line: LineNumber,
        reason: String,
    },
    /// A token was not seen during vocabulary construction.
    #[error("{split} line {line}: token '{token}' is missing from the vocabulary")]
    UnknownToken {
        split: SplitLabel,
        line: LineNumber,
        token: String,
    },
    /// A count exceeds what the id or size types can hold.
    #[error("{what} holds {len} entries, exceeding the maximum of {max}")]
    Capacity {
        what: &'static str,
        len: usize,
        max: usize,
    },
    /// Rejected loader settings.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An example index past the end of its split.
    #[error("example index {index} is out of range for {len} examples")]
    IndexOutOfRange { index: usize, len: usize },
    /// Negatives were requested but no real entity exists.
    #[error("no real entities are available for sampling")]
    EmptyVocabulary,
    /// A background or pool worker stopped unexpectedly.
    #[error("data loading worker failed: {0}")]
    WorkerFailed(String),
}
