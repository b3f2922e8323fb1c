//! Error types for the FIFO log buffer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while creating, writing or reading the FIFO.
#[derive(Error, Debug)]
pub enum FifoError {
    /// Capacity outside of `1..=MAX_CAPACITY`.
    #[error("invalid capacity {0}: must be between 1 and {max}", max = crate::layout::MAX_CAPACITY)]
    InvalidCapacity(u32),

    /// A real entry was appended with the reserved "empty" timestamp.
    #[error("invalid timestamp {0}: entries need a positive epoch time")]
    InvalidTimestamp(i64),

    /// Another process already holds the writer role for this segment.
    #[error("segment {} already has a writer", path.display())]
    WriterBusy {
        /// Segment path.
        path: PathBuf,
    },

    /// The segment could not be created or mapped.
    #[error("cannot map segment {}: {source}", path.display())]
    Segment {
        /// Segment path.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Segment header or size does not match the expected layout.
    #[error("corrupt segment: {0}")]
    Corrupt(String),

    /// A segment of ours, written with a different layout version or slot size.
    #[error("incompatible segment: {0}")]
    Incompatible(String),

    /// Caller was not authorized to read the log.
    #[error("unauthorized")]
    Unauthorized,

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FifoError {
    /// Returns true for failures that must abort startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Segment { .. }
                | Self::Corrupt(_)
                | Self::Incompatible(_)
                | Self::WriterBusy { .. }
        )
    }
}
