//! Error types for world-state access.

use std::io;
use thiserror::Error;

/// Result type for world-state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur while reading or writing the world state.
#[derive(Debug, Error)]
pub enum StateError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The journal is corrupted before its tail.
    #[error("journal corrupted at offset {offset}: {message}")]
    Corrupted {
        /// Byte offset of the offending frame.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Another process holds the journal lock.
    #[error("world state locked: another process has exclusive access")]
    Locked,

    /// A key or value is too large for the journal frame format.
    #[error("entry too large: {len} bytes (max {max})")]
    EntryTooLarge {
        /// Offending length.
        len: usize,
        /// Largest accepted length.
        max: usize,
    },

    /// A key did not parse as a namespaced state key.
    #[error("invalid state key: {0}")]
    InvalidKey(String),
}

impl StateError {
    /// Creates a corruption error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::Corrupted {
            offset,
            message: message.into(),
        }
    }
}
