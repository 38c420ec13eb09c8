//! Codec failures.

use thiserror::Error;

/// Result alias used throughout the codec.
pub type CodecResult<T> = Result<T, CodecError>;

/// Reasons a value cannot be encoded, or bytes cannot be accepted as
/// canonical CBOR.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A map contains the same key twice.
    #[error("duplicate map key")]
    DuplicateKey,

    /// Float is not in the fixed binary64 form, or carries a non-canonical NaN.
    #[error("non-canonical float encoding")]
    NonCanonicalFloat,

    /// Input uses an indefinite-length string, array or map.
    #[error("indefinite length is not canonical")]
    IndefiniteLengthForbidden,

    /// A text string is not valid UTF-8.
    #[error("text string is not UTF-8")]
    InvalidUtf8,

    /// Input ends inside a value.
    #[error("input truncated")]
    UnexpectedEof,

    /// Bytes remain after the top-level value.
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes {
        /// Number of unread bytes.
        remaining: usize,
    },

    /// Well-formed but non-canonical, or malformed, input.
    #[error("malformed CBOR: {message}")]
    InvalidStructure {
        /// What was wrong.
        message: String,
    },

    /// Input uses a CBOR feature the ledger never writes (tags, simple
    /// values, short floats).
    #[error("CBOR {type_name} not accepted")]
    UnsupportedType {
        /// The rejected feature.
        type_name: String,
    },

    /// A length prefix claims more than the decoder accepts.
    #[error("size limit exceeded: claimed {claimed}, max {max_allowed}")]
    SizeLimitExceeded {
        /// Length claimed by the input.
        claimed: u64,
        /// Largest length accepted.
        max_allowed: u64,
    },

    /// Structured input (JSON) could not be converted.
    #[error("invalid structured input: {message}")]
    InvalidInput {
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Shorthand for [`CodecError::InvalidStructure`].
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Shorthand for [`CodecError::UnsupportedType`].
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Shorthand for [`CodecError::InvalidInput`].
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}
