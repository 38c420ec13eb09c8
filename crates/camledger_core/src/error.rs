//! Error types for the transaction processor.

use camledger_state::StateError;
use std::fmt;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Entity kind named in identity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A camera device.
    Camera,
    /// An access log entry.
    AccessLog,
    /// A video content anchor.
    VideoContent,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Camera => "camera",
            EntityKind::AccessLog => "access log",
            EntityKind::VideoContent => "video content",
        })
    }
}

/// Coarse classification of a [`CoreError`], for callers that relay
/// failures (a gateway mapping them to response codes, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Duplicate identity on create.
    AlreadyExists,
    /// Operation against an absent entity.
    NotFound,
    /// Operation against a camera that is not `active`.
    PreconditionFailed,
    /// Malformed caller arguments.
    InvalidArgument,
    /// Storage or encoding failure; not the caller's fault.
    Internal,
}

/// Errors that can abort a ledger transaction.
///
/// Any error leaves the world state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entity being created already exists.
    #[error("{kind} {id} already exists")]
    AlreadyExists {
        /// Kind of the entity.
        kind: EntityKind,
        /// Its identifier.
        id: String,
    },

    /// The entity does not exist.
    #[error("{kind} {id} does not exist")]
    NotFound {
        /// Kind of the entity.
        kind: EntityKind,
        /// Its identifier.
        id: String,
    },

    /// The camera's status does not permit the operation.
    #[error("precondition failed: {message}")]
    PreconditionFailed {
        /// Description of the unmet precondition.
        message: String,
    },

    /// An argument is malformed.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// A stored value could not be decoded as the expected record.
    #[error("corrupt record: {message}")]
    CorruptRecord {
        /// Description of the problem.
        message: String,
    },

    /// World-state accessor error.
    #[error("state error: {0}")]
    State(StateError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] camledger_codec::CodecError),

    /// JSON response encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StateError> for CoreError {
    fn from(err: StateError) -> Self {
        match err {
            // Keys are built from caller-supplied identifiers.
            StateError::InvalidKey(message) => Self::InvalidArgument { message },
            other => Self::State(other),
        }
    }
}

impl CoreError {
    /// Creates an already-exists error.
    pub fn already_exists(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            id: id.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a precondition-failed error.
    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a corrupt-record error.
    pub fn corrupt_record(message: impl Into<String>) -> Self {
        Self::CorruptRecord {
            message: message.into(),
        }
    }

    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::CorruptRecord { .. } | Self::State(_) | Self::Codec(_) | Self::Json(_) => {
                ErrorKind::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = CoreError::already_exists(EntityKind::Camera, "CAM-1");
        assert_eq!(err.to_string(), "camera CAM-1 already exists");

        let err = CoreError::not_found(EntityKind::VideoContent, "V-9");
        assert_eq!(err.to_string(), "video content V-9 does not exist");
    }

    #[test]
    fn invalid_state_key_is_caller_error() {
        let err: CoreError = StateError::InvalidKey("empty camera id".into()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err: CoreError = StateError::Locked.into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }
}
