//! # camledger Core
//!
//! Deterministic transaction processor for the camledger surveillance
//! ledger.
//!
//! This crate provides:
//! - Camera, access-log and video-content records with canonical encoding
//! - A [`Ledger`] running every operation in a buffered [`Transaction`]
//! - Full-scan collection queries ([`Scanner`])
//! - A string-argument call surface ([`Ledger::invoke`])
//!
//! Every value written is canonical CBOR and every timestamp comes from
//! the [`TxContext`], so nodes executing the same transaction against the
//! same state write the same bytes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod invoke;
mod ledger;
pub mod record;
mod scan;
mod transaction;
pub mod validate;

pub use config::{Config, GenesisCamera};
pub use context::TxContext;
pub use error::{CoreError, CoreResult, EntityKind, ErrorKind};
pub use invoke::Function;
pub use ledger::{Ledger, VideoAnchor};
pub use record::{
    AccessLog, CameraDevice, CameraStatus, DocType, Record, RecordCodec, VideoContent,
    VideoMetadata,
};
pub use scan::{ScanStats, Scanner};
pub use transaction::{PendingWrite, Transaction, WriteSet};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
