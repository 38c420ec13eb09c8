//! # camledger state
//!
//! World-state accessor trait and implementations for camledger.
//!
//! The world state is the current key/value snapshot of every ledger
//! record. Accessors are **opaque byte stores**: get, put, delete and an
//! unordered full scan. They know nothing about record encoding; the only
//! structure they offer is [`StateKey`], which places every entity kind in
//! its own namespace.
//!
//! ## Available Accessors
//!
//! - [`InMemoryWorldState`] - For testing and ephemeral ledgers
//! - [`FileWorldState`] - Append-only journal with crash recovery
//!
//! ## Example
//!
//! ```rust
//! use camledger_state::{InMemoryWorldState, StateKey, WorldState};
//!
//! let mut state = InMemoryWorldState::new();
//! let key = StateKey::camera("CAM-1").unwrap();
//! state.put(&key.to_bytes(), b"record").unwrap();
//! assert!(state.get(&key.to_bytes()).unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod key;
mod memory;
mod world_state;

pub use error::{StateError, StateResult};
pub use file::{FileOptions, FileWorldState, FRAME_MAGIC, MAX_ENTRY_SIZE};
pub use key::{Namespace, StateKey};
pub use memory::InMemoryWorldState;
pub use world_state::{StateEntry, StateScan, WorldState};
