//! In-memory world state for testing.

use crate::error::StateResult;
use crate::world_state::{StateScan, WorldState};
use std::collections::HashMap;

/// An in-memory world state.
///
/// This accessor keeps every entry in a hash map and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral ledgers that don't need persistence
///
/// Scans follow the hash map's iteration order, which is arbitrary and
/// differs between instances; code built on top must not depend on it.
///
/// # Example
///
/// ```rust
/// use camledger_state::{InMemoryWorldState, WorldState};
///
/// let mut state = InMemoryWorldState::new();
/// state.put(b"camera\0CAM-1", b"record").unwrap();
/// assert_eq!(state.get(b"camera\0CAM-1").unwrap(), Some(b"record".to_vec()));
/// assert_eq!(state.len().unwrap(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryWorldState {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryWorldState {
    /// Creates a new empty world state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a world state with pre-existing entries.
    ///
    /// Useful for seeding raw (possibly malformed) values in tests.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = (Vec<u8>, Vec<u8>)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Returns a sorted copy of all entries.
    ///
    /// Useful for comparing two states byte for byte.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }

    /// Clears all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl WorldState for InMemoryWorldState {
    fn get(&self, key: &[u8]) -> StateResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> StateResult<()> {
        self.entries.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StateResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn scan_all(&self) -> StateResult<StateScan<'_>> {
        Ok(Box::new(
            self.entries.iter().map(|(k, v)| Ok((k.clone(), v.clone()))),
        ))
    }

    fn len(&self) -> StateResult<usize> {
        Ok(self.entries.len())
    }
}
