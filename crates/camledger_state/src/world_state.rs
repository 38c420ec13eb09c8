//! World-state accessor trait definition.

use crate::error::StateResult;

/// One `(key, value)` entry produced by a scan.
pub type StateEntry = (Vec<u8>, Vec<u8>);

/// Lazy, single-pass sequence of live entries.
pub type StateScan<'a> = Box<dyn Iterator<Item = StateResult<StateEntry>> + 'a>;

/// Key/value access to the current ledger snapshot.
///
/// World-state accessors are **opaque byte stores**: they do not interpret
/// keys or values. Record encoding, validation and key namespacing belong
/// to the layers above.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last `put` under that key, or `None`
///   after a `delete`
/// - `scan_all` visits every live key exactly once, in no particular order;
///   callers must tolerate any enumeration order
/// - A scan is finite and cannot be restarted; call `scan_all` again for a
///   fresh pass
///
/// Ordering of transactions and point-in-time isolation are provided by
/// whatever runtime drives the accessor, not by the accessor itself.
///
/// # Implementors
///
/// - [`super::InMemoryWorldState`] - For testing
/// - [`super::FileWorldState`] - Journal-backed persistent state
pub trait WorldState: Send + Sync {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn get(&self, key: &[u8]) -> StateResult<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be made durable.
    fn put(&mut self, key: &[u8], value: &[u8]) -> StateResult<()>;

    /// Removes `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be made durable.
    fn delete(&mut self, key: &[u8]) -> StateResult<()>;

    /// Iterates every live entry once, unordered.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan cannot be started; per-entry failures
    /// are reported through the iterator.
    fn scan_all(&self) -> StateResult<StateScan<'_>>;

    /// Returns the number of live keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be determined.
    fn len(&self) -> StateResult<usize>;

    /// Returns `true` if no keys are live.
    ///
    /// # Errors
    ///
    /// Returns an error if the count cannot be determined.
    fn is_empty(&self) -> StateResult<bool> {
        Ok(self.len()? == 0)
    }
}
