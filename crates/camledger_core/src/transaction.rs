//! Buffered ledger transactions.

use crate::error::CoreResult;
use crate::record::RecordCodec;
use camledger_state::{StateKey, StateResult, WorldState};
use std::collections::BTreeMap;

/// A pending write in a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    /// Store a value.
    Put {
        /// Encoded record bytes.
        payload: Vec<u8>,
    },
    /// Remove the key.
    Delete,
}

/// An in-flight transaction.
///
/// Reads go to the world state, except for keys this transaction already
/// wrote, which read back the pending value. Writes are buffered and reach
/// the world state only through [`WriteSet::apply`], after the operation
/// has succeeded. Dropping a transaction discards its writes.
pub struct Transaction<'s, S: WorldState + ?Sized> {
    state: &'s S,
    writes: BTreeMap<Vec<u8>, PendingWrite>,
}

impl<'s, S: WorldState + ?Sized> Transaction<'s, S> {
    /// Starts a transaction over `state`.
    pub fn new(state: &'s S) -> Self {
        Self {
            state,
            writes: BTreeMap::new(),
        }
    }

    /// Reads the current value of `key`.
    pub fn get(&self, key: &StateKey) -> CoreResult<Option<Vec<u8>>> {
        let raw = key.to_bytes();
        match self.writes.get(&raw) {
            Some(PendingWrite::Put { payload }) => Ok(Some(payload.clone())),
            Some(PendingWrite::Delete) => Ok(None),
            None => Ok(self.state.get(&raw)?),
        }
    }

    /// Returns `true` if a non-empty value is stored at `key`.
    pub fn exists(&self, key: &StateKey) -> CoreResult<bool> {
        Ok(self.get(key)?.is_some_and(|v| !v.is_empty()))
    }

    /// Reads and decodes the record at `key`.
    pub fn get_record<R: RecordCodec>(&self, key: &StateKey) -> CoreResult<Option<R>> {
        match self.get(key)? {
            Some(bytes) if !bytes.is_empty() => R::decode(&bytes).map(Some),
            _ => Ok(None),
        }
    }

    /// Buffers a put.
    pub fn put(&mut self, key: &StateKey, payload: Vec<u8>) {
        self.writes
            .insert(key.to_bytes(), PendingWrite::Put { payload });
    }

    /// Buffers a delete.
    pub fn delete(&mut self, key: &StateKey) {
        self.writes.insert(key.to_bytes(), PendingWrite::Delete);
    }

    /// Encodes `record` canonically and buffers it under its own key.
    pub fn put_record<R: RecordCodec>(&mut self, record: &R) -> CoreResult<StateKey> {
        let key = record.state_key()?;
        let payload = record.encode()?;
        self.put(&key, payload);
        Ok(key)
    }

    /// Number of buffered writes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Ends the transaction, yielding its write set.
    #[must_use]
    pub fn into_writes(self) -> WriteSet {
        WriteSet {
            writes: self.writes,
        }
    }
}

/// The writes of a finished transaction, ordered by key.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteSet {
    writes: BTreeMap<Vec<u8>, PendingWrite>,
}

impl WriteSet {
    /// Number of writes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns `true` if the transaction wrote nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Iterates the writes in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &PendingWrite)> {
        self.writes.iter().map(|(k, w)| (k.as_slice(), w))
    }

    /// Applies the writes to `state` in key order.
    pub fn apply<S: WorldState + ?Sized>(self, state: &mut S) -> StateResult<()> {
        for (key, write) in self.writes {
            match write {
                PendingWrite::Put { payload } => state.put(&key, &payload)?,
                PendingWrite::Delete => state.delete(&key)?,
            }
        }
        Ok(())
    }
}
