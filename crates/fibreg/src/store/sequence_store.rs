use crate::{Algorithm, Error, Outcome, Result, SequenceId, SequenceRecord};
use core::time::Duration;
use num_bigint::BigUint;
use parking_lot::RwLock;
use portable_atomic::{AtomicU64, Ordering};
use std::collections::HashMap;
#[cfg(feature = "tracing")]
use tracing::instrument;

/// Concurrent map from [`SequenceId`] to [`SequenceRecord`].
///
/// ## Concurrency
/// - The id counter is an [`AtomicU64`]; allocation never takes the map lock.
/// - The map sits behind a [`RwLock`]: lookups share the read side, inserts
///   and completions take the write side.
/// - [`Self::find`] clones the record under the read lock, so a reader sees
///   either the whole pending record or the whole complete record.
///
/// Records are never removed; the store lives as long as the process.
#[derive(Debug, Default)]
pub struct SequenceStore {
    next_id: AtomicU64,
    records: RwLock<HashMap<SequenceId, SequenceRecord>>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id, strictly greater than every id returned before.
    ///
    /// The id only reserves a name; nothing is stored until [`Self::insert`].
    pub fn allocate_id(&self) -> SequenceId {
        SequenceId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Stores `record` under its own id.
    ///
    /// # Errors
    /// [`Error::DuplicateId`] if a record with that id already exists; the
    /// stored record is left untouched.
    pub fn insert(&self, record: SequenceRecord) -> Result<()> {
        let id = record.id();
        let mut records = self.records.write();
        if records.contains_key(&id) {
            return Err(Error::DuplicateId { id });
        }
        records.insert(id, record);
        Ok(())
    }

    /// Allocates an id and stores a pending record under it in one step.
    ///
    /// The write lock is held across allocation and insertion, so ids enter
    /// the map in allocation order and the returned id is visible to
    /// [`Self::find`] before this call returns.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn create_pending(&self, algorithm: Algorithm, input: u64) -> SequenceRecord {
        let mut records = self.records.write();
        let id = self.allocate_id();
        let record = SequenceRecord::pending(id, algorithm, input);
        records.insert(id, record.clone());
        record
    }

    /// Moves the record at `id` from pending to complete.
    ///
    /// # Errors
    /// - [`Error::NotFound`] if no record is stored under `id`.
    /// - [`Error::AlreadyComplete`] if the record already finished; the first
    ///   outcome is kept.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self, result)))]
    pub fn update_result(&self, id: SequenceId, result: BigUint, elapsed: Duration) -> Result<()> {
        self.finish(id, Outcome::Complete { result, elapsed })
    }

    /// Moves the record at `id` from pending to failed, keeping `reason`.
    ///
    /// # Errors
    /// Same as [`Self::update_result`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn record_failure(&self, id: SequenceId, reason: String, elapsed: Duration) -> Result<()> {
        self.finish(id, Outcome::Failed { reason, elapsed })
    }

    fn finish(&self, id: SequenceId, outcome: Outcome) -> Result<()> {
        let mut records = self.records.write();
        let record = records.get_mut(&id).ok_or(Error::NotFound { id })?;
        if record.finish(outcome) {
            Ok(())
        } else {
            Err(Error::AlreadyComplete { id })
        }
    }

    /// Returns a snapshot of the record at `id`.
    ///
    /// # Errors
    /// [`Error::NotFound`] if no record is stored under `id`.
    pub fn find(&self, id: SequenceId) -> Result<SequenceRecord> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or(Error::NotFound { id })
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
