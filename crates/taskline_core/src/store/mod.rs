//! Persistence adapter between the schedule index and a key-value slot.
//!
//! # Responsibility
//! - Define the string-keyed slot contract the core persists through.
//! - Load and save the whole schedule index as one JSON blob per slot.
//!
//! # Invariants
//! - An absent slot loads as an empty tree, never as an error.
//! - Unparsable JSON and a malformed tree are distinct failures.
//! - Loading never repairs or discards stored data.

mod memory;
mod sqlite;

pub use memory::MemorySlotStore;
pub use sqlite::SqliteSlotStore;

use crate::db::DbError;
use crate::fault::FaultKind;
use crate::index::codec::{decode_tree, encode_tree, DecodeError};
use crate::index::ScheduleTree;
use log::{debug, error, info};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from slot storage and tree (de)serialization.
#[derive(Debug)]
pub enum StoreError {
    /// Backend failure (SQLite I/O, schema state).
    Db(DbError),
    /// Slot content is not valid JSON.
    Unparsable {
        slot: String,
        source: serde_json::Error,
    },
    /// Slot content is JSON but not a valid schedule index.
    Corrupt { slot: String, source: DecodeError },
    /// Tree could not be encoded.
    Encode(serde_json::Error),
}

impl StoreError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Db(_) => FaultKind::StorageBackend,
            Self::Unparsable { .. } => FaultKind::UnparsablePersistedData,
            Self::Corrupt { source, .. } if source.is_structural() => {
                FaultKind::StructuralInvariantViolation
            }
            Self::Corrupt { .. } => FaultKind::CorruptPersistedData,
            Self::Encode(_) => FaultKind::StorageBackend,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unparsable { slot, source } => {
                write!(f, "storage slot `{slot}` is not valid JSON: {source}")
            }
            Self::Corrupt { slot, source } => {
                write!(f, "storage slot `{slot}` holds corrupt data: {source}")
            }
            Self::Encode(err) => write!(f, "failed to encode schedule index: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unparsable { source, .. } => Some(source),
            Self::Corrupt { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String-keyed persistent slots ("read a string by key" / "write a string
/// by key").
pub trait SlotStore {
    fn read_slot(&self, key: &str) -> StoreResult<Option<String>>;
    fn write_slot(&self, key: &str, value: &str) -> StoreResult<()>;
}

impl<T: SlotStore + ?Sized> SlotStore for &T {
    fn read_slot(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).write_slot(key, value)
    }
}

/// Schedule index persisted in one slot of a `SlotStore`.
#[derive(Debug)]
pub struct ActivityStore<S: SlotStore> {
    slots: S,
    key: String,
}

impl<S: SlotStore> ActivityStore<S> {
    pub fn new(slots: S, key: impl Into<String>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn slots(&self) -> &S {
        &self.slots
    }

    /// Points the adapter at another slot; nothing is read or written.
    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
    }

    /// Loads the tree from the current slot.
    pub fn load(&self) -> StoreResult<ScheduleTree> {
        load_from(&self.slots, &self.key)
    }

    /// Serializes and writes the whole tree to the current slot.
    pub fn save(&self, tree: &ScheduleTree) -> StoreResult<()> {
        let started_at = Instant::now();
        let payload = encode_tree(tree).map_err(StoreError::Encode)?;
        self.write(&payload)?;
        debug!(
            "event=slot_save module=store status=ok slot={} bytes={} duration_ms={}",
            self.key,
            payload.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Resets the current slot to an empty tree.
    pub fn clear(&self) -> StoreResult<()> {
        self.write("{}")?;
        info!("event=slot_clear module=store status=ok slot={}", self.key);
        Ok(())
    }

    fn write(&self, payload: &str) -> StoreResult<()> {
        self.slots.write_slot(&self.key, payload).map_err(|err| {
            error!(
                "event=slot_save module=store status=error slot={} error={err}",
                self.key
            );
            err
        })
    }
}

/// Loads and validates the tree stored under `key`.
pub(crate) fn load_from(slots: &impl SlotStore, key: &str) -> StoreResult<ScheduleTree> {
    let started_at = Instant::now();
    let Some(payload) = slots.read_slot(key)? else {
        debug!("event=slot_load module=store status=ok slot={key} state=uninitialized");
        return Ok(ScheduleTree::new());
    };

    let result = serde_json::from_str::<Value>(&payload)
        .map_err(|source| StoreError::Unparsable {
            slot: key.to_string(),
            source,
        })
        .and_then(|value| {
            decode_tree(&value).map_err(|source| StoreError::Corrupt {
                slot: key.to_string(),
                source,
            })
        });

    match &result {
        Ok(tree) => debug!(
            "event=slot_load module=store status=ok slot={key} bytes={} activities={} duration_ms={}",
            payload.len(),
            tree.len(),
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=slot_load module=store status=error slot={key} error_code={} error={err}",
            err.kind()
        ),
    }
    result
}
