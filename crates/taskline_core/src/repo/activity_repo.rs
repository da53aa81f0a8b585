//! Activity repository: the public operation set over the schedule index.
//!
//! # Responsibility
//! - Create, read, update, duplicate, delete and list activities.
//! - Keep the id placements, the id allocator and the persisted slot in step
//!   with the schedule index.
//!
//! # Invariants
//! - Every mutation updates memory first and saves the whole tree last.
//! - `placements` and the allocator hold exactly the ids in the tree after
//!   every completed operation.
//! - An update relocates (when the schedule changes) before merging any other
//!   field, so a relocation failure leaves the activity untouched.
//! - A failed save leaves memory ahead of the slot; there is no rollback.

use crate::fault::FaultKind;
use crate::ids::IdAllocator;
use crate::index::{IndexError, ListKey, ScheduleTree};
use crate::model::activity::{Activity, ActivityDiff, ActivityDraft, ActivityId, DiffError};
use crate::model::schedule::compare_schedules;
use crate::repo::scope::{ListScope, ScopeError};
use crate::store::{load_from, ActivityStore, SlotStore, StoreError};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot used when the caller does not pick one.
pub const DEFAULT_ACTIVITIES_SLOT: &str = "activities";
/// Alternate slot for development data.
pub const DEVELOPMENT_ACTIVITIES_SLOT: &str = "development";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for activity operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller passed a value of the wrong shape.
    InvalidArgument(String),
    NotFound(ActivityId),
    /// Schedule index lost track of an activity it should hold.
    Index(IndexError),
    Store(StoreError),
}

impl RepoError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::InvalidArgument(_) => FaultKind::InvalidArgumentType,
            Self::NotFound(_) => FaultKind::NotFound,
            Self::Index(_) => FaultKind::StructuralInvariantViolation,
            Self::Store(err) => err.kind(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound(id) => write!(f, "activity not found: {id}"),
            Self::Index(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidArgument(_) => None,
            Self::NotFound(_) => None,
            Self::Index(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<IndexError> for RepoError {
    fn from(value: IndexError) -> Self {
        Self::Index(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DiffError> for RepoError {
    fn from(value: DiffError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

impl From<ScopeError> for RepoError {
    fn from(value: ScopeError) -> Self {
        Self::InvalidArgument(value.to_string())
    }
}

/// Activities of one storage slot, indexed by schedule and by id.
pub struct ActivityRepository<S: SlotStore> {
    store: ActivityStore<S>,
    tree: ScheduleTree,
    /// Non-owning back-references: id -> list the activity is filed in.
    placements: HashMap<ActivityId, ListKey>,
    ids: IdAllocator,
}

impl<S: SlotStore> ActivityRepository<S> {
    /// Loads `slot_key` from `slots` and indexes its activities.
    ///
    /// # Errors
    /// - `InvalidArgument` when `slot_key` is blank.
    /// - Store errors when the slot is unreadable, unparsable or corrupt.
    pub fn open(slots: S, slot_key: &str) -> RepoResult<Self> {
        let key = validate_slot_key(slot_key)?;
        let tree = load_from(&slots, &key)?;

        let mut repo = Self {
            store: ActivityStore::new(slots, key),
            tree: ScheduleTree::new(),
            placements: HashMap::new(),
            ids: IdAllocator::new(),
        };
        repo.install(tree);
        info!(
            "event=repo_open module=repo status=ok slot={} activities={}",
            repo.store.key(),
            repo.placements.len()
        );
        Ok(repo)
    }

    /// Opens the default `activities` slot.
    pub fn open_default(slots: S) -> RepoResult<Self> {
        Self::open(slots, DEFAULT_ACTIVITIES_SLOT)
    }

    pub fn storage_slot(&self) -> &str {
        self.store.key()
    }

    /// Switches to another slot and rebuilds all in-memory state from it.
    ///
    /// The switch is atomic: when the new slot fails to load, the current
    /// slot and state stay active and the error is returned.
    pub fn set_storage_slot(&mut self, slot_key: &str) -> RepoResult<()> {
        let key = validate_slot_key(slot_key)?;
        let tree = load_from(self.store.slots(), &key).map_err(|err| {
            warn!(
                "event=repo_switch_slot module=repo status=error from={} to={key} error_code={}",
                self.store.key(),
                err.kind()
            );
            err
        })?;

        info!(
            "event=repo_switch_slot module=repo status=ok from={} to={key} activities={}",
            self.store.key(),
            tree.len()
        );
        self.store.set_key(key);
        self.install(tree);
        Ok(())
    }

    pub fn get_activity(&self, id: &str) -> Option<&Activity> {
        let key = self.placements.get(id)?;
        self.tree.find(*key, id)
    }

    /// Assigns a fresh id to `draft`, files it and persists.
    pub fn create_activity(&mut self, draft: ActivityDraft) -> RepoResult<ActivityId> {
        let id = self.ids.allocate();
        let key = self.tree.insert(Activity::from_draft(id.clone(), draft));
        self.placements.insert(id.clone(), key);
        self.persist("activity_create", &id)?;
        Ok(id)
    }

    /// Applies `diff` to activity `id` and persists.
    pub fn update_activity(&mut self, id: &str, mut diff: ActivityDiff) -> RepoResult<()> {
        let mut key = self.placement(id)?;
        if let Some(schedule) = diff.schedule.take() {
            key = self.tree.relocate(key, id, schedule)?;
            self.placements.insert(id.to_string(), key);
        }

        let activity = self
            .tree
            .find_mut(key, id)
            .ok_or_else(|| IndexError::ActivityNotFound {
                id: id.to_string(),
                key,
            })?;
        diff.merge_fields_into(activity);
        self.persist("activity_update", id)
    }

    /// Decodes an untyped diff, then applies it like `update_activity`.
    pub fn update_activity_value(&mut self, id: &str, diff: &Value) -> RepoResult<()> {
        let diff = ActivityDiff::from_value(diff)?;
        self.update_activity(id, diff)
    }

    /// Files a structural copy of activity `id` under a new id, then applies
    /// `diff` to the copy. Returns the new id.
    pub fn duplicate_activity(
        &mut self,
        id: &str,
        diff: Option<ActivityDiff>,
    ) -> RepoResult<ActivityId> {
        let draft = self
            .get_activity(id)
            .map(Activity::to_draft)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;

        let copy_id = self.create_activity(draft)?;
        if let Some(diff) = diff {
            self.update_activity(&copy_id, diff)?;
        }
        debug!("event=activity_duplicate module=repo status=ok source_id={id} id={copy_id}");
        Ok(copy_id)
    }

    /// Removes activity `id`, releases its id and persists.
    pub fn delete_activity(&mut self, id: &str) -> RepoResult<()> {
        let key = self.placement(id)?;
        self.tree.remove(key, id)?;
        self.ids.release(id);
        self.placements.remove(id);
        self.persist("activity_delete", id)
    }

    /// Ordered ids of the activities admitted by `scope`.
    ///
    /// Default order is latest schedule first; ties keep index order.
    pub fn list_activity_ids(&self, scope: &ListScope) -> Vec<ActivityId> {
        let mut activities = self.tree.flatten();
        if scope.sort.schedule_ascending {
            activities.sort_by(|a, b| compare_schedules(a.schedule.as_ref(), b.schedule.as_ref()));
        } else {
            activities.sort_by(|a, b| compare_schedules(b.schedule.as_ref(), a.schedule.as_ref()));
        }
        activities.retain(|activity| scope.filter.admits(activity));

        debug!(
            "event=activity_list module=repo status=ok slot={} total={} returned={}",
            self.store.key(),
            self.placements.len(),
            activities.len()
        );
        activities
            .into_iter()
            .map(|activity| activity.id.clone())
            .collect()
    }

    /// Decodes an optional untyped scope, then lists like `list_activity_ids`.
    pub fn list_activity_ids_value(&self, scope: Option<&Value>) -> RepoResult<Vec<ActivityId>> {
        let scope = match scope {
            Some(value) => ListScope::from_value(value)?,
            None => ListScope::default(),
        };
        Ok(self.list_activity_ids(&scope))
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Read-only view of the schedule index.
    pub fn tree(&self) -> &ScheduleTree {
        &self.tree
    }

    pub fn store(&self) -> &ActivityStore<S> {
        &self.store
    }

    fn placement(&self, id: &str) -> RepoResult<ListKey> {
        self.placements
            .get(id)
            .copied()
            .ok_or_else(|| RepoError::NotFound(id.to_string()))
    }

    fn install(&mut self, tree: ScheduleTree) {
        self.placements.clear();
        self.ids.clear();
        tree.for_each_list(|key, list| {
            for activity in list {
                self.ids.track_existing(&activity.id);
                self.placements.insert(activity.id.clone(), key);
            }
        });
        self.tree = tree;
    }

    fn persist(&self, event: &str, id: &str) -> RepoResult<()> {
        match self.store.save(&self.tree) {
            Ok(()) => {
                info!(
                    "event={event} module=repo status=ok slot={} id={id}",
                    self.store.key()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event={event} module=repo status=error slot={} id={id} error_code={} error={err}",
                    self.store.key(),
                    err.kind()
                );
                Err(err.into())
            }
        }
    }
}

/// Rejects blank keys; any other key is used exactly as given.
fn validate_slot_key(slot_key: &str) -> RepoResult<String> {
    if slot_key.trim().is_empty() {
        return Err(RepoError::InvalidArgument(
            "storage slot key must not be blank".to_string(),
        ));
    }
    Ok(slot_key.to_string())
}
