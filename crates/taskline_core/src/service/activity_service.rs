//! Activity use-case service.
//!
//! # Responsibility
//! - Provide command-level entry points (add, check off, reschedule, copy,
//!   switch environment) on top of the repository.
//! - Fill the fields the repository deliberately leaves to its caller.
//!
//! # Invariants
//! - Service APIs never bypass repository persistence.
//! - New activities start with `checked_off = false` and the current time as
//!   `creation`.

use crate::fault::FaultKind;
use crate::model::activity::{ActivityDiff, ActivityDraft, ActivityId};
use crate::model::schedule::Schedule;
use crate::repo::activity_repo::{
    ActivityRepository, RepoError, DEFAULT_ACTIVITIES_SLOT, DEVELOPMENT_ACTIVITIES_SLOT,
};
use crate::repo::scope::ListScope;
use crate::store::SlotStore;
use chrono::{Local, NaiveDate, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Activity name is blank after trim.
    InvalidName,
    /// Environment toggle found a slot that is neither known environment.
    UnexpectedSlot(String),
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::InvalidName | Self::UnexpectedSlot(_) => FaultKind::InvalidArgumentType,
            Self::Repo(err) => err.kind(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "activity name must not be blank"),
            Self::UnexpectedSlot(slot) => {
                write!(f, "unexpected storage slot for activities: {slot}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case wrapper around one activity repository.
pub struct ActivityService<S: SlotStore> {
    repo: ActivityRepository<S>,
}

impl<S: SlotStore> ActivityService<S> {
    pub fn new(repo: ActivityRepository<S>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &ActivityRepository<S> {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut ActivityRepository<S> {
        &mut self.repo
    }

    pub fn into_repo(self) -> ActivityRepository<S> {
        self.repo
    }

    /// Creates an unchecked activity stamped with the current time.
    pub fn add_activity(
        &mut self,
        name: &str,
        schedule: Option<Schedule>,
    ) -> ServiceResult<ActivityId> {
        self.add_activity_created_at(name, schedule, Utc::now().timestamp_millis())
    }

    /// Same as `add_activity` with an explicit `creation` timestamp.
    pub fn add_activity_created_at(
        &mut self,
        name: &str,
        schedule: Option<Schedule>,
        creation_ms: i64,
    ) -> ServiceResult<ActivityId> {
        if name.trim().is_empty() {
            return Err(ServiceError::InvalidName);
        }
        let draft = ActivityDraft {
            schedule,
            ..ActivityDraft::new(creation_ms)
                .named(name)
                .checked_off(false)
        };
        Ok(self.repo.create_activity(draft)?)
    }

    /// Flips `checked_off`; an activity that never had it becomes checked.
    ///
    /// Returns the new value.
    pub fn toggle_checked_off(&mut self, id: &str) -> ServiceResult<bool> {
        let current = self
            .repo
            .get_activity(id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?
            .checked_off;
        let next = !current.unwrap_or(false);
        self.repo
            .update_activity(id, ActivityDiff::checked_off(next))?;
        Ok(next)
    }

    /// Moves the activity to `schedule`.
    pub fn reschedule(&mut self, id: &str, schedule: Schedule) -> ServiceResult<()> {
        self.repo.update_activity(id, ActivityDiff::schedule(schedule))?;
        Ok(())
    }

    /// Copies the activity onto calendar day `date`, recording its origin.
    pub fn copy_into_day(&mut self, id: &str, date: NaiveDate) -> ServiceResult<ActivityId> {
        let diff = ActivityDiff {
            schedule: Some(Schedule::from_date(date)),
            origin: Some(id.to_string()),
            ..ActivityDiff::default()
        };
        Ok(self.repo.duplicate_activity(id, Some(diff))?)
    }

    /// Copies the activity onto today's local date.
    pub fn copy_into_today(&mut self, id: &str) -> ServiceResult<ActivityId> {
        self.copy_into_day(id, Local::now().date_naive())
    }

    /// Switches between the `activities` and `development` slots.
    ///
    /// Returns the newly active slot.
    pub fn toggle_storage_environment(&mut self) -> ServiceResult<&str> {
        let next = match self.repo.storage_slot() {
            DEFAULT_ACTIVITIES_SLOT => DEVELOPMENT_ACTIVITIES_SLOT,
            DEVELOPMENT_ACTIVITIES_SLOT => DEFAULT_ACTIVITIES_SLOT,
            other => return Err(ServiceError::UnexpectedSlot(other.to_string())),
        };
        self.repo.set_storage_slot(next)?;
        Ok(self.repo.storage_slot())
    }

    /// Unchecked activities due up to and including `today`.
    pub fn due_by(&self, today: NaiveDate) -> Vec<ActivityId> {
        self.repo.list_activity_ids(&ListScope::due_by(today))
    }

    /// Unchecked activities scheduled after `today`, earliest first.
    pub fn upcoming(&self, today: NaiveDate) -> Vec<ActivityId> {
        self.repo.list_activity_ids(&ListScope::upcoming(today))
    }
}
