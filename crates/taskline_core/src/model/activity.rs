//! Activity domain model.
//!
//! # Responsibility
//! - Define the persisted activity record and its create/update inputs.
//! - Decode untyped update payloads at the boundary with shape checks.
//!
//! # Invariants
//! - `id` is assigned once by the repository and never changes.
//! - `creation` is set by the caller at creation time and only changes
//!   through an explicit diff.
//! - An absent `checked_off` is distinct from `Some(false)`.
//! - Stored keys the model does not interpret survive a load/save cycle.

use crate::model::schedule::Schedule;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque activity identifier.
pub type ActivityId = String;

/// Keys the activity model interprets; any other stored key is kept in
/// `Activity::extra`.
const ACTIVITY_FIELDS: [&str; 6] = ["id", "creation", "name", "checked_off", "schedule", "origin"];

/// Scheduled task/event record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "StoredActivity")]
pub struct Activity {
    pub id: ActivityId,
    /// Unix epoch milliseconds.
    pub creation: i64,
    pub name: Option<String>,
    pub checked_off: Option<bool>,
    pub schedule: Option<Schedule>,
    /// Id of the activity this one was copied from.
    pub origin: Option<ActivityId>,
    /// Stored keys this model does not interpret, written back unchanged.
    ///
    /// A stored `schedule` that is not an object is kept here too and is
    /// replaced by the first real schedule set through `set_schedule`.
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Stamps `id` onto a draft.
    pub fn from_draft(id: ActivityId, draft: ActivityDraft) -> Self {
        Self {
            id,
            creation: draft.creation,
            name: draft.name,
            checked_off: draft.checked_off,
            schedule: draft.schedule,
            origin: draft.origin,
            extra: draft.extra,
        }
    }

    /// Structural copy without the identifier.
    pub fn to_draft(&self) -> ActivityDraft {
        ActivityDraft {
            creation: self.creation,
            name: self.name.clone(),
            checked_off: self.checked_off,
            schedule: self.schedule.clone(),
            origin: self.origin.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Returns true only for an explicit `checked_off = true`.
    pub fn is_checked_off(&self) -> bool {
        self.checked_off == Some(true)
    }

    /// Sets the schedule, dropping any unreadable stored schedule value.
    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.extra.remove("schedule");
        self.schedule = Some(schedule);
    }
}

impl Serialize for Activity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("creation", &self.creation)?;
        if let Some(name) = &self.name {
            map.serialize_entry("name", name)?;
        }
        if let Some(checked_off) = &self.checked_off {
            map.serialize_entry("checked_off", checked_off)?;
        }
        match &self.schedule {
            Some(schedule) => map.serialize_entry("schedule", schedule)?,
            None => {
                if let Some(raw) = self.extra.get("schedule") {
                    map.serialize_entry("schedule", raw)?;
                }
            }
        }
        if let Some(origin) = &self.origin {
            map.serialize_entry("origin", origin)?;
        }
        for (key, value) in &self.extra {
            if !ACTIVITY_FIELDS.contains(&key.as_str()) {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Persisted activity shape before the schedule is interpreted.
#[derive(Deserialize)]
struct StoredActivity {
    id: ActivityId,
    creation: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    checked_off: Option<bool>,
    #[serde(default, deserialize_with = "raw_value")]
    schedule: Option<Value>,
    #[serde(default)]
    origin: Option<ActivityId>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<StoredActivity> for Activity {
    type Error = serde_json::Error;

    fn try_from(stored: StoredActivity) -> Result<Self, Self::Error> {
        let mut extra = stored.extra;
        let schedule = match stored.schedule {
            Some(value @ Value::Object(_)) => Some(Schedule::deserialize(value)?),
            Some(unreadable) => {
                extra.insert("schedule".to_string(), unreadable);
                None
            }
            None => None,
        };
        Ok(Self {
            id: stored.id,
            creation: stored.creation,
            name: stored.name,
            checked_off: stored.checked_off,
            schedule,
            origin: stored.origin,
            extra,
        })
    }
}

/// Activity fields supplied by the caller on creation.
///
/// The repository does not default anything here; command-level helpers in
/// `ActivityService` fill `creation` and `checked_off`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityDraft {
    pub creation: i64,
    pub name: Option<String>,
    pub checked_off: Option<bool>,
    pub schedule: Option<Schedule>,
    pub origin: Option<ActivityId>,
    /// Uninterpreted keys carried over by duplication.
    pub extra: Map<String, Value>,
}

impl ActivityDraft {
    pub fn new(creation: i64) -> Self {
        Self {
            creation,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn scheduled(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn checked_off(mut self, checked_off: bool) -> Self {
        self.checked_off = Some(checked_off);
        self
    }
}

/// Shallow update applied to an existing activity.
///
/// Present fields overwrite, absent fields are left untouched. A present
/// `schedule` moves the activity within the schedule index before the other
/// fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityDiff {
    #[serde(default)]
    pub creation: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub checked_off: Option<bool>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub origin: Option<ActivityId>,
}

/// Rejected update payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// Payload is not a JSON object.
    NotAnObject(&'static str),
    /// Payload tries to overwrite the immutable `id`.
    ImmutableId,
    /// `schedule` is present but is not an object.
    ScheduleNotAnObject(&'static str),
    /// Unknown key or wrongly typed value.
    InvalidField(String),
}

impl Display for DiffError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject(found) => write!(f, "activity diff must be an object, got {found}"),
            Self::ImmutableId => write!(f, "activity diff must not contain `id`"),
            Self::ScheduleNotAnObject(found) => {
                write!(f, "activity diff `schedule` must be an object, got {found}")
            }
            Self::InvalidField(message) => write!(f, "invalid activity diff: {message}"),
        }
    }
}

impl Error for DiffError {}

impl ActivityDiff {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn schedule(schedule: Schedule) -> Self {
        Self {
            schedule: Some(schedule),
            ..Self::default()
        }
    }

    pub fn checked_off(checked_off: bool) -> Self {
        Self {
            checked_off: Some(checked_off),
            ..Self::default()
        }
    }

    /// Decodes an untyped payload coming from a command layer.
    pub fn from_value(value: &Value) -> Result<Self, DiffError> {
        let Some(fields) = value.as_object() else {
            return Err(DiffError::NotAnObject(json_kind(value)));
        };
        if fields.contains_key("id") {
            return Err(DiffError::ImmutableId);
        }
        if let Some(schedule) = fields.get("schedule") {
            if !schedule.is_object() {
                return Err(DiffError::ScheduleNotAnObject(json_kind(schedule)));
            }
        }
        Self::deserialize(value).map_err(|err| DiffError::InvalidField(err.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merges every non-schedule field into `activity`.
    pub(crate) fn merge_fields_into(self, activity: &mut Activity) {
        if let Some(creation) = self.creation {
            activity.creation = creation;
        }
        if let Some(name) = self.name {
            activity.name = Some(name);
        }
        if let Some(checked_off) = self.checked_off {
            activity.checked_off = Some(checked_off);
        }
        if let Some(origin) = self.origin {
            activity.origin = Some(origin);
        }
    }
}

/// Short JSON type name used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Keeps a present value as-is, `null` included.
fn raw_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
