//! Wire format of the schedule index.
//!
//! # Responsibility
//! - Encode the tree as nested JSON objects keyed by stringified numbers,
//!   with day lists and `loose` lists as arrays of activities.
//! - Decode untrusted JSON back into a tree, validating its whole shape.
//!
//! # Invariants
//! - Decoding never repairs data: any deviation is reported, nothing is
//!   silently dropped except empty branches.
//! - A decoded tree satisfies every index invariant (placement, unique ids).

use crate::index::{ListKey, MonthNode, ScheduleTree, YearNode};
use crate::model::activity::{json_kind, Activity, ActivityId};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reserved key for activities not specific enough for a deeper branch.
pub const LOOSE_KEY: &str = "loose";

pub type DecodeResult<T> = Result<T, DecodeError>;

/// Reasons a JSON value is not a valid schedule index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Root value is not an object.
    NotAnObject { found: &'static str },
    /// A nested position holds the wrong kind of value.
    UnexpectedShape {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Branch key is neither `loose` nor a canonical integer.
    InvalidKey { path: String, key: String },
    /// List element is not a valid activity record.
    InvalidActivity { path: String, message: String },
    /// Activity is filed under a branch its schedule does not map to.
    MisplacedActivity {
        id: ActivityId,
        path: String,
        expected: String,
    },
    DuplicateId(ActivityId),
}

impl DecodeError {
    /// True when a tree position had the wrong node kind.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::UnexpectedShape { .. })
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject { found } => {
                write!(f, "schedule index must be an object, got {found}")
            }
            Self::UnexpectedShape {
                path,
                expected,
                found,
            } => write!(f, "expected {expected} at `{path}`, got {found}"),
            Self::InvalidKey { path, key } => {
                write!(f, "invalid branch key `{key}` under `{path}`")
            }
            Self::InvalidActivity { path, message } => {
                write!(f, "invalid activity at `{path}`: {message}")
            }
            Self::MisplacedActivity { id, path, expected } => write!(
                f,
                "activity {id} is stored under `{path}` but its schedule maps to `{expected}`"
            ),
            Self::DuplicateId(id) => write!(f, "activity id {id} appears more than once"),
        }
    }
}

impl Error for DecodeError {}

impl Serialize for ScheduleTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.loose.is_empty() {
            map.serialize_entry(LOOSE_KEY, &self.loose)?;
        }
        for (year, node) in &self.years {
            map.serialize_entry(&year.to_string(), node)?;
        }
        map.end()
    }
}

impl Serialize for YearNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.loose.is_empty() {
            map.serialize_entry(LOOSE_KEY, &self.loose)?;
        }
        for (month, node) in &self.months {
            map.serialize_entry(&month.to_string(), node)?;
        }
        map.end()
    }
}

impl Serialize for MonthNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if !self.loose.is_empty() {
            map.serialize_entry(LOOSE_KEY, &self.loose)?;
        }
        for (day, list) in &self.days {
            map.serialize_entry(&day.to_string(), list)?;
        }
        map.end()
    }
}

/// Encodes the tree to its persisted string form.
pub fn encode_tree(tree: &ScheduleTree) -> serde_json::Result<String> {
    serde_json::to_string(tree)
}

/// Decodes and validates a persisted tree.
pub fn decode_tree(value: &Value) -> DecodeResult<ScheduleTree> {
    let Some(root) = value.as_object() else {
        return Err(DecodeError::NotAnObject {
            found: json_kind(value),
        });
    };

    let mut decoder = Decoder::default();
    let mut tree = ScheduleTree::new();
    for (key, child) in root {
        if key == LOOSE_KEY {
            tree.loose = decoder.list(child, ListKey::ROOT)?;
            continue;
        }
        let year = branch_key(key, "")?;
        let node = decoder.year(child, year)?;
        if !node.is_empty() {
            tree.years.insert(year, node);
        }
    }
    Ok(tree)
}

#[derive(Default)]
struct Decoder {
    seen: HashSet<ActivityId>,
}

impl Decoder {
    fn year(&mut self, value: &Value, year: i32) -> DecodeResult<YearNode> {
        let path = year.to_string();
        let fields = expect_object(value, &path)?;
        let mut node = YearNode::default();
        for (key, child) in fields {
            if key == LOOSE_KEY {
                node.loose = self.list(child, ListKey::year_loose(year))?;
                continue;
            }
            let month = branch_key(key, &path)?;
            let month_node = self.month(child, year, month)?;
            if !month_node.is_empty() {
                node.months.insert(month, month_node);
            }
        }
        Ok(node)
    }

    fn month(&mut self, value: &Value, year: i32, month: i32) -> DecodeResult<MonthNode> {
        let path = format!("{year}/{month}");
        let fields = expect_object(value, &path)?;
        let mut node = MonthNode::default();
        for (key, child) in fields {
            if key == LOOSE_KEY {
                node.loose = self.list(child, ListKey::month_loose(year, month))?;
                continue;
            }
            let day = branch_key(key, &path)?;
            let list = self.list(child, ListKey::day_list(year, month, day))?;
            if !list.is_empty() {
                node.days.insert(day, list);
            }
        }
        Ok(node)
    }

    fn list(&mut self, value: &Value, key: ListKey) -> DecodeResult<Vec<Activity>> {
        let path = key.to_string();
        let Some(items) = value.as_array() else {
            return Err(DecodeError::UnexpectedShape {
                path,
                expected: "activity list",
                found: json_kind(value),
            });
        };

        let mut activities = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let activity =
                Activity::deserialize(item).map_err(|err| DecodeError::InvalidActivity {
                    path: format!("{path}[{index}]"),
                    message: err.to_string(),
                })?;

            let expected = ListKey::of(activity.schedule.as_ref());
            if expected != key {
                return Err(DecodeError::MisplacedActivity {
                    id: activity.id,
                    path,
                    expected: expected.to_string(),
                });
            }
            if !self.seen.insert(activity.id.clone()) {
                return Err(DecodeError::DuplicateId(activity.id));
            }
            activities.push(activity);
        }
        Ok(activities)
    }
}

fn expect_object<'v>(value: &'v Value, path: &str) -> DecodeResult<&'v Map<String, Value>> {
    value.as_object().ok_or_else(|| DecodeError::UnexpectedShape {
        path: path.to_string(),
        expected: "tree node",
        found: json_kind(value),
    })
}

fn branch_key(key: &str, path: &str) -> DecodeResult<i32> {
    let invalid = || DecodeError::InvalidKey {
        path: if path.is_empty() {
            "root".to_string()
        } else {
            path.to_string()
        },
        key: key.to_string(),
    };
    let number = key.parse::<i32>().map_err(|_| invalid())?;
    // Reject aliases such as "03" or "+3" that would collide with "3".
    if number.to_string() != key {
        return Err(invalid());
    }
    Ok(number)
}
