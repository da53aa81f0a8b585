//! Listing scope: sort order and filters for `list_activity_ids`.
//!
//! # Invariants
//! - Filters narrow independently; an absent filter admits everything.
//! - `before`/`after` share one `include_match` flag per range.
//! - `checked_off` matches exactly: an activity without the field matches
//!   neither `true` nor `false`.

use crate::model::activity::{json_kind, Activity};
use crate::model::schedule::{compare_schedules, Schedule};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;

/// Sort and filter options for listing activity ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListScope {
    #[serde(default)]
    pub sort: SortOptions,
    #[serde(default)]
    pub filter: ActivityFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortOptions {
    /// Earliest schedule first. Default order is latest first.
    #[serde(default, rename = "scheduleAscending")]
    pub schedule_ascending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivityFilter {
    #[serde(default)]
    pub checked_off: Option<bool>,
    #[serde(default)]
    pub creation: Option<RangeFilter<i64>>,
    #[serde(default)]
    pub schedule: Option<RangeFilter<Schedule>>,
}

/// Open or closed range around optional `before`/`after` bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeFilter<T> {
    pub before: Option<T>,
    pub after: Option<T>,
    #[serde(default, rename = "includeMatch")]
    pub include_match: bool,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
            include_match: false,
        }
    }
}

impl<T> RangeFilter<T> {
    pub fn before(bound: T) -> Self {
        Self {
            before: Some(bound),
            ..Self::default()
        }
    }

    pub fn after(bound: T) -> Self {
        Self {
            after: Some(bound),
            ..Self::default()
        }
    }

    pub fn including_match(mut self) -> Self {
        self.include_match = true;
        self
    }

    /// Tests `value` against both bounds using `compare(value, bound)`.
    pub fn admits<V: ?Sized>(&self, value: &V, compare: impl Fn(&V, &T) -> Ordering) -> bool {
        let passes = |bound: &Option<T>, wanted: Ordering| match bound {
            None => true,
            Some(bound) => {
                let ordering = compare(value, bound);
                ordering == wanted || (ordering == Ordering::Equal && self.include_match)
            }
        };
        passes(&self.before, Ordering::Less) && passes(&self.after, Ordering::Greater)
    }
}

impl ActivityFilter {
    pub fn admits(&self, activity: &Activity) -> bool {
        if let Some(checked_off) = self.checked_off {
            if activity.checked_off != Some(checked_off) {
                return false;
            }
        }
        if let Some(range) = &self.creation {
            if !range.admits(&activity.creation, |value, bound| value.cmp(bound)) {
                return false;
            }
        }
        if let Some(range) = &self.schedule {
            let admitted = range.admits(&activity.schedule, |value, bound| {
                compare_schedules(value.as_ref(), Some(bound))
            });
            if !admitted {
                return false;
            }
        }
        true
    }
}

/// Rejected scope payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeError(pub String);

impl std::fmt::Display for ScopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid list scope: {}", self.0)
    }
}

impl std::error::Error for ScopeError {}

impl ListScope {
    /// Ascending schedule order, no filters.
    pub fn ascending() -> Self {
        Self {
            sort: SortOptions {
                schedule_ascending: true,
            },
            ..Self::default()
        }
    }

    /// Decodes an untyped scope coming from a command layer.
    pub fn from_value(value: &Value) -> Result<Self, ScopeError> {
        if !value.is_object() {
            return Err(ScopeError(format!(
                "scope must be an object, got {}",
                json_kind(value)
            )));
        }
        Self::deserialize(value).map_err(|err| ScopeError(err.to_string()))
    }

    /// Unchecked activities scheduled before the day after `today`.
    pub fn due_by(today: NaiveDate) -> Self {
        Self {
            sort: SortOptions::default(),
            filter: ActivityFilter {
                checked_off: Some(false),
                schedule: Some(RangeFilter::before(day_after(today))),
                ..ActivityFilter::default()
            },
        }
    }

    /// Unchecked activities scheduled from the day after `today` on,
    /// earliest first.
    pub fn upcoming(today: NaiveDate) -> Self {
        Self {
            sort: SortOptions {
                schedule_ascending: true,
            },
            filter: ActivityFilter {
                checked_off: Some(false),
                schedule: Some(RangeFilter::after(day_after(today)).including_match()),
                ..ActivityFilter::default()
            },
        }
    }
}

/// Day after `today`; day overflow rolls into the next month when resolved.
fn day_after(today: NaiveDate) -> Schedule {
    let mut schedule = Schedule::from_date(today);
    schedule.day = schedule.day.map(|day| day + 1);
    schedule
}

#[cfg(test)]
mod tests {
    use super::{ListScope, RangeFilter};
    use serde_json::json;

    #[test]
    fn range_without_bounds_admits_everything() {
        let range = RangeFilter::<i64>::default();
        assert!(range.admits(&5_i64, |value, bound| value.cmp(bound)));
    }

    #[test]
    fn include_match_applies_to_both_bounds() {
        let closed = RangeFilter {
            before: Some(10_i64),
            after: Some(10_i64),
            include_match: true,
        };
        let open = RangeFilter {
            include_match: false,
            ..closed.clone()
        };
        assert!(closed.admits(&10_i64, |value: &i64, bound| value.cmp(bound)));
        assert!(!open.admits(&10_i64, |value: &i64, bound| value.cmp(bound)));
    }

    #[test]
    fn from_value_uses_camel_case_wire_names() {
        let scope = ListScope::from_value(&json!({
            "sort": { "scheduleAscending": true },
            "filter": {
                "checked_off": false,
                "creation": { "after": 1000, "includeMatch": true }
            }
        }))
        .unwrap();

        assert!(scope.sort.schedule_ascending);
        assert_eq!(scope.filter.checked_off, Some(false));
        let creation = scope.filter.creation.unwrap();
        assert_eq!(creation.after, Some(1000));
        assert!(creation.include_match);
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(ListScope::from_value(&json!([1, 2])).is_err());
        assert!(ListScope::from_value(&json!({ "sort": "desc" })).is_err());
    }
}
