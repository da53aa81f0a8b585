//! Schedule-indexed activity tree.
//!
//! # Responsibility
//! - File activities under `year -> month -> day` branches of their schedule.
//! - Provide locate, insert, remove, relocate and flatten over the tree.
//!
//! # Invariants
//! - Each activity lives in exactly one list, the one its schedule maps to:
//!   depth 0 in the root `loose` list, depth 1 in the year `loose` list,
//!   depth 2 in the month `loose` list, depth 3+ in the day list.
//! - Hour and minute never create branches.
//! - Branches exist only while non-empty; `locate` with `fill_gaps` may create
//!   empty branches right before an insert, and `remove` prunes them again.
//! - Flatten order is structural (loose lists before keyed children, keys
//!   ascending), not chronological.

pub mod codec;

use crate::model::activity::{Activity, ActivityId};
use crate::model::schedule::Schedule;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type IndexResult<T> = Result<T, IndexError>;

/// Errors from schedule index lookups and mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// A branch along the path is missing and gap filling was not requested.
    MissingBranch(ListKey),
    /// The list for `key` does not contain the activity.
    ActivityNotFound { id: ActivityId, key: ListKey },
}

impl Display for IndexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingBranch(key) => write!(f, "schedule index has no branch for {key}"),
            Self::ActivityNotFound { id, key } => {
                write!(f, "activity {id} is not filed under {key}")
            }
        }
    }
}

impl Error for IndexError {}

/// Address of one activity list inside the tree.
///
/// `month` is only set together with `year`, and `day` only with `month`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListKey {
    year: Option<i32>,
    month: Option<i32>,
    day: Option<i32>,
}

impl ListKey {
    /// The root `loose` list.
    pub const ROOT: Self = Self {
        year: None,
        month: None,
        day: None,
    };

    /// List an activity with `schedule` belongs to.
    pub fn of(schedule: Option<&Schedule>) -> Self {
        let Some(schedule) = schedule else {
            return Self::ROOT;
        };
        Self {
            year: schedule.year,
            month: schedule.month_at_depth(),
            day: schedule.day_at_depth(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<i32> {
        self.month
    }

    pub fn day(&self) -> Option<i32> {
        self.day
    }

    /// Tree level of the list: 0 root, 1 year, 2 month, 3 day.
    pub fn level(&self) -> u8 {
        match (self.year, self.month, self.day) {
            (None, _, _) => 0,
            (Some(_), None, _) => 1,
            (Some(_), Some(_), None) => 2,
            (Some(_), Some(_), Some(_)) => 3,
        }
    }

    pub(crate) fn year_loose(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::ROOT
        }
    }

    pub(crate) fn month_loose(year: i32, month: i32) -> Self {
        Self {
            month: Some(month),
            ..Self::year_loose(year)
        }
    }

    pub(crate) fn day_list(year: i32, month: i32, day: i32) -> Self {
        Self {
            day: Some(day),
            ..Self::month_loose(year, month)
        }
    }
}

impl Display for ListKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.year, self.month, self.day) {
            (None, _, _) => write!(f, "loose"),
            (Some(year), None, _) => write!(f, "{year}/loose"),
            (Some(year), Some(month), None) => write!(f, "{year}/{month}/loose"),
            (Some(year), Some(month), Some(day)) => write!(f, "{year}/{month}/{day}"),
        }
    }
}

/// Activities filed under one calendar month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthNode {
    pub(crate) days: BTreeMap<i32, Vec<Activity>>,
    pub(crate) loose: Vec<Activity>,
}

impl MonthNode {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.loose.is_empty()
    }
}

/// Activities filed under one calendar year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearNode {
    pub(crate) months: BTreeMap<i32, MonthNode>,
    pub(crate) loose: Vec<Activity>,
}

impl YearNode {
    pub fn is_empty(&self) -> bool {
        self.months.is_empty() && self.loose.is_empty()
    }
}

/// Root of the schedule index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTree {
    pub(crate) years: BTreeMap<i32, YearNode>,
    pub(crate) loose: Vec<Activity>,
}

/// Node reached by `ScheduleTree::locate`.
#[derive(Debug)]
pub enum TreePosition<'a> {
    Root(&'a mut ScheduleTree),
    Year(&'a mut YearNode),
    Month(&'a mut MonthNode),
    Day(&'a mut Vec<Activity>),
}

impl<'a> TreePosition<'a> {
    /// Day list itself, or the `loose` list of a tree node.
    pub fn into_activity_list(self) -> &'a mut Vec<Activity> {
        match self {
            Self::Root(tree) => &mut tree.loose,
            Self::Year(node) => &mut node.loose,
            Self::Month(node) => &mut node.loose,
            Self::Day(list) => list,
        }
    }
}

impl ScheduleTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() && self.loose.is_empty()
    }

    /// Total number of filed activities.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.for_each_list(|_, list| count += list.len());
        count
    }

    /// Descends along `key` and returns the deepest node it names.
    ///
    /// With `fill_gaps`, missing branches are created empty on the way down;
    /// otherwise a missing branch is an error.
    pub fn locate(&mut self, key: ListKey, fill_gaps: bool) -> IndexResult<TreePosition<'_>> {
        let Some(year) = key.year else {
            return Ok(TreePosition::Root(self));
        };
        let year_node = if fill_gaps {
            self.years.entry(year).or_default()
        } else {
            self.years
                .get_mut(&year)
                .ok_or(IndexError::MissingBranch(ListKey::year_loose(year)))?
        };

        let Some(month) = key.month else {
            return Ok(TreePosition::Year(year_node));
        };
        let month_node = if fill_gaps {
            year_node.months.entry(month).or_default()
        } else {
            year_node
                .months
                .get_mut(&month)
                .ok_or(IndexError::MissingBranch(ListKey::month_loose(year, month)))?
        };

        let Some(day) = key.day else {
            return Ok(TreePosition::Month(month_node));
        };
        let day_list = if fill_gaps {
            month_node.days.entry(day).or_default()
        } else {
            month_node
                .days
                .get_mut(&day)
                .ok_or(IndexError::MissingBranch(key))?
        };
        Ok(TreePosition::Day(day_list))
    }

    /// Activity list addressed by `key`.
    pub fn locate_activity_list(
        &mut self,
        key: ListKey,
        fill_gaps: bool,
    ) -> IndexResult<&mut Vec<Activity>> {
        self.locate(key, fill_gaps)
            .map(TreePosition::into_activity_list)
    }

    /// Read-only view of the list addressed by `key`, if it exists.
    pub fn activity_list(&self, key: ListKey) -> Option<&[Activity]> {
        let Some(year) = key.year else {
            return Some(&self.loose);
        };
        let year_node = self.years.get(&year)?;
        let Some(month) = key.month else {
            return Some(&year_node.loose);
        };
        let month_node = year_node.months.get(&month)?;
        match key.day {
            None => Some(&month_node.loose),
            Some(day) => month_node.days.get(&day).map(Vec::as_slice),
        }
    }

    /// Appends `activity` to the list its schedule maps to.
    pub fn insert(&mut self, activity: Activity) -> ListKey {
        let key = ListKey::of(activity.schedule.as_ref());
        // Gap filling creates every branch on the path, so lookup cannot fail.
        if let Ok(list) = self.locate_activity_list(key, true) {
            list.push(activity);
        }
        key
    }

    /// Removes the activity `id` from the list at `key`.
    pub fn remove(&mut self, key: ListKey, id: &str) -> IndexResult<Activity> {
        let list = self.locate_activity_list(key, false)?;
        let position = list
            .iter()
            .position(|activity| activity.id == id)
            .ok_or_else(|| IndexError::ActivityNotFound {
                id: id.to_string(),
                key,
            })?;
        let activity = list.remove(position);
        self.prune(key);
        Ok(activity)
    }

    /// Moves activity `id` from `key` to the list for `new_schedule`.
    ///
    /// Returns the new list key. Nothing changes when the activity is not
    /// found at `key`.
    pub fn relocate(
        &mut self,
        key: ListKey,
        id: &str,
        new_schedule: Schedule,
    ) -> IndexResult<ListKey> {
        let mut activity = self.remove(key, id)?;
        activity.set_schedule(new_schedule);
        Ok(self.insert(activity))
    }

    pub fn find(&self, key: ListKey, id: &str) -> Option<&Activity> {
        self.activity_list(key)?
            .iter()
            .find(|activity| activity.id == id)
    }

    pub fn find_mut(&mut self, key: ListKey, id: &str) -> Option<&mut Activity> {
        self.locate_activity_list(key, false)
            .ok()?
            .iter_mut()
            .find(|activity| activity.id == id)
    }

    /// Every filed activity in structural order.
    pub fn flatten(&self) -> Vec<&Activity> {
        let mut activities = Vec::with_capacity(self.len());
        self.for_each_list(|_, list| activities.extend(list.iter()));
        activities
    }

    /// Visits every non-empty list with its key in structural order.
    pub fn for_each_list<'a>(&'a self, mut visit: impl FnMut(ListKey, &'a [Activity])) {
        if !self.loose.is_empty() {
            visit(ListKey::ROOT, &self.loose);
        }
        for (&year, year_node) in &self.years {
            if !year_node.loose.is_empty() {
                visit(ListKey::year_loose(year), &year_node.loose);
            }
            for (&month, month_node) in &year_node.months {
                if !month_node.loose.is_empty() {
                    visit(ListKey::month_loose(year, month), &month_node.loose);
                }
                for (&day, list) in &month_node.days {
                    if !list.is_empty() {
                        visit(ListKey::day_list(year, month, day), list);
                    }
                }
            }
        }
    }

    fn prune(&mut self, key: ListKey) {
        let Some(year) = key.year else {
            return;
        };
        let Some(year_node) = self.years.get_mut(&year) else {
            return;
        };
        if let Some(month) = key.month {
            if let Some(month_node) = year_node.months.get_mut(&month) {
                if let Some(day) = key.day {
                    if month_node.days.get(&day).is_some_and(Vec::is_empty) {
                        month_node.days.remove(&day);
                    }
                }
                if month_node.is_empty() {
                    year_node.months.remove(&month);
                }
            }
        }
        if year_node.is_empty() {
            self.years.remove(&year);
        }
    }
}
