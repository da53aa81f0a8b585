//! Partial calendar schedule and its chronological ordering.
//!
//! # Responsibility
//! - Define the `year -> month -> day -> hour -> minute` schedule descriptor.
//! - Resolve a schedule to an orderable instant and compare schedules.
//!
//! # Invariants
//! - A schedule is valid up to its depth: the count of leading present fields.
//!   Fields after the first absent one are kept for round-trips but ignored.
//! - Non-numeric field values count as absent and are written back unchanged.
//! - Month is 1-based in the schedule and 0-based during date construction.
//! - Depth 0 (no year) resolves to the Unix epoch.
//! - Equal instants are ordered by depth, shallower first.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Maximum schedule depth (year, month, day, hour, minute).
pub const MAX_SCHEDULE_DEPTH: u8 = 5;

/// Field names in depth order.
const FIELD_NAMES: [&str; 5] = ["year", "month", "day", "hour", "minute"];

/// Partial date/time descriptor attached to an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub year: Option<i32>,
    /// 1-based (1 = January).
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub hour: Option<i32>,
    pub minute: Option<i32>,
    /// Stored keys that are not integral calendar fields, kept verbatim.
    ///
    /// A non-numeric `year` lands here and the schedule has depth 0.
    pub extra: Map<String, Value>,
}

impl Schedule {
    /// Year-only schedule (depth 1).
    pub fn in_year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    /// Year and month schedule (depth 2).
    pub fn in_month(year: i32, month: i32) -> Self {
        Self {
            month: Some(month),
            ..Self::in_year(year)
        }
    }

    /// Calendar day schedule (depth 3).
    pub fn on_day(year: i32, month: i32, day: i32) -> Self {
        Self {
            day: Some(day),
            ..Self::in_month(year, month)
        }
    }

    /// Calendar day plus time of day (depth 5).
    pub fn at_time(year: i32, month: i32, day: i32, hour: i32, minute: i32) -> Self {
        Self {
            hour: Some(hour),
            minute: Some(minute),
            ..Self::on_day(year, month, day)
        }
    }

    /// Day schedule for a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;

        // month()/day() are at most 12/31, so the casts are lossless.
        Self::on_day(date.year(), date.month() as i32, date.day() as i32)
    }

    /// Number of valid leading fields, `0..=5`.
    pub fn depth(&self) -> u8 {
        self.fields()
            .iter()
            .take_while(|field| field.is_some())
            .count() as u8
    }

    fn fields(&self) -> [Option<i32>; 5] {
        [self.year, self.month, self.day, self.hour, self.minute]
    }

    /// Month, only when the schedule is valid down to the month.
    pub fn month_at_depth(&self) -> Option<i32> {
        self.year.and(self.month)
    }

    /// Day, only when the schedule is valid down to the day.
    pub fn day_at_depth(&self) -> Option<i32> {
        self.month_at_depth().and(self.day)
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let depth = self.depth();
        let field = |value: Option<i32>| value.unwrap_or_default();
        match depth {
            0 => write!(f, "unscheduled"),
            1 => write!(f, "{:04}", field(self.year)),
            2 => write!(f, "{:04}-{:02}", field(self.year), field(self.month)),
            3 => write!(
                f,
                "{:04}-{:02}-{:02}",
                field(self.year),
                field(self.month),
                field(self.day)
            ),
            4 => write!(
                f,
                "{:04}-{:02}-{:02} {:02}h",
                field(self.year),
                field(self.month),
                field(self.day),
                field(self.hour)
            ),
            _ => write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}",
                field(self.year),
                field(self.month),
                field(self.day),
                field(self.hour),
                field(self.minute)
            ),
        }
    }
}

/// Depth of an optional schedule; an absent schedule is unscheduled.
pub fn schedule_depth(schedule: Option<&Schedule>) -> u8 {
    schedule.map_or(0, Schedule::depth)
}

/// Resolves a schedule to the instant used for ordering.
///
/// Absent fields within the depth default to their calendar zero: January for
/// a year-only schedule, the 1st for a month schedule, `00:00` otherwise.
/// Out-of-range values roll over (month 13 is January of the next year).
pub fn date_from_schedule(schedule: Option<&Schedule>) -> DateTime<Utc> {
    let Some(schedule) = schedule else {
        return DateTime::<Utc>::UNIX_EPOCH;
    };
    let depth = schedule.depth();
    if depth == 0 {
        return DateTime::<Utc>::UNIX_EPOCH;
    }

    let within = |level: u8, value: Option<i32>, fallback: i64| {
        if depth >= level {
            value.map_or(fallback, i64::from)
        } else {
            fallback
        }
    };

    let year = within(1, schedule.year, 1970);
    let month_index = within(2, schedule.month, 1) - 1;
    let day = within(3, schedule.day, 1);
    let hour = within(4, schedule.hour, 0);
    let minute = within(5, schedule.minute, 0);

    calendar_instant(year, month_index, day, hour, minute)
}

/// Orders two schedules chronologically, then by depth.
///
/// This is a total preorder: distinct schedules resolving to the same instant
/// at the same depth compare equal.
pub fn compare_schedules(first: Option<&Schedule>, second: Option<&Schedule>) -> Ordering {
    date_from_schedule(first)
        .cmp(&date_from_schedule(second))
        .then_with(|| schedule_depth(first).cmp(&schedule_depth(second)))
}

fn calendar_instant(
    year: i64,
    month_index: i64,
    day: i64,
    hour: i64,
    minute: i64,
) -> DateTime<Utc> {
    let normalized_year = year + month_index.div_euclid(12);
    // rem_euclid(12) is within 0..12.
    let normalized_month = month_index.rem_euclid(12) as u32 + 1;

    let start = i32::try_from(normalized_year)
        .ok()
        .and_then(|year| NaiveDate::from_ymd_opt(year, normalized_month, 1))
        .and_then(|date| date.and_hms_opt(0, 0, 0));
    let offset = TimeDelta::try_days(day - 1)
        .zip(TimeDelta::try_hours(hour))
        .zip(TimeDelta::try_minutes(minute))
        .and_then(|((days, hours), minutes)| days.checked_add(&hours)?.checked_add(&minutes));

    match start
        .zip(offset)
        .and_then(|(start, offset)| start.checked_add_signed(offset))
    {
        Some(instant) => instant.and_utc(),
        None => saturated_instant(normalized_year, day),
    }
}

fn saturated_instant(year: i64, day: i64) -> DateTime<Utc> {
    let earlier = match year.cmp(&1970) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => day < 1,
    };
    if earlier {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let fields = self.fields();
        for (name, value) in FIELD_NAMES.iter().zip(fields) {
            if let Some(value) = value {
                map.serialize_entry(name, &value)?;
            }
        }
        for (key, value) in &self.extra {
            // A present calendar field shadows a stale raw value.
            let shadowed = FIELD_NAMES
                .iter()
                .zip(fields)
                .any(|(name, field)| *name == key.as_str() && field.is_some());
            if !shadowed {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::<String, Value>::deserialize(deserializer)?;
        let mut take = |name: &str| {
            let number = extra.get(name).and_then(integral_number)?;
            extra.remove(name);
            Some(number)
        };
        let year = take("year");
        let month = take("month");
        let day = take("day");
        let hour = take("hour");
        let minute = take("minute");
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            extra,
        })
    }
}

/// Non-numeric and non-integral values decode as absent fields.
fn integral_number(value: &Value) -> Option<i32> {
    if let Some(number) = value.as_i64() {
        return i32::try_from(number).ok();
    }
    let number = value.as_f64()?;
    if number.fract() == 0.0 && number >= f64::from(i32::MIN) && number <= f64::from(i32::MAX) {
        Some(number as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{calendar_instant, integral_number, Schedule};
    use chrono::{DateTime, Utc};
    use serde_json::json;

    #[test]
    fn integral_number_rejects_strings_and_fractions() {
        assert_eq!(integral_number(&json!(2024)), Some(2024));
        assert_eq!(integral_number(&json!(3.0)), Some(3));
        assert_eq!(integral_number(&json!(3.5)), None);
        assert_eq!(integral_number(&json!("2024")), None);
        assert_eq!(integral_number(&json!(null)), None);
    }

    #[test]
    fn non_numeric_fields_round_trip_and_yield_to_present_values() {
        let mut schedule: Schedule =
            serde_json::from_value(json!({ "year": "soon", "month": 3, "note": true })).unwrap();
        assert_eq!(schedule.depth(), 0);
        assert_eq!(schedule.month, Some(3));
        assert_eq!(
            serde_json::to_value(&schedule).unwrap(),
            json!({ "year": "soon", "month": 3, "note": true })
        );

        schedule.year = Some(2024);
        assert_eq!(
            serde_json::to_value(&schedule).unwrap(),
            json!({ "year": 2024, "month": 3, "note": true })
        );
    }

    #[test]
    fn calendar_instant_rolls_over_month_and_day() {
        let rolled = calendar_instant(2024, 12, 32, 0, 0);
        let expected: DateTime<Utc> = "2025-02-01T00:00:00Z".parse().unwrap();
        assert_eq!(rolled, expected);
    }

    #[test]
    fn calendar_instant_saturates_outside_supported_range() {
        assert_eq!(
            calendar_instant(i64::from(i32::MAX), 0, 1, 0, 0),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            calendar_instant(i64::from(i32::MIN), 0, 1, 0, 0),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[test]
    fn display_stops_at_depth() {
        let mut schedule = Schedule::in_year(2024);
        schedule.day = Some(5);
        assert_eq!(schedule.to_string(), "2024");
        assert_eq!(Schedule::at_time(2024, 3, 5, 9, 7).to_string(), "2024-03-05 09:07");
        assert_eq!(Schedule::default().to_string(), "unscheduled");
    }
}
