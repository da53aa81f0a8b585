//! Activity domain model.
//!
//! # Responsibility
//! - Define activity records and the partial schedules they are filed under.
//! - Own the chronological ordering used by listing and range filters.
//!
//! # Invariants
//! - Every activity carries an `ActivityId` unique among the loaded activities.
//! - Schedule validity is decided by depth, never by field presence alone.

pub mod activity;
pub mod schedule;
