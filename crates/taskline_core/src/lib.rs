//! Core of the taskline activity tracker.
//!
//! Activities are filed in a schedule-indexed tree (year -> month -> day)
//! that is persisted as one JSON blob per storage slot. `ActivityRepository`
//! is the operation set command and render layers call.

pub mod db;
pub mod fault;
pub mod ids;
pub mod index;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use fault::FaultKind;
pub use index::codec::DecodeError;
pub use index::{IndexError, ListKey, ScheduleTree, TreePosition};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::activity::{Activity, ActivityDiff, ActivityDraft, ActivityId, DiffError};
pub use model::schedule::{compare_schedules, date_from_schedule, schedule_depth, Schedule};
pub use repo::activity_repo::{
    ActivityRepository, RepoError, RepoResult, DEFAULT_ACTIVITIES_SLOT,
    DEVELOPMENT_ACTIVITIES_SLOT,
};
pub use repo::scope::{ActivityFilter, ListScope, RangeFilter, ScopeError, SortOptions};
pub use service::activity_service::{ActivityService, ServiceError, ServiceResult};
pub use store::{
    ActivityStore, MemorySlotStore, SlotStore, SqliteSlotStore, StoreError, StoreResult,
};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
