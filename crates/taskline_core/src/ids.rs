//! Activity identifier allocation.
//!
//! # Responsibility
//! - Hand out identifiers that collide with no identifier currently in use.
//! - Track identifiers loaded from storage and release deleted ones.
//!
//! # Invariants
//! - Generated identifiers are random v4 UUIDs (122 random bits); generation
//!   retries until the candidate is not tracked.
//! - The tracked set mirrors the identifiers present in the schedule index.

use crate::model::activity::ActivityId;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct IdAllocator {
    in_use: HashSet<ActivityId>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates, tracks and returns a fresh identifier.
    pub fn allocate(&mut self) -> ActivityId {
        loop {
            let candidate = Uuid::new_v4().to_string();
            if !self.in_use.contains(&candidate) {
                self.in_use.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Tracks an identifier that already exists in storage.
    ///
    /// Returns `false` when the identifier was already tracked.
    pub fn track_existing(&mut self, id: &str) -> bool {
        self.in_use.insert(id.to_string())
    }

    /// Stops tracking `id`. Returns `false` when it was not tracked.
    pub fn release(&mut self, id: &str) -> bool {
        self.in_use.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.in_use.contains(id)
    }

    pub fn len(&self) -> usize {
        self.in_use.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_use.is_empty()
    }

    pub fn clear(&mut self) {
        self.in_use.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::IdAllocator;
    use uuid::Uuid;

    #[test]
    fn allocate_tracks_unique_uuid_strings() {
        let mut ids = IdAllocator::new();
        let first = ids.allocate();
        let second = ids.allocate();

        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
        assert!(ids.contains(&first));
        assert!(ids.contains(&second));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn track_existing_reports_duplicates() {
        let mut ids = IdAllocator::new();
        assert!(ids.track_existing("legacy-id"));
        assert!(!ids.track_existing("legacy-id"));
    }

    #[test]
    fn release_forgets_identifier() {
        let mut ids = IdAllocator::new();
        let id = ids.allocate();

        assert!(ids.release(&id));
        assert!(!ids.contains(&id));
        assert!(!ids.release(&id));
        assert!(ids.is_empty());
    }
}
