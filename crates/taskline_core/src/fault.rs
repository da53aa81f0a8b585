//! Caller-facing classification of core failures.

use std::fmt::{Display, Formatter};

/// Abstract failure kind a UI layer can branch on without matching every
/// concrete error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// A parameter had the wrong shape.
    InvalidArgumentType,
    /// The storage slot parsed but does not hold a well-formed tree.
    CorruptPersistedData,
    /// The storage slot is not valid JSON.
    UnparsablePersistedData,
    /// No activity with the referenced id.
    NotFound,
    /// The tree contains a node of the wrong kind or lost track of an activity.
    StructuralInvariantViolation,
    /// The key-value backend itself failed.
    StorageBackend,
}

impl FaultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgumentType => "invalid_argument_type",
            Self::CorruptPersistedData => "corrupt_persisted_data",
            Self::UnparsablePersistedData => "unparsable_persisted_data",
            Self::NotFound => "not_found",
            Self::StructuralInvariantViolation => "structural_invariant_violation",
            Self::StorageBackend => "storage_backend",
        }
    }
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
