//! Repository layer: the operation set collaborators call.
//!
//! # Responsibility
//! - Orchestrate id allocation, schedule index and slot persistence.
//! - Decode untyped command-layer payloads into typed diffs and scopes.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidArgument`)
//!   in addition to storage errors.

pub mod activity_repo;
pub mod scope;
