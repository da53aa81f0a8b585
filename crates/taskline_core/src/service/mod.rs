//! Core use-case services.
//!
//! # Responsibility
//! - Turn command-level intents into repository calls.
//! - Keep UI layers decoupled from schedule index details.

pub mod activity_service;
