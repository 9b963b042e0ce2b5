//! Presentation-facing coordination services.
//!
//! # Responsibility
//! - Hold the paginated, filterable view state over the repository.
//! - Keep UI layers decoupled from storage details.

pub mod journal_view;
