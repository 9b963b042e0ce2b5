//! Domain model for journal records.
//!
//! # Responsibility
//! - Define the canonical entry/tag/location structures used by core
//!   business logic.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - A `Location` always carries latitude, longitude and elevation; a
//!   partially known position is represented as no location at all.

pub mod journal;
