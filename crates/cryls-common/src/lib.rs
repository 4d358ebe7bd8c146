//! Common types and utilities for the cryls language server core.
//!
//! This crate provides foundational types used across all cryls crates:
//! - Position/Range/Location types for source locations
//! - Virtual-file URI helpers for macro expansions
//! - Centralized limits and thresholds

// Position/Range types for line/column source locations
pub mod position;
pub use position::{Location, Position, Range};

// Virtual-file URI scheme for macro expansions
pub mod uri;

// Centralized limits and thresholds
pub mod limits;
