//! Error types for tour detection.
//!
//! Configuration and schema errors abort a run before any detection work
//! starts. [`TourError::InvariantViolation`] is different: it reports a bug
//! in the detection algorithm itself and carries enough context (user id,
//! trip ids) to reproduce the failing window.

use thiserror::Error;

/// Errors produced by tour detection and tracking-quality analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TourError {
    /// A tour needs at least an outbound and a return trip.
    #[error("min_tour_length must be at least 2, got {actual}")]
    MinTourLengthTooSmall { actual: usize },

    /// Closure threshold must be a positive, finite number of meters.
    #[error("max_dist must be positive and finite, got {value}")]
    InvalidMaxDist { value: f64 },

    /// An input trip failed schema validation.
    #[error("trip {trip_id} is invalid: {reason}")]
    InvalidTrip { trip_id: u64, reason: String },

    /// No records with positive duration were supplied.
    #[error("input contains no records with positive duration")]
    EmptyInput,

    /// A matched span failed a check the matcher should have guaranteed.
    /// This is an algorithm defect, never a data problem.
    #[error("tour invariant violated for user {user_id} (trips {trip_ids:?}): {reason}")]
    InvariantViolation {
        user_id: u64,
        trip_ids: Vec<u64>,
        reason: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TourError>;
