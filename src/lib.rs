//! # Tour Detector
//!
//! High-performance tour detection over per-user trip sequences.
//!
//! This library provides:
//! - Detection of tours (closed loops of consecutive trips) per user
//! - Gap tolerance for missing trips and first-class nested tours
//! - Temporal tracking quality scoring for coverage analysis
//! - Parallel processing for multi-user datasets
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel per-user processing with rayon (default)
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use tour_detector::{generate_tours, GpsPoint, TourConfig, Trip};
//!
//! let home = GpsPoint::new(47.3769, 8.5417);
//! let office = GpsPoint::new(47.3900, 8.5100);
//! let start = Utc.with_ymd_and_hms(2023, 5, 1, 8, 0, 0).unwrap();
//!
//! // Morning commute out, evening commute back
//! let trips = vec![
//!     Trip::new(0, 1, start, start + Duration::hours(1), home, office)
//!         .with_staypoints(Some(10), Some(11)),
//!     Trip::new(1, 1, start + Duration::hours(9), start + Duration::hours(10), office, home)
//!         .with_staypoints(Some(11), Some(10)),
//! ];
//!
//! let result = generate_tours(&trips, &TourConfig::default()).unwrap();
//! println!("Detected {} tours", result.tours.len());
//! assert_eq!(result.tours.len(), 1);
//! assert_eq!(result.tours[0].trip_ids, vec![0, 1]);
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// Error types shared across the crate
pub mod error;
pub use error::{Result, TourError};

// Geodesic distance primitives
pub mod geo_utils;

// Tour detection (window scan over per-user trip sequences)
pub mod tours;
pub use tours::progress::{
    AtomicProgressTracker, DetectionPhase, DetectionProgressCallback, NoopProgress,
};
pub use tours::{generate_tours, generate_tours_with_progress, TourConfig};

// Temporal tracking quality scoring
pub mod tracking_quality;
pub use tracking_quality::{temporal_tracking_quality, Granularity, TrackedSpan, TrackingQuality};

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use tour_detector::GpsPoint;
/// let point = GpsPoint::new(47.3769, 8.5417); // Zurich
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A single trip between two activity locations.
///
/// Trips are the unit of input: each records one user moving from an
/// origin to a destination over a time interval. Staypoint ids tie trip
/// endpoints to classified activity locations; `None` marks an unknown
/// activity at that end, which can never anchor a tour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier
    pub id: u64,
    /// Owner of the trip
    pub user_id: u64,
    /// Departure time
    pub started_at: DateTime<Utc>,
    /// Arrival time. Must be after `started_at`
    pub finished_at: DateTime<Utc>,
    /// Departure location
    pub origin: GpsPoint,
    /// Arrival location
    pub destination: GpsPoint,
    /// Staypoint the trip departs from, if classified
    pub origin_staypoint_id: Option<u64>,
    /// Staypoint the trip arrives at, if classified
    pub destination_staypoint_id: Option<u64>,
}

impl Trip {
    /// Create a trip with unclassified endpoints.
    pub fn new(
        id: u64,
        user_id: u64,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        origin: GpsPoint,
        destination: GpsPoint,
    ) -> Self {
        Self {
            id,
            user_id,
            started_at,
            finished_at,
            origin,
            destination,
            origin_staypoint_id: None,
            destination_staypoint_id: None,
        }
    }

    /// Attach staypoint classifications to the trip endpoints.
    pub fn with_staypoints(
        mut self,
        origin_staypoint_id: Option<u64>,
        destination_staypoint_id: Option<u64>,
    ) -> Self {
        self.origin_staypoint_id = origin_staypoint_id;
        self.destination_staypoint_id = destination_staypoint_id;
        self
    }

    /// Elapsed time between departure and arrival.
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }

    /// Check the trip satisfies the input schema.
    pub fn validate(&self) -> Result<()> {
        if self.finished_at <= self.started_at {
            return Err(TourError::InvalidTrip {
                trip_id: self.id,
                reason: format!(
                    "finished_at {} is not after started_at {}",
                    self.finished_at, self.started_at
                ),
            });
        }
        if !self.origin.is_valid() {
            return Err(TourError::InvalidTrip {
                trip_id: self.id,
                reason: format!(
                    "origin coordinates out of range: ({}, {})",
                    self.origin.latitude, self.origin.longitude
                ),
            });
        }
        if !self.destination.is_valid() {
            return Err(TourError::InvalidTrip {
                trip_id: self.id,
                reason: format!(
                    "destination coordinates out of range: ({}, {})",
                    self.destination.latitude, self.destination.longitude
                ),
            });
        }
        Ok(())
    }
}

/// A detected tour: a run of trips that leaves a location and returns to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    /// Sequential identifier, unique within one detection run
    pub id: u64,
    /// Owner of the member trips
    pub user_id: u64,
    /// Departure time of the opening trip
    pub started_at: DateTime<Utc>,
    /// Arrival time of the closing trip
    pub finished_at: DateTime<Utc>,
    /// Staypoint the tour departs from
    pub origin_staypoint_id: u64,
    /// Staypoint the tour returns to
    pub destination_staypoint_id: u64,
    /// Member trip ids in chronological order
    pub trip_ids: Vec<u64>,
}

impl Tour {
    /// Total time span of the tour.
    pub fn duration(&self) -> Duration {
        self.finished_at - self.started_at
    }
}

/// Output of a tour detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Every detected tour, ordered by id
    pub tours: Vec<Tour>,
    /// Trip id to tour ids join index; trips on no tour are absent
    pub trip_tours: HashMap<u64, Vec<u64>>,
}

// ============================================================================
// Tests
// ============================================================================
