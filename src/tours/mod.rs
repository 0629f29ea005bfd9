//! # Tour Detection
//!
//! Detects closed loops of consecutive trips ("tours") in per-user trip
//! sequences. A tour starts and ends at approximately the same location,
//! tolerates a bounded number of missing trips, and is bounded in both
//! duration and trip count.
//!
//! ## Algorithm
//! 1. Partition trips by user and sort each sequence chronologically
//! 2. Slide a window of open start candidates over each user's sequence
//! 3. On every arriving trip, check spatial connectivity to the window
//!    tail; a break either resets the window or records a gap marker
//! 4. Scan candidates oldest-first for one whose origin the arriving
//!    trip's destination closes on, and emit the matched span as a tour
//! 5. Evict candidates older than `max_time` as a side effect of the scan
//!
//! Nested tours are first-class output: closing an inner loop does not
//! prevent the enclosing loop from closing later, though the enclosing
//! tour then carries only the trips the inner one did not consume.
//!
//! ## Complexity
//! Each candidate enters the window once and leaves it once, so the common
//! case is near-linear in the number of trips. Very large `max_time` or
//! `max_gap_size` values let windows grow, degrading toward a quadratic
//! backward scan on pathological inputs.

use std::collections::HashMap;

use chrono::Duration;
use log::{debug, info};

use crate::error::{Result, TourError};
use crate::geo_utils::geodesic_distance;
use crate::{DetectionResult, Tour, Trip};

pub mod progress;
mod window;

use progress::{DetectionPhase, DetectionProgressCallback, NoopProgress};
use window::{Candidate, CandidateWindow};

/// Configuration for tour detection
#[derive(Debug, Clone)]
pub struct TourConfig {
    /// Maximum distance between consecutive trip endpoints to count as
    /// connected, and between tour endpoints to count as closed (meters)
    pub max_dist: f64,
    /// Minimum number of trips per tour. Must be at least 2
    pub min_tour_length: usize,
    /// Maximum number of tolerated missing-connection trips per tour
    pub max_gap_size: usize,
    /// Maximum time span of a tour
    pub max_time: Duration,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            max_dist: 100.0,  // 100m - GPS variance around a staypoint
            min_tour_length: 2, // out and back
            max_gap_size: 0,  // no missing trips tolerated
            max_time: Duration::days(1),
        }
    }
}

impl TourConfig {
    /// Check the configuration before any per-user processing starts.
    pub fn validate(&self) -> Result<()> {
        if self.min_tour_length < 2 {
            return Err(TourError::MinTourLengthTooSmall {
                actual: self.min_tour_length,
            });
        }
        if !self.max_dist.is_finite() || self.max_dist <= 0.0 {
            return Err(TourError::InvalidMaxDist {
                value: self.max_dist,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Entry Points
// =============================================================================

/// Detect tours across a multi-user trip collection.
///
/// Trips are partitioned by user, sorted chronologically, and scanned
/// independently; per-user scans run in parallel when the `parallel`
/// feature is enabled. The result carries every detected tour (nested
/// tours included, never deduplicated) plus a trip-id to tour-ids join
/// index. Tour ids are assigned sequentially in user order, so the same
/// input and configuration always produce the same output.
///
/// # Errors
///
/// Fails fast on an invalid configuration or an invalid trip; no partial
/// results are returned. A [`TourError::InvariantViolation`] reports a
/// defect in the scan itself and aborts the offending user's processing.
///
/// # Example
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use tour_detector::{generate_tours, GpsPoint, TourConfig, Trip};
///
/// let home = GpsPoint::new(47.3769, 8.5417);
/// let office = GpsPoint::new(47.3900, 8.5100);
/// let start = Utc.with_ymd_and_hms(2023, 5, 1, 8, 0, 0).unwrap();
///
/// let trips = vec![
///     Trip::new(0, 1, start, start + Duration::hours(1), home, office)
///         .with_staypoints(Some(10), Some(11)),
///     Trip::new(1, 1, start + Duration::hours(8), start + Duration::hours(9), office, home)
///         .with_staypoints(Some(11), Some(10)),
/// ];
///
/// let result = generate_tours(&trips, &TourConfig::default()).unwrap();
/// assert_eq!(result.tours.len(), 1);
/// assert_eq!(result.tours[0].trip_ids, vec![0, 1]);
/// ```
pub fn generate_tours(trips: &[Trip], config: &TourConfig) -> Result<DetectionResult> {
    generate_tours_with_progress(trips, config, &NoopProgress)
}

/// Detect tours while reporting progress to `callback`.
///
/// Identical to [`generate_tours`] in every observable output; the
/// callback is purely informational and receives phase transitions,
/// per-user completion ticks, and each tour as it is assigned its id.
pub fn generate_tours_with_progress(
    trips: &[Trip],
    config: &TourConfig,
    callback: &dyn DetectionProgressCallback,
) -> Result<DetectionResult> {
    config.validate()?;

    let start = std::time::Instant::now();

    callback.on_phase(DetectionPhase::Validating, trips.len() as u32);
    for trip in trips {
        trip.validate()?;
        callback.on_progress();
    }

    callback.on_phase(DetectionPhase::Sorting, 0);
    let user_trips = partition_by_user(trips);
    info!(
        "[Tours] Scanning {} trips across {} users",
        trips.len(),
        user_trips.len()
    );

    callback.on_phase(DetectionPhase::Detecting, user_trips.len() as u32);
    let scan_start = std::time::Instant::now();

    #[cfg(feature = "parallel")]
    let per_user: Result<Vec<Vec<Tour>>> = {
        use rayon::prelude::*;
        user_trips
            .par_iter()
            .map(|(user_id, sequence)| {
                let tours = detect_user_tours(*user_id, sequence, config);
                callback.on_progress();
                tours
            })
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let per_user: Result<Vec<Vec<Tour>>> = user_trips
        .iter()
        .map(|(user_id, sequence)| {
            let tours = detect_user_tours(*user_id, sequence, config);
            callback.on_progress();
            tours
        })
        .collect();

    let per_user = per_user?;
    info!(
        "[Tours] Window scans finished in {}ms",
        scan_start.elapsed().as_millis()
    );

    // Merge per-user results in user order and assign sequential ids
    callback.on_phase(DetectionPhase::Merging, 0);
    let mut tours: Vec<Tour> = Vec::new();
    for user_tours in per_user {
        for mut tour in user_tours {
            tour.id = tours.len() as u64;
            callback.on_tour(&tour);
            tours.push(tour);
        }
    }
    let trip_tours = build_trip_index(&tours);

    info!(
        "[Tours] Detected {} tours in {:?}",
        tours.len(),
        start.elapsed()
    );

    Ok(DetectionResult { tours, trip_tours })
}

// =============================================================================
// Per-User Window Scan
// =============================================================================

/// Split the trip collection into per-user chronological sequences.
///
/// Users are ordered by id and each sequence is sorted by start time with
/// the trip id as tiebreaker, making downstream processing deterministic.
fn partition_by_user(trips: &[Trip]) -> Vec<(u64, Vec<&Trip>)> {
    let mut by_user: HashMap<u64, Vec<&Trip>> = HashMap::new();
    for trip in trips {
        by_user.entry(trip.user_id).or_default().push(trip);
    }

    let mut user_trips: Vec<(u64, Vec<&Trip>)> = by_user.into_iter().collect();
    user_trips.sort_unstable_by_key(|(user_id, _)| *user_id);
    for (_, sequence) in &mut user_trips {
        sequence.sort_by_key(|t| (t.started_at, t.id));
    }
    user_trips
}

/// Run the window scan over one user's chronological trip sequence.
///
/// Each arriving trip is checked for spatial connectivity against the
/// window tail, appended, then tested as the closing trip of a tour
/// against every open candidate, oldest first. The first candidate within
/// `max_dist` settles the step: its span is either emitted as a tour or
/// rejected outright, and inner candidates are not retried until the next
/// trip arrives.
fn detect_user_tours(user_id: u64, trips: &[&Trip], config: &TourConfig) -> Result<Vec<Tour>> {
    let mut tours = Vec::new();
    let mut window = CandidateWindow::new();

    for &trip in trips {
        // Does this trip start where the previous candidate ended?
        if let Some(last) = window.last_trip() {
            let jump = geodesic_distance(&last.destination, &trip.origin);
            if jump > config.max_dist {
                if config.max_gap_size == 0 {
                    window.reset_to(trip);
                    continue;
                }
                window.push_gap();
            }
        }
        window.push(trip);

        if window.trip_count() < config.min_tour_length {
            continue;
        }
        // A tour cannot close on an unclassified activity
        if trip.destination_staypoint_id.is_none() {
            continue;
        }

        // Candidates evicted for age are recorded here and dropped once,
        // after the scan; pruning mid-scan would shift indices under it.
        let mut new_front = 0;

        // The last min_tour_length - 1 positions can never head a
        // long-enough span, so the scan stops short of them.
        let scan_end = window.len() - (config.min_tour_length - 1);
        for j in 0..scan_end {
            let cand = match window.get(j) {
                Some(Candidate::Trip(t)) => t,
                _ => continue,
            };

            // A stale candidate can never close a tour again, and the
            // window is chronological, so everything before it is stale too
            if trip.finished_at - cand.started_at > config.max_time {
                new_front = j + 1;
                continue;
            }
            // An unknown activity cannot be a tour start
            if cand.origin_staypoint_id.is_none() {
                continue;
            }

            let closing = geodesic_distance(&trip.destination, &cand.origin);
            if closing < config.max_dist {
                let span = window.trips_from(j);
                let gaps = window.count_gaps(j, window.len());

                if gaps <= config.max_gap_size && span.len() >= config.min_tour_length {
                    tours.push(build_tour(user_id, &span, config)?);
                    // The span is consumed: a trip cannot close two tours
                    window.truncate_to(j);
                }
                // Whether the span qualified or not, this trip's closure
                // is spent; inner candidates are not retried.
                break;
            }
        }

        window.truncate_from(new_front);
    }

    debug!(
        "[Tours] user {}: {} trips -> {} tours",
        user_id,
        trips.len(),
        tours.len()
    );

    Ok(tours)
}

/// Validate a matched span and materialize the tour record.
///
/// The scan only hands over spans that already satisfy every tour
/// constraint, so any failure here is an algorithm defect and surfaces as
/// [`TourError::InvariantViolation`] carrying the offending trips.
fn build_tour(user_id: u64, span: &[&Trip], config: &TourConfig) -> Result<Tour> {
    let violation = |reason: &str| TourError::InvariantViolation {
        user_id,
        trip_ids: span.iter().map(|t| t.id).collect(),
        reason: reason.to_string(),
    };

    let (first, last) = match (span.first(), span.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(violation("span is empty")),
    };

    if span.len() < config.min_tour_length {
        return Err(violation("span is shorter than min_tour_length"));
    }
    if span.iter().any(|t| t.user_id != user_id) {
        return Err(violation("span mixes trips from different users"));
    }
    if last.finished_at - first.started_at > config.max_time {
        return Err(violation("span exceeds max_time"));
    }
    if geodesic_distance(&last.destination, &first.origin) >= config.max_dist {
        return Err(violation("span endpoints do not close within max_dist"));
    }
    let origin_staypoint_id = first
        .origin_staypoint_id
        .ok_or_else(|| violation("opening trip has no origin staypoint"))?;
    let destination_staypoint_id = last
        .destination_staypoint_id
        .ok_or_else(|| violation("closing trip has no destination staypoint"))?;

    Ok(Tour {
        id: 0, // assigned during the merge
        user_id,
        started_at: first.started_at,
        finished_at: last.finished_at,
        origin_staypoint_id,
        destination_staypoint_id,
        trip_ids: span.iter().map(|t| t.id).collect(),
    })
}

/// Invert tour membership into a trip-id to tour-ids join index.
///
/// Trips on no tour are absent from the index.
fn build_trip_index(tours: &[Tour]) -> HashMap<u64, Vec<u64>> {
    let mut index: HashMap<u64, Vec<u64>> = HashMap::new();
    for tour in tours {
        for trip_id in &tour.trip_ids {
            index.entry(*trip_id).or_default().push(tour.id);
        }
    }
    index
}

// =============================================================================
// Unit Tests
// =============================================================================
