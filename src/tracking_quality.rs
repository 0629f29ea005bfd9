//! # Tracking Quality
//!
//! Scores how completely a user's movement is covered by tracked records.
//! The quality of a time bin is the tracked fraction of its extent: a user
//! whose trips cover 6 hours of a day scores 0.25 for that day.
//!
//! Records crossing a bin boundary are split at the boundary so every
//! piece counts toward the bin it lies in. Bins with no tracked time are
//! reported with quality 0 rather than omitted; the output covers every
//! user crossed with every bin up to the latest one seen in the dataset.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TourError};
use crate::{Tour, Trip};

const SECS_PER_HOUR: i64 = 60 * 60;
const SECS_PER_DAY: i64 = 60 * 60 * 24;
const SECS_PER_WEEK: i64 = SECS_PER_DAY * 7;

/// Time bucketing for quality scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    /// One score per user over their whole tracking period
    All,
    /// Calendar days, numbered from the dataset's first record
    Day,
    /// Seven-day weeks, numbered from the dataset's first record
    Week,
    /// Day of the week, Monday = 0
    Weekday,
    /// Hour of the day, 0-23
    Hour,
}

/// Coverage score for one user in one time bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingQuality {
    pub user_id: u64,
    /// Bin index within the granularity; always 0 for [`Granularity::All`]
    pub bin: u32,
    /// Tracked fraction of the bin extent, 0.0 to 1.0 for gap-free input
    pub quality: f64,
}

/// Any record with an owner and a tracked time interval.
///
/// Implemented for [`Trip`] and [`Tour`], so quality can be scored on raw
/// input as well as on detection output.
pub trait TrackedSpan {
    fn user_id(&self) -> u64;
    fn started_at(&self) -> DateTime<Utc>;
    fn finished_at(&self) -> DateTime<Utc>;
}

impl TrackedSpan for Trip {
    fn user_id(&self) -> u64 {
        self.user_id
    }
    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
    fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

impl TrackedSpan for Tour {
    fn user_id(&self) -> u64 {
        self.user_id
    }
    fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
    fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// Calculate per-user temporal tracking quality.
///
/// Records without positive duration are dropped with a warning. The
/// output is sorted by user id, then bin.
///
/// # Errors
///
/// Returns [`TourError::EmptyInput`] when no record with positive
/// duration remains.
///
/// # Example
///
/// ```rust
/// use chrono::{Duration, TimeZone, Utc};
/// use tour_detector::{temporal_tracking_quality, GpsPoint, Granularity, Trip};
///
/// let start = Utc.with_ymd_and_hms(2023, 5, 1, 6, 0, 0).unwrap();
/// let here = GpsPoint::new(47.3769, 8.5417);
/// let there = GpsPoint::new(47.3900, 8.5100);
///
/// // One six-hour trip covers a quarter of its day
/// let trips = vec![Trip::new(0, 1, start, start + Duration::hours(6), here, there)];
/// let quality = temporal_tracking_quality(&trips, Granularity::Day).unwrap();
///
/// assert_eq!(quality.len(), 1);
/// assert!((quality[0].quality - 0.25).abs() < 1e-9);
/// ```
pub fn temporal_tracking_quality<S: TrackedSpan>(
    records: &[S],
    granularity: Granularity,
) -> Result<Vec<TrackingQuality>> {
    let start = std::time::Instant::now();
    let spans = positive_spans(records)?;

    let quality = match granularity {
        Granularity::All => whole_period_quality(&spans),
        Granularity::Day => day_quality(spans),
        Granularity::Week => week_quality(spans),
        Granularity::Weekday => weekday_quality(spans),
        Granularity::Hour => hour_quality(spans),
    };

    info!(
        "[Quality] Scored {} records into {} rows ({:?} granularity) in {:?}",
        records.len(),
        quality.len(),
        granularity,
        start.elapsed()
    );

    Ok(quality)
}

// =============================================================================
// Per-Granularity Scoring
// =============================================================================

/// A record reduced to the fields quality scoring needs.
#[derive(Debug, Clone)]
struct QualitySpan {
    user_id: u64,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl QualitySpan {
    fn duration_secs(&self) -> f64 {
        seconds_between(self.started_at, self.finished_at)
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}

/// Keep records with positive duration, warning about the rest.
fn positive_spans<S: TrackedSpan>(records: &[S]) -> Result<Vec<QualitySpan>> {
    let mut spans = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        if record.finished_at() > record.started_at() {
            spans.push(QualitySpan {
                user_id: record.user_id(),
                started_at: record.started_at(),
                finished_at: record.finished_at(),
            });
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!(
            "[Quality] Dropped {} records without positive duration",
            dropped
        );
    }
    if spans.is_empty() {
        return Err(TourError::EmptyInput);
    }
    Ok(spans)
}

/// One score per user: tracked time over the user's own tracking period.
fn whole_period_quality(spans: &[QualitySpan]) -> Vec<TrackingQuality> {
    struct UserAgg {
        tracked: f64,
        earliest: DateTime<Utc>,
        latest: DateTime<Utc>,
    }

    let mut users: BTreeMap<u64, UserAgg> = BTreeMap::new();
    for span in spans {
        let agg = users.entry(span.user_id).or_insert(UserAgg {
            tracked: 0.0,
            earliest: span.started_at,
            latest: span.finished_at,
        });
        agg.tracked += span.duration_secs();
        agg.earliest = agg.earliest.min(span.started_at);
        agg.latest = agg.latest.max(span.finished_at);
    }

    users
        .into_iter()
        .map(|(user_id, agg)| TrackingQuality {
            user_id,
            bin: 0,
            quality: agg.tracked / seconds_between(agg.earliest, agg.latest),
        })
        .collect()
}

fn day_quality(spans: Vec<QualitySpan>) -> Vec<TrackingQuality> {
    let spans = split_at_boundaries(spans, SECS_PER_DAY);
    let day_zero = dataset_day_zero(&spans);

    let mut users = BTreeSet::new();
    let mut max_bin = 0;
    let mut tracked: BTreeMap<(u64, u32), f64> = BTreeMap::new();
    for span in &spans {
        let bin = day_index(span.started_at, day_zero);
        users.insert(span.user_id);
        max_bin = max_bin.max(bin);
        *tracked.entry((span.user_id, bin)).or_insert(0.0) += span.duration_secs();
    }

    let present = tracked
        .into_iter()
        .map(|(key, secs)| (key, secs / SECS_PER_DAY as f64))
        .collect();
    zero_filled(&users, max_bin, &present)
}

fn week_quality(spans: Vec<QualitySpan>) -> Vec<TrackingQuality> {
    let spans = split_at_boundaries(spans, SECS_PER_DAY);
    let day_zero = dataset_day_zero(&spans);

    let mut users = BTreeSet::new();
    let mut max_bin = 0;
    let mut tracked: BTreeMap<(u64, u32), f64> = BTreeMap::new();
    for span in &spans {
        let bin = day_index(span.started_at, day_zero) / 7;
        users.insert(span.user_id);
        max_bin = max_bin.max(bin);
        *tracked.entry((span.user_id, bin)).or_insert(0.0) += span.duration_secs();
    }

    let present = tracked
        .into_iter()
        .map(|(key, secs)| (key, secs / SECS_PER_WEEK as f64))
        .collect();
    zero_filled(&users, max_bin, &present)
}

/// Weekday bins pool the same weekday across weeks, so the extent is one
/// day times the number of weeks the bin's records span.
fn weekday_quality(spans: Vec<QualitySpan>) -> Vec<TrackingQuality> {
    struct BinAgg {
        tracked: f64,
        min_week: u32,
        max_week: u32,
    }

    let spans = split_at_boundaries(spans, SECS_PER_DAY);
    let day_zero = dataset_day_zero(&spans);

    let mut users = BTreeSet::new();
    let mut max_bin = 0;
    let mut bins: BTreeMap<(u64, u32), BinAgg> = BTreeMap::new();
    for span in &spans {
        let weekday = span.started_at.weekday().num_days_from_monday();
        let week = day_index(span.started_at, day_zero) / 7;
        users.insert(span.user_id);
        max_bin = max_bin.max(weekday);

        let agg = bins.entry((span.user_id, weekday)).or_insert(BinAgg {
            tracked: 0.0,
            min_week: week,
            max_week: week,
        });
        agg.tracked += span.duration_secs();
        agg.min_week = agg.min_week.min(week);
        agg.max_week = agg.max_week.max(week);
    }

    let present = bins
        .into_iter()
        .map(|(key, agg)| {
            let weeks_spanned = f64::from(agg.max_week - agg.min_week + 1);
            (key, agg.tracked / (SECS_PER_DAY as f64 * weeks_spanned))
        })
        .collect();
    zero_filled(&users, max_bin, &present)
}

/// Hour bins pool the same hour across days, so the extent is one hour
/// times the number of days the bin's records span.
fn hour_quality(spans: Vec<QualitySpan>) -> Vec<TrackingQuality> {
    struct BinAgg {
        tracked: f64,
        min_day: u32,
        max_day: u32,
    }

    let spans = split_at_boundaries(spans, SECS_PER_HOUR);
    let day_zero = dataset_day_zero(&spans);

    let mut users = BTreeSet::new();
    let mut max_bin = 0;
    let mut bins: BTreeMap<(u64, u32), BinAgg> = BTreeMap::new();
    for span in &spans {
        let hour = span.started_at.hour();
        let day = day_index(span.started_at, day_zero);
        users.insert(span.user_id);
        max_bin = max_bin.max(hour);

        let agg = bins.entry((span.user_id, hour)).or_insert(BinAgg {
            tracked: 0.0,
            min_day: day,
            max_day: day,
        });
        agg.tracked += span.duration_secs();
        agg.min_day = agg.min_day.min(day);
        agg.max_day = agg.max_day.max(day);
    }

    let present = bins
        .into_iter()
        .map(|(key, agg)| {
            let days_spanned = f64::from(agg.max_day - agg.min_day + 1);
            (key, agg.tracked / (SECS_PER_HOUR as f64 * days_spanned))
        })
        .collect();
    zero_filled(&users, max_bin, &present)
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Largest boundary-aligned instant not after `t`, for a boundary grid of
/// `step_secs` seconds anchored at the Unix epoch.
fn floor_to(t: DateTime<Utc>, step_secs: i64) -> DateTime<Utc> {
    t - Duration::seconds(t.timestamp().rem_euclid(step_secs))
        - Duration::nanoseconds(i64::from(t.timestamp_subsec_nanos()))
}

/// Split spans so none crosses a boundary of the `step_secs` grid.
///
/// A span ending exactly on a boundary stays whole; each cut produces a
/// piece that ends on the boundary and a successor that starts on it.
fn split_at_boundaries(spans: Vec<QualitySpan>, step_secs: i64) -> Vec<QualitySpan> {
    let step = Duration::seconds(step_secs);
    let mut out = Vec::with_capacity(spans.len());

    for span in spans {
        let mut cursor = span.started_at;
        loop {
            let boundary = floor_to(cursor, step_secs) + step;
            if span.finished_at > boundary {
                out.push(QualitySpan {
                    user_id: span.user_id,
                    started_at: cursor,
                    finished_at: boundary,
                });
                cursor = boundary;
            } else {
                out.push(QualitySpan {
                    user_id: span.user_id,
                    started_at: cursor,
                    finished_at: span.finished_at,
                });
                break;
            }
        }
    }

    out
}

/// Midnight of the earliest record in the dataset. Day and week indexes
/// count from here.
fn dataset_day_zero(spans: &[QualitySpan]) -> DateTime<Utc> {
    let earliest = spans
        .iter()
        .map(|s| s.started_at)
        .min()
        .unwrap_or_default();
    floor_to(earliest, SECS_PER_DAY)
}

fn day_index(start: DateTime<Utc>, day_zero: DateTime<Utc>) -> u32 {
    (floor_to(start, SECS_PER_DAY) - day_zero).num_days() as u32
}

/// Expand present bins to the full user x bin grid, scoring absent
/// combinations as 0.
fn zero_filled(
    users: &BTreeSet<u64>,
    max_bin: u32,
    present: &BTreeMap<(u64, u32), f64>,
) -> Vec<TrackingQuality> {
    let mut rows = Vec::with_capacity(users.len() * (max_bin as usize + 1));
    for &user_id in users {
        for bin in 0..=max_bin {
            rows.push(TrackingQuality {
                user_id,
                bin,
                quality: present.get(&(user_id, bin)).copied().unwrap_or(0.0),
            });
        }
    }
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================
