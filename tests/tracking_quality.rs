//! Tests for temporal tracking quality scoring

use chrono::{DateTime, Duration, TimeZone, Utc};
use tour_detector::{
    generate_tours, temporal_tracking_quality, GpsPoint, Granularity, TourConfig, TourError, Trip,
};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, day, hour, 0, 0).unwrap()
}

fn make_trip(id: u64, user_id: u64, start: DateTime<Utc>, hours: i64) -> Trip {
    Trip::new(
        id,
        user_id,
        start,
        start + Duration::hours(hours),
        GpsPoint::new(47.3769, 8.5417),
        GpsPoint::new(47.3900, 8.5100),
    )
}

fn quality_of(rows: &[tour_detector::TrackingQuality], user_id: u64, bin: u32) -> f64 {
    rows.iter()
        .find(|r| r.user_id == user_id && r.bin == bin)
        .map(|r| r.quality)
        .unwrap()
}

#[test]
fn test_overall_quality_per_user() {
    // User 1 tracks 6h of a 10h period, user 2 tracks without holes
    let trips = vec![
        make_trip(0, 1, at(1, 8), 4),
        make_trip(1, 1, at(1, 16), 2),
        make_trip(2, 2, at(1, 0), 8),
    ];

    let rows = temporal_tracking_quality(&trips, Granularity::All).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].user_id, rows[0].bin), (1, 0));
    assert_eq!((rows[1].user_id, rows[1].bin), (2, 0));
    assert!((quality_of(&rows, 1, 0) - 0.6).abs() < 1e-9);
    assert!((quality_of(&rows, 2, 0) - 1.0).abs() < 1e-9);
}

#[test]
fn test_day_grid_spans_all_users_and_days() {
    // User 1 appears on day 0, user 2 only on day 2; the output still
    // carries a row for every user on every day
    let trips = vec![
        make_trip(0, 1, at(1, 6), 6),
        make_trip(1, 2, at(3, 0), 12),
    ];

    let rows = temporal_tracking_quality(&trips, Granularity::Day).unwrap();

    assert_eq!(rows.len(), 6);
    let grid: Vec<(u64, u32)> = rows.iter().map(|r| (r.user_id, r.bin)).collect();
    assert_eq!(grid, vec![(1, 0), (1, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);

    assert!((quality_of(&rows, 1, 0) - 0.25).abs() < 1e-9);
    assert_eq!(quality_of(&rows, 1, 2), 0.0);
    assert_eq!(quality_of(&rows, 2, 0), 0.0);
    assert!((quality_of(&rows, 2, 2) - 0.5).abs() < 1e-9);
}

#[test]
fn test_week_bins_count_from_first_record() {
    // Dataset starts on a Wednesday; seven days later is week 1
    let trips = vec![
        make_trip(0, 1, at(3, 6), 6),
        make_trip(1, 1, at(10, 6), 6),
    ];

    let rows = temporal_tracking_quality(&trips, Granularity::Week).unwrap();

    assert_eq!(rows.len(), 2);
    let expected = 6.0 / (24.0 * 7.0);
    assert!((quality_of(&rows, 1, 0) - expected).abs() < 1e-9);
    assert!((quality_of(&rows, 1, 1) - expected).abs() < 1e-9);
}

#[test]
fn test_weekday_bins_run_monday_to_sunday() {
    // 2023-05-01 is a Monday and 2023-05-07 a Sunday
    let trips = vec![
        make_trip(0, 1, at(1, 6), 6),
        make_trip(1, 1, at(7, 6), 6),
    ];

    let rows = temporal_tracking_quality(&trips, Granularity::Weekday).unwrap();

    assert_eq!(rows.len(), 7);
    assert!((quality_of(&rows, 1, 0) - 0.25).abs() < 1e-9);
    assert_eq!(quality_of(&rows, 1, 3), 0.0);
    assert!((quality_of(&rows, 1, 6) - 0.25).abs() < 1e-9);
}

#[test]
fn test_hour_bins_split_midnight_crossing() {
    // 23:00 to 01:00 fills hour 23 of one day and hour 0 of the next
    let trips = vec![make_trip(0, 1, at(1, 23), 2)];

    let rows = temporal_tracking_quality(&trips, Granularity::Hour).unwrap();

    assert_eq!(rows.len(), 24);
    assert!((quality_of(&rows, 1, 0) - 1.0).abs() < 1e-9);
    assert!((quality_of(&rows, 1, 23) - 1.0).abs() < 1e-9);
    assert_eq!(quality_of(&rows, 1, 12), 0.0);
}

#[test]
fn test_detected_tours_are_scorable() {
    // Score coverage of the tours themselves rather than the raw trips
    let home = GpsPoint::new(47.3769, 8.5417);
    let office = GpsPoint::new(47.3900, 8.5100);
    let trips = vec![
        Trip::new(0, 1, at(1, 8), at(1, 9), home, office).with_staypoints(Some(10), Some(11)),
        Trip::new(1, 1, at(1, 17), at(1, 18), office, home).with_staypoints(Some(11), Some(10)),
    ];
    let tours = generate_tours(&trips, &TourConfig::default()).unwrap().tours;
    assert_eq!(tours.len(), 1);

    let rows = temporal_tracking_quality(&tours, Granularity::Day).unwrap();
    // The tour spans 08:00 to 18:00
    assert!((quality_of(&rows, 1, 0) - 10.0 / 24.0).abs() < 1e-9);

    let rows = temporal_tracking_quality(&tours, Granularity::All).unwrap();
    assert!((quality_of(&rows, 1, 0) - 1.0).abs() < 1e-9);
}

#[test]
fn test_records_without_positive_duration_are_ignored() {
    let good = make_trip(0, 1, at(1, 8), 6);
    let mut backwards = make_trip(1, 1, at(1, 20), 1);
    backwards.finished_at = backwards.started_at - Duration::hours(1);

    let rows = temporal_tracking_quality(&[good, backwards], Granularity::Day).unwrap();

    assert_eq!(rows.len(), 1);
    assert!((quality_of(&rows, 1, 0) - 0.25).abs() < 1e-9);
}

#[test]
fn test_empty_input_is_an_error() {
    let trips: Vec<Trip> = vec![];
    assert!(matches!(
        temporal_tracking_quality(&trips, Granularity::Week),
        Err(TourError::EmptyInput)
    ));
}
