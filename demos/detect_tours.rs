//! Basic example of detecting tours from a trip table.
//!
//! Run with: cargo run --example detect_tours

use chrono::{DateTime, TimeZone, Utc};
use tour_detector::{
    generate_tours, temporal_tracking_quality, GpsPoint, Granularity, TourConfig, Trip,
};

fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 5, day, hour, min, 0).unwrap()
}

fn main() {
    // Activity locations (Zurich area)
    let home = GpsPoint::new(47.3769, 8.5417);
    let office = GpsPoint::new(47.3900, 8.5100);
    let gym = GpsPoint::new(47.3820, 8.5300);
    let home2 = GpsPoint::new(47.4100, 8.5500);
    let cabin = GpsPoint::new(46.8000, 9.8000);
    let village = GpsPoint::new(46.8500, 9.9000);

    let trips = vec![
        // User 1 commutes, with a lunchtime gym loop nested inside the day
        Trip::new(0, 1, at(1, 8, 0), at(1, 8, 30), home, office)
            .with_staypoints(Some(10), Some(11)),
        Trip::new(1, 1, at(1, 12, 0), at(1, 12, 15), office, gym)
            .with_staypoints(Some(11), Some(12)),
        Trip::new(2, 1, at(1, 13, 30), at(1, 13, 45), gym, office)
            .with_staypoints(Some(12), Some(11)),
        Trip::new(3, 1, at(1, 17, 30), at(1, 18, 0), office, home)
            .with_staypoints(Some(11), Some(10)),
        // User 2 visits a cabin; the leg from the cabin to the village
        // was not tracked
        Trip::new(4, 2, at(1, 9, 0), at(1, 11, 0), home2, cabin)
            .with_staypoints(Some(20), Some(21)),
        Trip::new(5, 2, at(1, 16, 0), at(1, 17, 30), village, home2)
            .with_staypoints(Some(22), Some(20)),
    ];

    let config = TourConfig::default();

    println!("Tour Detection Example\n");
    println!(
        "Config: max_dist={}m, min_tour_length={}, max_gap_size={}, max_time={}h\n",
        config.max_dist,
        config.min_tour_length,
        config.max_gap_size,
        config.max_time.num_hours()
    );

    // Detect with the default configuration
    println!("1. Default configuration:");
    let result = generate_tours(&trips, &config).unwrap();
    for tour in &result.tours {
        println!(
            "   Tour {}: user {} | {} - {} | trips {:?} | staypoint {} -> {}",
            tour.id,
            tour.user_id,
            tour.started_at.format("%H:%M"),
            tour.finished_at.format("%H:%M"),
            tour.trip_ids,
            tour.origin_staypoint_id,
            tour.destination_staypoint_id
        );
    }
    println!("   ({} tours; user 2's loop has a hole in it)\n", result.tours.len());

    // Allow one missing trip per tour
    println!("2. With max_gap_size = 1:");
    let relaxed = TourConfig {
        max_gap_size: 1,
        ..TourConfig::default()
    };
    let result = generate_tours(&trips, &relaxed).unwrap();
    for tour in &result.tours {
        println!(
            "   Tour {}: user {} | {} - {} | trips {:?}",
            tour.id,
            tour.user_id,
            tour.started_at.format("%H:%M"),
            tour.finished_at.format("%H:%M"),
            tour.trip_ids
        );
    }
    println!("   ({} tours; the gap is bridged)\n", result.tours.len());

    // Which trips ended up on which tours
    println!("3. Trip to tour membership:");
    let mut memberships: Vec<_> = result.trip_tours.iter().collect();
    memberships.sort();
    for (trip_id, tour_ids) in memberships {
        println!("   trip {} -> tours {:?}", trip_id, tour_ids);
    }
    println!();

    // How well the day is covered by tracked trips
    println!("4. Tracking quality (per day):");
    let quality = temporal_tracking_quality(&trips, Granularity::Day).unwrap();
    for row in &quality {
        println!(
            "   user {} day {}: {:.1}% tracked",
            row.user_id,
            row.bin,
            row.quality * 100.0
        );
    }
    println!();

    // The result serializes directly, e.g. for handing to a frontend
    println!("Detection result as JSON:");
    println!("{}", serde_json::to_string_pretty(&result.tours).unwrap());
}
