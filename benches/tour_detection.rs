//! Benchmarks for tour detection over synthetic commute data.
//!
//! Run with: `cargo bench --bench tour_detection`

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tour_detector::{
    generate_tours, temporal_tracking_quality, GpsPoint, Granularity, TourConfig, Trip,
};

/// Synthesize daily out-and-back commutes with occasional one-way side
/// trips that break connectivity, mimicking a tracked user's trip table.
fn synth_trips(users: u64, days: u64) -> Vec<Trip> {
    let mut rng = StdRng::seed_from_u64(42);
    let base = Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap();
    let mut trips = Vec::with_capacity((users * days * 2) as usize);
    let mut next_id = 0u64;

    for user in 0..users {
        // Per-user home and office, spread out so users never collide
        let home_lat = 47.0 + user as f64 * 0.1;
        let home = GpsPoint::new(home_lat, 8.50);
        let office = GpsPoint::new(home_lat + 0.05, 8.55);
        let home_sp = user * 2;
        let office_sp = user * 2 + 1;

        for day in 0..days {
            let day_start = base + Duration::days(day as i64);
            // GPS scatter of ~20m around each endpoint
            let mut near = |p: GpsPoint| {
                GpsPoint::new(
                    p.latitude + rng.gen_range(-0.0002..0.0002),
                    p.longitude + rng.gen_range(-0.0002..0.0002),
                )
            };

            trips.push(
                Trip::new(
                    next_id,
                    user,
                    day_start + Duration::hours(8),
                    day_start + Duration::minutes(8 * 60 + 30),
                    near(home),
                    near(office),
                )
                .with_staypoints(Some(home_sp), Some(office_sp)),
            );
            next_id += 1;

            trips.push(
                Trip::new(
                    next_id,
                    user,
                    day_start + Duration::hours(17),
                    day_start + Duration::minutes(17 * 60 + 30),
                    near(office),
                    near(home),
                )
                .with_staypoints(Some(office_sp), Some(home_sp)),
            );
            next_id += 1;

            // Every fifth evening ends with an untracked stay elsewhere
            if day % 5 == 4 {
                trips.push(
                    Trip::new(
                        next_id,
                        user,
                        day_start + Duration::hours(20),
                        day_start + Duration::hours(21),
                        near(home),
                        GpsPoint::new(home_lat + 0.5, 9.9),
                    )
                    .with_staypoints(Some(home_sp), None),
                );
                next_id += 1;
            }
        }
    }

    trips
}

fn bench_single_user(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_user");

    for days in [30, 180, 365] {
        let trips = synth_trips(1, days);
        group.bench_with_input(
            BenchmarkId::new("generate_tours", format!("{days}d")),
            &trips,
            |b, trips| {
                b.iter(|| generate_tours(trips, &TourConfig::default()).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_user_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("user_scaling");

    for users in [10, 100, 500] {
        let trips = synth_trips(users, 30);
        group.bench_with_input(
            BenchmarkId::new("generate_tours", format!("{users}users")),
            &trips,
            |b, trips| {
                b.iter(|| generate_tours(trips, &TourConfig::default()).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_gap_tolerant_detection(c: &mut Criterion) {
    let trips = synth_trips(50, 90);
    let config = TourConfig {
        max_gap_size: 2,
        ..TourConfig::default()
    };

    let mut group = c.benchmark_group("gap_tolerant");
    group.bench_with_input(
        BenchmarkId::new("generate_tours", "50users_90d"),
        &trips,
        |b, trips| {
            b.iter(|| generate_tours(trips, &config).unwrap());
        },
    );
    group.finish();
}

fn bench_tracking_quality(c: &mut Criterion) {
    let trips = synth_trips(50, 90);
    let mut group = c.benchmark_group("tracking_quality");

    for (name, granularity) in [
        ("all", Granularity::All),
        ("day", Granularity::Day),
        ("hour", Granularity::Hour),
    ] {
        group.bench_with_input(
            BenchmarkId::new("temporal_tracking_quality", name),
            &trips,
            |b, trips| {
                b.iter(|| temporal_tracking_quality(trips, granularity).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_user,
    bench_user_scaling,
    bench_gap_tolerant_detection,
    bench_tracking_quality
);
criterion_main!(benches);
