//! # Geographic Utilities
//!
//! Distance computation for trip endpoints.
//!
//! Tour closure decisions compare distances against thresholds of a few
//! tens of meters, so the metric matters: this module uses the geodesic
//! distance on the WGS84 ellipsoid (Karney's algorithm) rather than a
//! spherical approximation. Spherical formulas can be off by up to 0.5%,
//! which is enough to flip a closure decision near the threshold.
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees),
//! the standard used by GPS receivers and mapping services.
//!
//! ## Example
//!
//! ```rust
//! use tour_detector::{GpsPoint, geo_utils};
//!
//! let home = GpsPoint::new(51.5074, -0.1278);
//! let office = GpsPoint::new(51.5080, -0.1290);
//!
//! let dist = geo_utils::geodesic_distance(&home, &office);
//! println!("Home to office: {:.0}m", dist);
//! ```

use crate::GpsPoint;
use geo::{Distance, Geodesic, Point};

/// Calculate the geodesic distance between two GPS points in meters.
///
/// Uses Karney's algorithm on the WGS84 ellipsoid, accurate to well below
/// a millimeter. Handles coincident points (returns 0.0) and antipodal
/// points (returns a finite distance) without panicking.
///
/// # Example
///
/// ```rust
/// use tour_detector::{GpsPoint, geo_utils};
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
///
/// let distance = geo_utils::geodesic_distance(&london, &paris);
/// assert!((distance - 344_000.0).abs() < 5_000.0); // ~344 km
/// ```
#[inline]
pub fn geodesic_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Geodesic::distance(point1, point2)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_geodesic_distance_same_point() {
        let p = GpsPoint::new(51.5074, -0.1278);
        assert_eq!(geodesic_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_geodesic_distance_known_value() {
        // London to Paris is approximately 344 km
        let london = GpsPoint::new(51.5074, -0.1278);
        let paris = GpsPoint::new(48.8566, 2.3522);
        let dist = geodesic_distance(&london, &paris);
        assert!(dist > 340_000.0 && dist < 350_000.0);
    }

    #[test]
    fn test_geodesic_distance_one_degree_longitude_at_equator() {
        // On WGS84 the equator spans 111,319.49m per degree
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 1.0);
        let dist = geodesic_distance(&a, &b);
        assert!(approx_eq(dist, 111_319.49, 1.0));
    }

    #[test]
    fn test_geodesic_distance_antipodal_is_finite() {
        let a = GpsPoint::new(0.0, 0.0);
        let b = GpsPoint::new(0.0, 180.0);
        let dist = geodesic_distance(&a, &b);
        assert!(dist.is_finite());
        // Half the circumference, a hair over 20,000 km
        assert!(dist > 19_900_000.0 && dist < 20_100_000.0);
    }

    #[test]
    fn test_geodesic_distance_symmetric() {
        let a = GpsPoint::new(47.3769, 8.5417); // Zurich
        let b = GpsPoint::new(46.9480, 7.4474); // Bern
        assert!(approx_eq(
            geodesic_distance(&a, &b),
            geodesic_distance(&b, &a),
            1e-6,
        ));
    }

    #[test]
    fn test_geodesic_distance_short_hop() {
        // ~50m apart, the scale closure thresholds operate at
        let a = GpsPoint::new(47.3769, 8.5417);
        let b = GpsPoint::new(47.37735, 8.5417);
        let dist = geodesic_distance(&a, &b);
        assert!(dist > 40.0 && dist < 60.0);
    }
}
