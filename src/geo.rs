//! Pure coordinate geometry: great-circle distance and the rectangular
//! prefilter used by the nearest-room search.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;
const KM_PER_DEGREE: f64 = 111.0;

/// WGS84 decimal degrees. Range validation is the caller's job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Haversine great-circle distance in kilometers.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Rectangle approximating a circle of `radius_km` around `center`, using
/// 1° latitude ≈ 111 km and 1° longitude ≈ 111·cos(lat) km. Coarse on
/// purpose: callers must re-check exact distance on whatever the box keeps.
/// Degenerates near the poles where cos(lat) → 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(center: Coordinate, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lon_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos());

        Self {
            min_lat: center.latitude - lat_delta,
            max_lat: center.latitude + lat_delta,
            min_lon: center.longitude - lon_delta,
            max_lon: center.longitude + lon_delta,
        }
    }

    pub fn contains(&self, p: Coordinate) -> bool {
        p.latitude >= self.min_lat
            && p.latitude <= self.max_lat
            && p.longitude >= self.min_lon
            && p.longitude <= self.max_lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_of_identical_points_is_zero() {
        let p = Coordinate::new(37.5665, 126.9780);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Coordinate::new(37.5665, 126.9780);
        let b = Coordinate::new(35.1796, 129.0756);
        assert_eq!(distance_km(a, b), distance_km(b, a));
    }

    #[test]
    fn seoul_city_hall_to_euljiro() {
        let a = Coordinate::new(37.5665, 126.9780);
        let b = Coordinate::new(37.5651, 126.9895);
        let d = distance_km(a, b);
        assert!((d - 1.02).abs() < 0.05, "got {d} km");
    }

    #[test]
    fn bounding_box_contains_its_center() {
        let center = Coordinate::new(37.2636, 127.0286);
        let bb = BoundingBox::around(center, 15.0);
        assert!(bb.contains(center));
        assert!(bb.min_lat < center.latitude && center.latitude < bb.max_lat);
        assert!(bb.min_lon < center.longitude && center.longitude < bb.max_lon);
    }

    #[test]
    fn bounding_box_keeps_points_inside_the_radius() {
        let center = Coordinate::new(37.2636, 127.0286);
        let bb = BoundingBox::around(center, 15.0);
        // ~10 km north of center, well within a 15 km box
        let nearby = Coordinate::new(37.3536, 127.0286);
        assert!(bb.contains(nearby));
        assert!(distance_km(center, nearby) < 15.0);
    }
}
