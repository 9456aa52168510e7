//! Great-circle distance between two coordinates, used to rank geographically
//! scored proxy candidates.

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// Haversine distance in kilometers between two decimal-degree coordinates.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_identical_points() {
        let p = Coordinate { lat: 40.7128, lon: -74.0060 };
        assert!(haversine_km(p, p) < 1e-6);
    }

    #[test]
    fn known_city_pair_is_in_expected_range() {
        // New York <-> London, roughly 5570 km great-circle.
        let ny = Coordinate { lat: 40.7128, lon: -74.0060 };
        let london = Coordinate { lat: 51.5074, lon: -0.1278 };
        let d = haversine_km(ny, london);
        assert!((5400.0..5750.0).contains(&d), "unexpected distance: {d}");
    }
}
