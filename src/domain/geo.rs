//! Great-circle distance between GPS coordinates

/// Mean Earth radius in meters (IUGG)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Haversine distance in meters between two points
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance_for_same_point() {
        let p = GeoPoint {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_hundred_meters_north() {
        // 0.0009 degrees of latitude is about 100m
        let a = GeoPoint {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        let b = GeoPoint {
            latitude: 40.7137,
            longitude: -74.0060,
        };
        let d = distance_meters(a, b);
        assert!((d - 100.0).abs() < 10.0, "expected ~100m, got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let a = GeoPoint {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        let b = GeoPoint {
            latitude: 40.7580,
            longitude: -73.9855,
        };
        let ab = distance_meters(a, b);
        let ba = distance_meters(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_known_city_pair() {
        // NYC -> Philadelphia, roughly 130km
        let nyc = GeoPoint {
            latitude: 40.7128,
            longitude: -74.0060,
        };
        let philly = GeoPoint {
            latitude: 39.9526,
            longitude: -75.1652,
        };
        let d = distance_meters(nyc, philly);
        assert!((120_000.0..140_000.0).contains(&d), "got {}", d);
    }
}
