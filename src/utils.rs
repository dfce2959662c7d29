use std::f64::consts::PI;

pub const EARTH_RADIUS: f64 = 6371000.0; // unit: meter

// Size of the Web-Mercator world in map units. This is the same grid as 256px
// slippy map tiles at zoom 20.
pub const MAP_UNITS_PER_WORLD: f64 = 268435456.0;

// Web-Mercator is undefined at the poles.
const MAX_MERCATOR_LAT: f64 = 85.051128779806;

// https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames
pub fn lng_lat_to_map_point(lng: f64, lat: f64) -> (f64, f64) {
    let n = MAP_UNITS_PER_WORLD;
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let lat_rad = (lat / 180.0) * PI;
    let x = ((lng + 180.0) / 360.0) * n;
    let y = (1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI)) / 2.0 * n;
    (x, y)
}

/// Great-circle distance in meters between two WGS-84 coordinates.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS * c
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use crate::utils::{haversine_distance, lng_lat_to_map_point, MAP_UNITS_PER_WORLD};

    #[test]
    fn map_point_of_origin() {
        let (x, y) = lng_lat_to_map_point(0.0, 0.0);
        assert_float_absolute_eq!(x, 134217728.0, 1e-6);
        assert_float_absolute_eq!(y, 134217728.0, 1e-6);
    }

    #[test]
    fn map_point_x_spans_the_world() {
        let (west, _) = lng_lat_to_map_point(-180.0, 0.0);
        let (east, _) = lng_lat_to_map_point(180.0, 0.0);
        assert_float_absolute_eq!(west, 0.0, 1e-6);
        assert_float_absolute_eq!(east, MAP_UNITS_PER_WORLD, 1e-6);
        // y grows towards the south
        let (_, north) = lng_lat_to_map_point(0.0, 45.0);
        let (_, south) = lng_lat_to_map_point(0.0, -45.0);
        assert!(north < south);
    }

    #[test]
    fn poles_stay_finite() {
        let (_, north) = lng_lat_to_map_point(0.0, 90.0);
        let (_, south) = lng_lat_to_map_point(0.0, -90.0);
        assert!(north.is_finite() && north <= 1.0);
        assert!(south.is_finite());
    }

    #[test]
    fn haversine() {
        assert_eq!(haversine_distance(30.0, 120.0, 30.0, 120.0), 0.0);
        // 0.0001 degree of longitude on the equator
        assert_float_absolute_eq!(haversine_distance(0.0, 0.0, 0.0, 0.0001), 11.119, 1e-3);
        // Hangzhou -> Shanghai, roughly
        let d = haversine_distance(30.2741, 120.1551, 31.2304, 121.4737);
        assert!((160_000.0..170_000.0).contains(&d), "{d}");
    }
}
