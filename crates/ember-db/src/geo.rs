use anyhow::Result;
use ember_types::models::GeoPoint;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

/// IUGG mean Earth radius.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Name of the SQL function registered on every connection:
/// `geo_distance_km(lon1, lat1, lon2, lat2) -> REAL`.
pub const DISTANCE_FN: &str = "geo_distance_km";

/// Great-circle distance between two points (haversine).
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

pub fn register(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        DISTANCE_FN,
        4,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let a = GeoPoint {
                longitude: ctx.get::<f64>(0)?,
                latitude: ctx.get::<f64>(1)?,
            };
            let b = GeoPoint {
                longitude: ctx.get::<f64>(2)?,
                latitude: ctx.get::<f64>(3)?,
            };
            Ok(distance_km(a, b))
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(longitude: f64, latitude: f64) -> GeoPoint {
        GeoPoint { longitude, latitude }
    }

    #[test]
    fn same_point_is_zero() {
        let vancouver = pt(-123.12, 49.28);
        assert!(distance_km(vancouver, vancouver).abs() < 1e-9);
    }

    #[test]
    fn vancouver_to_seattle() {
        let d = distance_km(pt(-123.1207, 49.2827), pt(-122.3321, 47.6062));
        assert!((d - 195.0).abs() < 2.0, "got {d}");
    }

    #[test]
    fn crossing_the_antimeridian_takes_the_short_way() {
        // 0.2 degrees of longitude at the equator, not 359.8.
        let d = distance_km(pt(179.9, 0.0), pt(-179.9, 0.0));
        assert!((d - 22.24).abs() < 0.1, "got {d}");
    }

    #[test]
    fn longitude_collapses_at_the_pole() {
        let d = distance_km(pt(0.0, 90.0), pt(120.0, 90.0));
        assert!(d < 1e-6, "got {d}");

        // Near the pole a large longitude gap is still a short hop.
        let d = distance_km(pt(0.0, 89.99), pt(180.0, 89.99));
        assert!((d - 2.224).abs() < 0.01, "got {d}");
    }

    #[test]
    fn antipodes_do_not_produce_nan() {
        let d = distance_km(pt(0.0, 0.0), pt(180.0, 0.0));
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn sql_function_matches_rust() {
        let conn = Connection::open_in_memory().unwrap();
        register(&conn).unwrap();
        let d: f64 = conn
            .query_row(
                "SELECT geo_distance_km(-123.12, 49.28, -122.3321, 47.6062)",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!((d - distance_km(pt(-123.12, 49.28), pt(-122.3321, 47.6062))).abs() < 1e-9);
    }
}
