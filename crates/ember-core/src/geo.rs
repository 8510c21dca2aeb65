use ember_types::models::GeoPoint;

use crate::error::{CoreError, CoreResult};

/// Upper bound applied to nearby searches. Larger requests are clamped.
pub const MAX_NEARBY_RADIUS_KM: f64 = 25.0;

/// Reject coordinates outside the WGS84 ranges. Nothing is clamped.
pub fn validate_point(longitude: f64, latitude: f64) -> CoreResult<GeoPoint> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(CoreError::InvalidGeoParameter(format!(
            "longitude {longitude} outside [-180, 180]"
        )));
    }
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(CoreError::InvalidGeoParameter(format!(
            "latitude {latitude} outside [-90, 90]"
        )));
    }
    Ok(GeoPoint { longitude, latitude })
}

/// Negative radius is a caller error; zero stays zero (no distance filter).
pub fn clamp_radius(radius_km: f64) -> CoreResult<f64> {
    if radius_km.is_nan() || radius_km < 0.0 {
        return Err(CoreError::InvalidGeoParameter(format!(
            "radius_km {radius_km} must be non-negative"
        )));
    }
    Ok(radius_km.min(MAX_NEARBY_RADIUS_KM))
}
