//! Location restriction data attached to a share.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `-90.0..=90.0`.
    pub latitude: f64,
    /// Longitude in degrees, `-180.0..=180.0`.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Composite location restriction.
///
/// Every part is optional. Empty allow-lists count as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Geofence {
    /// Allowed ISO country codes, compared case-insensitively.
    #[serde(default)]
    pub allowed_countries: Vec<String>,
    /// Allowed city names, compared exactly.
    #[serde(default)]
    pub allowed_cities: Vec<String>,
    /// Latitude of the radius center.
    pub center_lat: Option<f64>,
    /// Longitude of the radius center.
    pub center_lng: Option<f64>,
    /// Maximum great-circle distance from the center, in kilometers.
    pub radius_km: Option<f64>,
}

impl Geofence {
    /// The radius center, when both coordinates are set.
    pub fn center(&self) -> Option<GeoPoint> {
        match (self.center_lat, self.center_lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }

    /// Whether any restriction is configured at all.
    pub fn is_restricted(&self) -> bool {
        !self.allowed_countries.is_empty()
            || !self.allowed_cities.is_empty()
            || self.center_lat.is_some()
            || self.center_lng.is_some()
            || self.radius_km.is_some()
    }
}

/// Where the caller claims to be. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallerLocation {
    /// Country code.
    pub country: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
}

impl CallerLocation {
    /// The caller coordinates, when both are present.
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unrestricted() {
        assert!(!Geofence::default().is_restricted());
    }

    #[test]
    fn test_any_single_field_restricts() {
        let only_radius = Geofence {
            radius_km: Some(5.0),
            ..Default::default()
        };
        assert!(only_radius.is_restricted());
        assert!(only_radius.center().is_none());

        let only_country = Geofence {
            allowed_countries: vec!["US".into()],
            ..Default::default()
        };
        assert!(only_country.is_restricted());
    }

    #[test]
    fn test_zero_coordinates_are_a_real_center() {
        let fence = Geofence {
            center_lat: Some(0.0),
            center_lng: Some(0.0),
            radius_km: Some(1.0),
            ..Default::default()
        };
        assert_eq!(fence.center(), Some(GeoPoint::new(0.0, 0.0)));
    }

    #[test]
    fn test_point_validation() {
        assert!(GeoPoint::new(51.5, -0.12).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
