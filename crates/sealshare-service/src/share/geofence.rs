//! Location restriction checks.

use sealshare_entity::share::{CallerLocation, GeoPoint, Geofence};

/// Mean Earth radius used for great-circle distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Allow/deny answer from a gate, with a caller-presentable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateVerdict {
    /// Whether the gate lets the caller through.
    pub allowed: bool,
    /// Human-readable explanation.
    pub reason: String,
}

impl GateVerdict {
    pub(crate) fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    pub(crate) fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Evaluates a [`Geofence`] against where the caller claims to be.
///
/// Checks run country, then city, then radius. Each is skipped when either
/// the restriction or the matching caller data is missing, so an absent
/// caller location never denies on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeofenceEvaluator;

impl GeofenceEvaluator {
    /// Creates an evaluator.
    pub fn new() -> Self {
        Self
    }

    /// Returns the first failing check's verdict, or an allow.
    pub fn evaluate(&self, fence: &Geofence, caller: &CallerLocation) -> GateVerdict {
        if !fence.is_restricted() {
            return GateVerdict::allow("no restriction");
        }

        if let Some(country) = caller.country.as_deref() {
            if !fence.allowed_countries.is_empty()
                && !fence
                    .allowed_countries
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(country))
            {
                return GateVerdict::deny(format!("Access not allowed from {country}"));
            }
        }

        if let Some(city) = caller.city.as_deref() {
            if !fence.allowed_cities.is_empty()
                && !fence.allowed_cities.iter().any(|allowed| allowed == city)
            {
                return GateVerdict::deny(format!("Access not allowed from {city}"));
            }
        }

        if let (Some(center), Some(radius_km), Some(point)) =
            (fence.center(), fence.radius_km, caller.point())
        {
            let distance = haversine_km(center, point);
            if distance > radius_km {
                return GateVerdict::deny(format!(
                    "Access not allowed from this location ({distance:.1}km away)"
                ));
            }
        }

        GateVerdict::allow("Location allowed")
    }
}

/// Great-circle distance between two points on a spherical Earth.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PARIS: GeoPoint = GeoPoint::new(48.8566, 2.3522);
    const LONDON: GeoPoint = GeoPoint::new(51.5074, -0.1278);

    fn caller_at(point: GeoPoint) -> CallerLocation {
        CallerLocation {
            latitude: Some(point.latitude),
            longitude: Some(point.longitude),
            ..Default::default()
        }
    }

    #[test]
    fn test_unrestricted() {
        let verdict = GeofenceEvaluator.evaluate(&Geofence::default(), &CallerLocation::default());
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, "no restriction");
    }

    #[test]
    fn test_country_allow_list() {
        let fence = Geofence {
            allowed_countries: vec!["US".into()],
            ..Default::default()
        };
        let fr = CallerLocation {
            country: Some("FR".into()),
            ..Default::default()
        };
        let verdict = GeofenceEvaluator.evaluate(&fence, &fr);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "Access not allowed from FR");

        let us_lower = CallerLocation {
            country: Some("us".into()),
            ..Default::default()
        };
        assert!(GeofenceEvaluator.evaluate(&fence, &us_lower).allowed);

        assert!(
            GeofenceEvaluator
                .evaluate(&fence, &CallerLocation::default())
                .allowed
        );
    }

    #[test]
    fn test_city_match_is_exact() {
        let fence = Geofence {
            allowed_cities: vec!["Paris".into()],
            ..Default::default()
        };
        let lower = CallerLocation {
            city: Some("paris".into()),
            ..Default::default()
        };
        let verdict = GeofenceEvaluator.evaluate(&fence, &lower);
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, "Access not allowed from paris");
    }

    #[test]
    fn test_country_checked_before_city() {
        let fence = Geofence {
            allowed_countries: vec!["US".into()],
            allowed_cities: vec!["Boston".into()],
            ..Default::default()
        };
        let caller = CallerLocation {
            country: Some("FR".into()),
            city: Some("Paris".into()),
            ..Default::default()
        };
        assert_eq!(
            GeofenceEvaluator.evaluate(&fence, &caller).reason,
            "Access not allowed from FR"
        );
    }

    #[test]
    fn test_radius() {
        let fence = Geofence {
            center_lat: Some(PARIS.latitude),
            center_lng: Some(PARIS.longitude),
            radius_km: Some(100.0),
            ..Default::default()
        };
        assert!(GeofenceEvaluator.evaluate(&fence, &caller_at(PARIS)).allowed);

        let verdict = GeofenceEvaluator.evaluate(&fence, &caller_at(LONDON));
        assert!(!verdict.allowed);
        assert!(
            verdict.reason.starts_with("Access not allowed from this location (34"),
            "{}",
            verdict.reason
        );
        assert!(verdict.reason.ends_with("km away)"));

        // No coordinates: radius check is skipped.
        assert!(
            GeofenceEvaluator
                .evaluate(&fence, &CallerLocation::default())
                .allowed
        );
    }

    #[test]
    fn test_radius_without_center_is_skipped() {
        let fence = Geofence {
            radius_km: Some(1.0),
            ..Default::default()
        };
        let verdict = GeofenceEvaluator.evaluate(&fence, &caller_at(LONDON));
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, "Location allowed");
    }

    #[test]
    fn test_known_distance() {
        let d = haversine_km(PARIS, LONDON);
        assert!((d - 343.5).abs() < 1.0, "{d}");
        assert_eq!(haversine_km(PARIS, PARIS), 0.0);
    }

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| GeoPoint::new(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_haversine_symmetric(a in point(), b in point()) {
            let ab = haversine_km(a, b);
            let ba = haversine_km(b, a);
            prop_assert!((ab - ba).abs() < 1e-6);
            prop_assert!(ab >= 0.0);
            prop_assert!(ab <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
