//! Location updates and proximity filtering of swipe candidates.
//!
//! Candidates are ordered by distance only; ranking is out of scope.

use tracing::debug;

use cupid_shared::constants::EARTH_RADIUS_KM;
use cupid_shared::models::NearbyUser;
use cupid_shared::{CoreError, CoreResult, UserId};

use crate::gateway::Gateway;

pub struct Discovery<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> Discovery<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    pub fn update_location(&self, user: UserId, latitude: f64, longitude: f64) -> CoreResult<()> {
        validate_coordinates(latitude, longitude)?;
        let updated = self
            .gateway
            .update_location(user, latitude, longitude)
            .map_err(CoreError::internal)?;
        if !updated {
            return Err(CoreError::NotFound(format!("user {user}")));
        }
        debug!(user = %user, "Location updated");
        Ok(())
    }

    /// Users within `max_km` of `(latitude, longitude)`, closest first.
    pub fn nearby_users(
        &self,
        viewer: UserId,
        latitude: f64,
        longitude: f64,
        max_km: f64,
    ) -> CoreResult<Vec<NearbyUser>> {
        validate_coordinates(latitude, longitude)?;
        if !max_km.is_finite() || max_km <= 0.0 {
            return Err(CoreError::InvalidInput(
                "maxDistanceKm must be a positive number".into(),
            ));
        }

        let candidates = self
            .gateway
            .list_discoverable_users(viewer)
            .map_err(CoreError::internal)?;

        let mut nearby: Vec<NearbyUser> = candidates
            .into_iter()
            .filter(|u| u.id != viewer)
            .filter_map(|u| {
                let (lat, lon) = u.coordinates()?;
                let distance_km = haversine_km(latitude, longitude, lat, lon);
                (distance_km <= max_km).then(|| NearbyUser {
                    user: u.summary(),
                    distance_km,
                })
            })
            .collect();

        nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        Ok(nearby)
    }
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> CoreResult<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(CoreError::InvalidInput(format!(
            "latitude out of range: {latitude}"
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(CoreError::InvalidInput(format!(
            "longitude out of range: {longitude}"
        )));
    }
    Ok(())
}

/// Great-circle distance in kilometres.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_zero_for_same_point() {
        assert!(haversine_km(48.85, 2.35, 48.85, 2.35).abs() < 1e-9);
    }

    #[test]
    fn haversine_paris_london() {
        // ~344 km
        let d = haversine_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 343.5).abs() < 2.0, "got {d}");
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
    }
}
