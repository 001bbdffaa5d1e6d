use crate::model::geo::Coordinate;

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in meters (haversine).
pub fn distance(user_lat: f64, user_lng: f64, ref_lat: f64, ref_lng: f64) -> f64 {
    let phi1 = user_lat.to_radians();
    let phi2 = ref_lat.to_radians();
    let d_phi = (ref_lat - user_lat).to_radians();
    let d_lambda = (ref_lng - user_lng).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Inside the geofence when at most `limit_m` away.
pub fn within_limit(distance_m: f64, limit_m: f64) -> bool {
    distance_m <= limit_m
}
