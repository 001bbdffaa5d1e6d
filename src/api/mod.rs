pub mod attendance;
pub mod geofence;
pub mod location;
pub mod schedule;
pub mod settings;
