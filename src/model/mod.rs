pub mod attendance;
pub mod geo;
pub mod role;
pub mod schedule;
pub mod user;
