pub mod attendance;

pub use attendance::{
    AttendanceOutcome, AttendanceService, AttendanceSettings, GeofenceCheck, ResolvedSchedule, Submission,
    Submitter,
};
