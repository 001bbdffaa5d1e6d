//! Pure attendance rules: no I/O, no clocks.

pub mod decision;
pub mod distance;
pub mod note;

pub use decision::{Decision, classify, minutes_of_day};
pub use distance::{distance, within_limit};
pub use note::{checkout_note, format_note};
