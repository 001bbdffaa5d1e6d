pub mod reminder;
pub mod scheduler;

pub use reminder::{LogNotifier, Notifier, Reminder, ReminderPlanner};
pub use scheduler::{Job, JobHandle, JobScheduler, TokioJobScheduler};
