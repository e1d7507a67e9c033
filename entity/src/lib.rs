pub mod activity_logs;
pub mod opportunities;
pub mod users;
