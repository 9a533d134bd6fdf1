pub mod attendance;
pub mod person;
pub mod role;
pub mod stats;
