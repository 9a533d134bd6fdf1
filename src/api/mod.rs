pub mod attendance;
pub mod stats;
