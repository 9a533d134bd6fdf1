pub mod justification;
pub mod scan;
pub mod scheduler;
pub mod stats;
pub mod sweeper;

pub use justification::JustificationWorkflow;
pub use scan::ScanProcessor;
pub use scheduler::SweepScheduler;
pub use stats::StatsAggregator;
pub use sweeper::{AbsenteeSweeper, SweepReport};
