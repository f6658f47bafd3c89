mod orchestrator;
mod relay;
mod runtime;
mod shutdown;
mod types;


pub use orchestrator::FatigueOrchestrator;
pub use relay::{RelayOutcome, StatusRelay};
pub use types::{FrameOutcome, RunStats, RunSummary, ShutdownReason};
