mod connection;
mod dispatcher;
mod event;
mod queue;
mod stats;
mod transport;
mod worker;
#[cfg(test)]
mod tests;

pub use connection::{ConnectionMonitor, ConnectionState, ProbeDecision};
pub use dispatcher::TelemetryDispatcher;
pub use event::{AlertEvent, DataEvent, TelemetryEvent};
pub use queue::BoundedQueue;
pub use stats::{DispatcherStats, DispatcherStatsSnapshot};
pub use transport::{HttpTransport, TelemetryTransport};
