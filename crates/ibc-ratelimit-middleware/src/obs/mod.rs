//! Observability: diagnostic events and in-process counters.

pub mod events;
pub mod metrics;

pub use events::{Event, EventLog, EventSink, FanOutSink, TracingEventSink};
pub use metrics::RateLimitMetrics;
