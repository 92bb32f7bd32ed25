//! Diagnostic events.
//!
//! Events are a one-way side channel: emitting never fails and never alters
//! the control-flow result of the callback that emitted it.

use std::sync::{Arc, Mutex};

/// `acknowledgement-error` {error, error-context*}
pub const EVENT_ACK_ERROR: &str = "acknowledgement-error";
/// `ack-revert-failure` {module, packet, ack}
pub const EVENT_ACK_REVERT_FAILURE: &str = "ack-revert-failure";
/// `timeout-revert-failure` {module, packet}
pub const EVENT_TIMEOUT_REVERT_FAILURE: &str = "timeout-revert-failure";
/// `params-updated` {}
pub const EVENT_PARAMS_UPDATED: &str = "params-updated";

pub const ATTR_ERROR: &str = "error";
pub const ATTR_ERROR_CONTEXT: &str = "error-context";

/// Typed key/value event. Attribute order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.push((key.to_string(), value.into()));
        self
    }

    /// All values for `key`, in emission order.
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn ack_revert_failure(module: &str, packet: &str, ack: &str) -> Self {
        Event::new(EVENT_ACK_REVERT_FAILURE)
            .attr("module", module)
            .attr("packet", packet)
            .attr("ack", ack)
    }

    pub fn timeout_revert_failure(module: &str, packet: &str) -> Self {
        Event::new(EVENT_TIMEOUT_REVERT_FAILURE)
            .attr("module", module)
            .attr("packet", packet)
    }

    pub fn params_updated() -> Self {
        Event::new(EVENT_PARAMS_UPDATED)
    }
}

/// Where events go. Implementations must not fail.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Records events in memory, for tests and the replay tool.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<Event>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Event> {
        // Poisoned lock means a panicking emitter; report what we have.
        match self.events.lock() {
            Ok(g) => g.clone(),
            Err(p) => p.into_inner().clone(),
        }
    }

    pub fn of_kind(&self, kind: &str) -> Vec<Event> {
        self.events().into_iter().filter(|e| e.kind == kind).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.events.lock() {
            g.clear();
        }
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: Event) {
        tracing::trace!(kind = %event.kind, "event recorded");
        if let Ok(mut g) = self.events.lock() {
            g.push(event);
        }
    }
}

/// Forwards events to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: Event) {
        let attrs = event
            .attributes
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(" ");
        tracing::info!(kind = %event.kind, %attrs, "event");
    }
}

/// Delivers every event to each inner sink, in order.
#[derive(Default, Clone)]
pub struct FanOutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanOutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanOutSink {
    fn emit(&self, event: Event) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}
