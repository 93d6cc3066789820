//! Event sinks: where adapters send canonical events.
//!
//! A sink is a shared callback. Wiring the pipeline is a matter of composing them:
//!
//! ```
//! use stickup_actions::{sink, Router, SnapshotStore};
//!
//! let router = Router::new();
//! let snapshot = SnapshotStore::new();
//! let out = sink::fan_out(vec![router.sink(), snapshot.sink()]);
//! # let _ = out;
//! ```
use crate::event::{DeviceType, InputEvent, Phase};
use std::sync::Arc;

/// Shared event callback.
pub type EventSink = Arc<dyn Fn(&InputEvent) + Send + Sync>;

/// Wraps a closure as a sink.
pub fn from_fn(f: impl Fn(&InputEvent) + Send + Sync + 'static) -> EventSink {
    Arc::new(f)
}

/// A sink that ignores everything.
pub fn discard() -> EventSink {
    Arc::new(|_: &InputEvent| {})
}

/// Delivers each event to every sink, in order.
pub fn fan_out(sinks: Vec<EventSink>) -> EventSink {
    Arc::new(move |event: &InputEvent| {
        for sink in &sinks {
            sink(event);
        }
    })
}

/// Determines which events a filtered sink passes through.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    AxisOnly,
    /// `Pressed`, `Released` and `Repeat`.
    ButtonsOnly,
    Device(DeviceType),
    Custom(fn(&InputEvent) -> bool),
}

impl EventFilter {
    pub fn matches(&self, event: &InputEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::AxisOnly => event.phase == Phase::Axis,
            EventFilter::ButtonsOnly => matches!(
                event.phase,
                Phase::Pressed | Phase::Released | Phase::Repeat
            ),
            EventFilter::Device(device) => event.device_type == *device,
            EventFilter::Custom(f) => f(event),
        }
    }
}

/// Forwards only events accepted by `filter`.
pub fn filtered(filter: EventFilter, inner: EventSink) -> EventSink {
    Arc::new(move |event: &InputEvent| {
        if filter.matches(event) {
            inner(event);
        }
    })
}

/// Forwards only events accepted by an arbitrary predicate.
pub fn filtered_by(
    predicate: impl Fn(&InputEvent) -> bool + Send + Sync + 'static,
    inner: EventSink,
) -> EventSink {
    Arc::new(move |event: &InputEvent| {
        if predicate(event) {
            inner(event);
        }
    })
}
