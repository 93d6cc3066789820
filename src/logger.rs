use crate::event::InputEvent;
use crate::sink::EventSink;
use std::sync::Arc;
use tracing::{debug, Level};

/// Traces every canonical event that passes through it.
///
/// Useful while wiring up bindings; put it in a [`fan_out`](crate::sink::fan_out) next to
/// the real consumers.
///
/// Events are logged at `DEBUG` under the `input` target.
#[derive(Debug, Clone, Default)]
pub struct EventLogger {
    include_raw: bool,
}

impl EventLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log the device payload behind each event.
    pub fn with_raw(mut self, on: bool) -> Self {
        self.include_raw = on;
        self
    }

    pub fn log(&self, event: &InputEvent) {
        if !tracing::enabled!(target: "input", Level::DEBUG) {
            return;
        }
        if self.include_raw {
            debug!(
                target: "input",
                device = %event.device_type,
                action = %event.action_id,
                phase = ?event.phase,
                value = ?event.value,
                raw = ?event.raw,
                "input event"
            );
        } else {
            debug!(
                target: "input",
                device = %event.device_type,
                action = %event.action_id,
                phase = ?event.phase,
                value = ?event.value,
                "input event"
            );
        }
    }

    pub fn sink(self) -> EventSink {
        Arc::new(move |event: &InputEvent| self.log(event))
    }
}
