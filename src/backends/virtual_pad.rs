use super::{GamepadSource, PadSample};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Highest button or axis count a virtual pad grows to.
pub const MAX_CONTROLS: usize = 64;

/// In-process gamepad bank: connect pads, set their buttons and axes, and let the
/// gamepad adapter sample them. Cloning shares the bank.
#[derive(Clone, Default)]
pub struct VirtualGamepads {
    pads: Arc<Mutex<BTreeMap<usize, PadSample>>>,
}

impl VirtualGamepads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugs a pad into `slot` with the given button and axis counts, all at rest.
    pub fn connect(&self, slot: usize, buttons: usize, axes: usize) {
        self.pads
            .lock()
            .insert(slot, PadSample::new(slot, buttons, axes));
    }

    pub fn disconnect(&self, slot: usize) {
        self.pads.lock().remove(&slot);
    }

    pub fn press_button(&self, slot: usize, button: usize) {
        self.set_button(slot, button, true);
    }

    pub fn release_button(&self, slot: usize, button: usize) {
        self.set_button(slot, button, false);
    }

    /// Sets an axis value. Ignored for unknown slots and for indices at or past
    /// [`MAX_CONTROLS`]; grows the axis list if needed.
    pub fn set_axis(&self, slot: usize, axis: usize, value: f32) {
        if axis >= MAX_CONTROLS {
            return;
        }
        if let Some(pad) = self.pads.lock().get_mut(&slot) {
            if pad.axes.len() <= axis {
                pad.axes.resize(axis + 1, 0.0);
            }
            pad.axes[axis] = value;
        }
    }

    fn set_button(&self, slot: usize, button: usize, pressed: bool) {
        if button >= MAX_CONTROLS {
            return;
        }
        if let Some(pad) = self.pads.lock().get_mut(&slot) {
            if pad.buttons.len() <= button {
                pad.buttons.resize(button + 1, false);
            }
            pad.buttons[button] = pressed;
        }
    }

    pub fn connected(&self) -> Vec<usize> {
        self.pads.lock().keys().copied().collect()
    }
}

impl GamepadSource for VirtualGamepads {
    fn samples(&self) -> Vec<PadSample> {
        self.pads.lock().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_reflect_changes() {
        let pads = VirtualGamepads::new();
        pads.connect(1, 4, 2);
        pads.press_button(1, 2);
        pads.set_axis(1, 0, -0.5);
        pads.press_button(7, 0);

        let samples = pads.samples();
        assert_eq!(samples.len(), 1);
        assert!(samples[0].button(2));
        assert_eq!(samples[0].axis(0), -0.5);
        assert_eq!(samples[0].axis(9), 0.0);

        pads.disconnect(1);
        assert!(pads.samples().is_empty());
    }

    #[test]
    fn out_of_range_controls_are_ignored() {
        let pads = VirtualGamepads::new();
        pads.connect(0, 2, 2);
        pads.set_axis(0, usize::MAX, 1.0);
        pads.press_button(0, usize::MAX);
        pads.press_button(0, MAX_CONTROLS);

        let sample = &pads.samples()[0];
        assert_eq!(sample.axes.len(), 2);
        assert_eq!(sample.buttons.len(), 2);

        pads.press_button(0, MAX_CONTROLS - 1);
        assert!(pads.samples()[0].button(MAX_CONTROLS - 1));
    }
}
