//! Capture-based rebinding.
//!
//! The [`Rebinder`] sits in front of the rest of the pipeline. Every event passed to
//! [`Rebinder::handle_event`] is forwarded to the wrapped sink first; rebinding only
//! observes the stream, it never filters it.
//!
//! # States
//! - **Idle**: nothing pending.
//! - **Capturing**: one [`Capture`] is pending, optionally with an armed timeout.
//!
//! [`capture_next`](Rebinder::capture_next) moves to Capturing, rejecting any capture that
//! was already pending with [`RebindError::Superseded`]. While capturing, an event is
//! accepted when it passes the optional device filter *and* its raw payload can be turned
//! into a binding change on the matching [`RebindTarget`]. Accepted: back to Idle and the
//! capture resolves with the event. Not applicable: stay Capturing. Timeout or
//! [`cancel`](Rebinder::cancel): back to Idle with [`RebindError::TimedOut`] /
//! [`RebindError::Cancelled`].
//!
//! Each capture settles exactly once. A timed capture records its deadline. With a tokio
//! runtime a timer task settles it on time; every access to the rebinder or the
//! [`Capture`] also expires an overdue capture, so timeouts hold without a runtime too.
//!
//! # Example
//! ```no_run
//! use std::time::{Duration, Instant};
//! use stickup_actions::{DeviceType, Rebinder};
//!
//! # async fn demo(rebinder: Rebinder) {
//! match rebinder
//!     .capture_next("jump", Some(DeviceType::Gamepad), Some(Duration::from_secs(5)))
//!     .await
//! {
//!     Ok(event) => println!("jump is now bound to {:?}", event.raw),
//!     Err(e) => println!("rebind failed: {e}"),
//! }
//! # }
//! ```
use crate::binding::{
    BindingCell, GamepadBindings, KeyboardBindings, MouseBindings, TouchBindings,
};
use crate::error::RebindError;
use crate::event::{DeviceType, InputEvent, MouseRaw, PadControl, RawInput};
use crate::sink::EventSink;
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A binding table the rebinder may rewrite, tagged by device.
#[derive(Clone, Debug)]
pub enum RebindTarget {
    Keyboard(BindingCell<KeyboardBindings>),
    Mouse(BindingCell<MouseBindings>),
    Gamepad(BindingCell<GamepadBindings>),
    Touch(BindingCell<TouchBindings>),
}

impl RebindTarget {
    pub fn device_type(&self) -> DeviceType {
        match self {
            RebindTarget::Keyboard(_) => DeviceType::Keyboard,
            RebindTarget::Mouse(_) => DeviceType::Mouse,
            RebindTarget::Gamepad(_) => DeviceType::Gamepad,
            RebindTarget::Touch(_) => DeviceType::Touch,
        }
    }

    /// Maps the control described by `raw` to `action_id`.
    ///
    /// Returns `false` when `raw` belongs to another device or names no concrete control.
    fn apply(&self, raw: &RawInput, action_id: &str) -> bool {
        match (self, raw) {
            (RebindTarget::Keyboard(cell), RawInput::Keyboard { code, key }) => {
                let control = if !code.is_empty() {
                    code
                } else if !key.is_empty() {
                    key
                } else {
                    return false;
                };
                cell.update(|table| table.clone().with(control.as_str(), action_id));
                true
            }
            (RebindTarget::Mouse(cell), RawInput::Mouse(control)) => {
                cell.update(|table| {
                    let mut next = table.clone();
                    match control {
                        MouseRaw::Button { button } => {
                            next.buttons.insert(*button, action_id.to_owned());
                        }
                        MouseRaw::Wheel { .. } => next.wheel = Some(action_id.to_owned()),
                        MouseRaw::Move { .. } => next.movement = Some(action_id.to_owned()),
                    }
                    next
                });
                true
            }
            (RebindTarget::Gamepad(cell), RawInput::Gamepad { kind, index, .. }) => {
                cell.update(|table| {
                    let mut next = table.clone();
                    let slots = match kind {
                        PadControl::Button => &mut next.buttons,
                        PadControl::Axis => &mut next.axes,
                    };
                    slots.insert(*index, action_id.to_owned());
                    next
                });
                true
            }
            (RebindTarget::Touch(cell), RawInput::Touch(gesture)) => {
                let gesture = gesture.gesture();
                cell.update(|table| {
                    let mut next = table.clone();
                    next.set(gesture, action_id);
                    next
                });
                true
            }
            _ => false,
        }
    }
}

type Outcome = Result<InputEvent, RebindError>;

struct PendingCapture {
    ticket: u64,
    action_id: String,
    device_type: Option<DeviceType>,
    resolver: oneshot::Sender<Outcome>,
    deadline: Option<Instant>,
    timeout: Option<JoinHandle<()>>,
}

impl PendingCapture {
    fn accepts(&self, device: DeviceType) -> bool {
        self.device_type.map_or(true, |wanted| wanted == device)
    }

    fn is_overdue(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    fn settle(mut self, outcome: Outcome) {
        if let Some(timer) = self.timeout.take() {
            timer.abort();
        }
        // The caller may have dropped its `Capture`; nobody is left to tell.
        let _ = self.resolver.send(outcome);
    }
}

struct RebinderInner {
    sink: EventSink,
    targets: RwLock<Vec<RebindTarget>>,
    pending: Mutex<Option<PendingCapture>>,
    next_ticket: AtomicU64,
}

/// Single-slot capture protocol for remapping the next physical input to an action.
///
/// Cloning shares the state machine.
#[derive(Clone)]
pub struct Rebinder {
    inner: Arc<RebinderInner>,
}

impl Rebinder {
    /// Wraps `sink`; every handled event is forwarded to it.
    pub fn new(sink: EventSink, targets: Vec<RebindTarget>) -> Self {
        Self {
            inner: Arc::new(RebinderInner {
                sink,
                targets: RwLock::new(targets),
                pending: Mutex::new(None),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// Registers another target. A later target for the same device is never consulted;
    /// the first one wins.
    pub fn add_target(&self, target: RebindTarget) {
        self.inner.targets.write().push(target);
    }

    pub fn is_capturing(&self) -> bool {
        self.expire_overdue();
        self.inner.pending.lock().is_some()
    }

    /// Action id of the pending capture, if any.
    pub fn pending_action(&self) -> Option<String> {
        self.expire_overdue();
        self.inner
            .pending
            .lock()
            .as_ref()
            .map(|p| p.action_id.clone())
    }

    /// Forwards `event`, then offers it to the pending capture.
    pub fn handle_event(&self, event: &InputEvent) {
        (self.inner.sink)(event);
        self.expire_overdue();

        let captured = {
            let mut pending = self.inner.pending.lock();
            let applied = pending.as_ref().is_some_and(|capture| {
                capture.accepts(event.device_type) && self.apply(event, &capture.action_id)
            });
            if !applied {
                return;
            }
            pending.take()
        };

        if let Some(capture) = captured {
            debug!(
                action = %capture.action_id,
                device = %event.device_type,
                "rebind captured"
            );
            capture.settle(Ok(event.clone()));
        }
    }

    fn apply(&self, event: &InputEvent, action_id: &str) -> bool {
        let Some(raw) = &event.raw else {
            return false;
        };
        if raw.device_type() != event.device_type {
            return false;
        }
        let targets = self.inner.targets.read();
        targets
            .iter()
            .find(|t| t.device_type() == event.device_type)
            .is_some_and(|target| target.apply(raw, action_id))
    }

    /// Waits for the next applicable input and binds it to `action_id`.
    ///
    /// `device_type` restricts which device may answer. A `timeout` of `None` or zero
    /// waits indefinitely. Outside a tokio runtime no timer is armed and an overdue
    /// capture is rejected the next time the rebinder or the [`Capture`] is touched.
    pub fn capture_next(
        &self,
        action_id: impl Into<String>,
        device_type: Option<DeviceType>,
        timeout: Option<Duration>,
    ) -> Capture {
        let action_id = action_id.into();
        let (resolver, receiver) = oneshot::channel();
        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let timeout = timeout.filter(|d| !d.is_zero());
        self.expire_overdue();

        let superseded = self.inner.pending.lock().replace(PendingCapture {
            ticket,
            action_id: action_id.clone(),
            device_type,
            resolver,
            deadline: timeout.and_then(|delay| Instant::now().checked_add(delay)),
            timeout: None,
        });
        if let Some(previous) = superseded {
            debug!(action = %previous.action_id, "rebind superseded");
            previous.settle(Err(RebindError::Superseded));
        }

        if let Some(delay) = timeout {
            self.arm_timeout(ticket, delay);
        }

        debug!(action = %action_id, device = ?device_type, ?timeout, "rebind capture started");
        Capture {
            receiver,
            rebinder: Arc::downgrade(&self.inner),
        }
    }

    fn arm_timeout(&self, ticket: u64, delay: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime; rebind timeout checked on access only");
            return;
        };

        let weak: Weak<RebinderInner> = Arc::downgrade(&self.inner);
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                Rebinder { inner }.expire(ticket);
            }
        });

        let mut pending = self.inner.pending.lock();
        match pending.as_mut() {
            Some(capture) if capture.ticket == ticket => capture.timeout = Some(timer),
            _ => timer.abort(),
        }
    }

    fn expire(&self, ticket: u64) {
        let expired = {
            let mut pending = self.inner.pending.lock();
            if pending.as_ref().map(|p| p.ticket) != Some(ticket) {
                return;
            }
            pending.take()
        };

        if let Some(mut capture) = expired {
            // Running inside the timer task; let it finish instead of aborting itself.
            capture.timeout = None;
            debug!(action = %capture.action_id, "rebind timed out");
            capture.settle(Err(RebindError::TimedOut));
        }
    }

    /// Rejects the pending capture with [`RebindError::TimedOut`] once its deadline passed.
    fn expire_overdue(&self) {
        let now = Instant::now();
        let overdue = {
            let mut pending = self.inner.pending.lock();
            if !pending.as_ref().is_some_and(|p| p.is_overdue(now)) {
                return;
            }
            pending.take()
        };

        if let Some(capture) = overdue {
            debug!(action = %capture.action_id, "rebind timed out");
            capture.settle(Err(RebindError::TimedOut));
        }
    }

    /// Rejects the pending capture, if any, with [`RebindError::Cancelled`].
    /// A capture already past its deadline is rejected as timed out instead.
    pub fn cancel(&self) {
        self.expire_overdue();
        let cancelled = self.inner.pending.lock().take();
        if let Some(capture) = cancelled {
            debug!(action = %capture.action_id, "rebind cancelled");
            capture.settle(Err(RebindError::Cancelled));
        }
    }

    /// This rebinder as an event sink, for adapters to emit into.
    pub fn sink(&self) -> EventSink {
        let rebinder = self.clone();
        Arc::new(move |event: &InputEvent| rebinder.handle_event(event))
    }
}

/// Pending result of [`Rebinder::capture_next`].
///
/// Resolves with the event that was captured, or the reason the capture ended.
#[must_use = "a capture does nothing unless awaited or polled"]
pub struct Capture {
    receiver: oneshot::Receiver<Outcome>,
    rebinder: Weak<RebinderInner>,
}

impl Capture {
    fn expire_overdue(&self) {
        if let Some(inner) = self.rebinder.upgrade() {
            Rebinder { inner }.expire_overdue();
        }
    }

    /// Non-blocking check; `None` while still pending.
    pub fn try_result(&mut self) -> Option<Outcome> {
        self.expire_overdue();
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(RebindError::Cancelled)),
        }
    }
}

impl Future for Capture {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.expire_overdue();
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(RebindError::Cancelled)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Gesture, Phase, TouchPoint, TouchRaw};
    use crate::sink;
    use std::sync::atomic::AtomicUsize;

    fn key_event(code: &str) -> InputEvent {
        InputEvent::new(DeviceType::Keyboard, "anything", Phase::Pressed).with_raw(
            RawInput::Keyboard {
                code: code.into(),
                key: String::new(),
            },
        )
    }

    fn keyboard_rebinder() -> (Rebinder, BindingCell<KeyboardBindings>) {
        let cell = BindingCell::new(KeyboardBindings::new().with("KeyW", "moveForward"));
        let rebinder = Rebinder::new(sink::discard(), vec![RebindTarget::Keyboard(cell.clone())]);
        (rebinder, cell)
    }

    #[test]
    fn events_are_forwarded_whether_or_not_capturing() {
        let forwarded = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&forwarded);
        let rebinder = Rebinder::new(
            sink::from_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
            Vec::new(),
        );
        rebinder.handle_event(&key_event("KeyA"));
        let _capture = rebinder.capture_next("jump", None, None);
        rebinder.handle_event(&key_event("KeyA"));
        assert_eq!(forwarded.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn keyboard_capture_rebinds_code() {
        let (rebinder, cell) = keyboard_rebinder();
        let before = cell.get();
        let mut capture = rebinder.capture_next("jump", None, None);
        assert!(rebinder.is_capturing());
        assert_eq!(rebinder.pending_action().as_deref(), Some("jump"));

        rebinder.handle_event(&key_event("Space"));

        let event = capture.try_result().unwrap().unwrap();
        assert_eq!(event.device_type, DeviceType::Keyboard);
        assert!(!rebinder.is_capturing());
        assert_eq!(cell.get().get("Space"), Some("jump"));
        assert_eq!(cell.get().get("KeyW"), Some("moveForward"));
        assert_eq!(before.get("Space"), None);
    }

    #[test]
    fn second_capture_supersedes_first() {
        let (rebinder, _) = keyboard_rebinder();
        let mut first = rebinder.capture_next("A", None, None);
        let mut second = rebinder.capture_next("B", None, None);

        assert_eq!(first.try_result(), Some(Err(RebindError::Superseded)));
        assert_eq!(second.try_result(), None);
        assert_eq!(rebinder.pending_action().as_deref(), Some("B"));
    }

    #[test]
    fn device_filter_and_unusable_raw_keep_capturing() {
        let (rebinder, cell) = keyboard_rebinder();
        let mut capture = rebinder.capture_next("jump", Some(DeviceType::Keyboard), None);

        let mouse = InputEvent::new(DeviceType::Mouse, "fire", Phase::Pressed)
            .with_raw(RawInput::Mouse(MouseRaw::Button { button: 0 }));
        rebinder.handle_event(&mouse);
        rebinder.handle_event(&InputEvent::new(DeviceType::Keyboard, "x", Phase::Pressed));
        rebinder.handle_event(&key_event(""));
        assert_eq!(capture.try_result(), None);
        assert!(rebinder.is_capturing());

        rebinder.handle_event(&key_event("KeyJ"));
        assert!(capture.try_result().unwrap().is_ok());
        assert_eq!(cell.get().get("KeyJ"), Some("jump"));
    }

    #[test]
    fn missing_target_keeps_capturing() {
        let (rebinder, _) = keyboard_rebinder();
        let mut capture = rebinder.capture_next("jump", None, None);
        let pad = InputEvent::new(DeviceType::Gamepad, "a", Phase::Pressed).with_raw(
            RawInput::Gamepad {
                slot: 0,
                kind: PadControl::Button,
                index: 3,
            },
        );
        rebinder.handle_event(&pad);
        assert_eq!(capture.try_result(), None);
    }

    #[test]
    fn cancel_rejects_and_is_idempotent() {
        let (rebinder, _) = keyboard_rebinder();
        rebinder.cancel();
        let mut capture = rebinder.capture_next("jump", None, None);
        rebinder.cancel();
        rebinder.cancel();
        assert_eq!(capture.try_result(), Some(Err(RebindError::Cancelled)));
        assert!(!rebinder.is_capturing());
    }

    #[test]
    fn mouse_rebinds_by_signal_kind() {
        let cell = BindingCell::new(MouseBindings::default());
        let rebinder = Rebinder::new(sink::discard(), vec![RebindTarget::Mouse(cell.clone())]);

        for (action, raw) in [
            ("fire", MouseRaw::Button { button: 2 }),
            ("zoom", MouseRaw::Wheel { delta_x: 0.0, delta_y: 1.0 }),
            ("look", MouseRaw::Move { movement_x: 1.0, movement_y: 0.0 }),
        ] {
            let mut capture = rebinder.capture_next(action, None, None);
            rebinder.handle_event(
                &InputEvent::new(DeviceType::Mouse, "old", Phase::Axis)
                    .with_raw(RawInput::Mouse(raw)),
            );
            assert!(capture.try_result().unwrap().is_ok());
        }

        let table = cell.get();
        assert_eq!(table.button(2), Some("fire"));
        assert_eq!(table.wheel(), Some("zoom"));
        assert_eq!(table.movement(), Some("look"));
    }

    #[test]
    fn gamepad_rebinds_button_or_axis_by_kind() {
        let cell = BindingCell::new(GamepadBindings::default());
        let rebinder = Rebinder::new(sink::discard(), vec![RebindTarget::Gamepad(cell.clone())]);

        for (action, kind) in [("jump", PadControl::Button), ("steer", PadControl::Axis)] {
            let mut capture = rebinder.capture_next(action, Some(DeviceType::Gamepad), None);
            rebinder.handle_event(
                &InputEvent::new(DeviceType::Gamepad, "old", Phase::Pressed).with_raw(
                    RawInput::Gamepad {
                        slot: 1,
                        kind,
                        index: 4,
                    },
                ),
            );
            assert!(capture.try_result().unwrap().is_ok());
        }

        let table = cell.get();
        assert_eq!(table.button(4), Some("jump"));
        assert_eq!(table.axis(4), Some("steer"));
    }

    #[test]
    fn touch_rebinds_named_gesture_slot() {
        let cell = BindingCell::new(TouchBindings::default());
        let rebinder = Rebinder::new(sink::discard(), vec![RebindTarget::Touch(cell.clone())]);
        let mut capture = rebinder.capture_next("menu", None, None);
        let raw = TouchRaw::LongPress {
            duration: Duration::from_millis(700),
            start: TouchPoint::default(),
            end: TouchPoint::default(),
        };
        rebinder.handle_event(
            &InputEvent::new(DeviceType::Touch, "old", Phase::Pressed)
                .with_raw(RawInput::Touch(raw)),
        );
        assert!(capture.try_result().unwrap().is_ok());
        assert_eq!(cell.get().slot(Gesture::LongPress), Some("menu"));
        assert_eq!(cell.get().slot(Gesture::Tap), None);
    }

    #[tokio::test]
    async fn timeout_rejects_then_new_capture_works() {
        let (rebinder, cell) = keyboard_rebinder();
        let outcome = rebinder
            .capture_next("A", None, Some(Duration::from_millis(50)))
            .await;
        assert_eq!(outcome, Err(RebindError::TimedOut));
        assert!(!rebinder.is_capturing());

        let capture = rebinder.capture_next("B", None, Some(Duration::from_millis(500)));
        rebinder.handle_event(&key_event("KeyB"));
        let event = capture.await.unwrap();
        assert_eq!(event.device_type, DeviceType::Keyboard);
        assert_eq!(cell.get().get("KeyB"), Some("B"));
    }

    #[tokio::test]
    async fn resolved_capture_disarms_its_timeout() {
        let (rebinder, _) = keyboard_rebinder();
        let capture = rebinder.capture_next("A", None, Some(Duration::from_millis(20)));
        rebinder.handle_event(&key_event("KeyA"));
        assert!(capture.await.is_ok());

        let mut next = rebinder.capture_next("B", None, None);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(next.try_result(), None);
        assert_eq!(rebinder.pending_action().as_deref(), Some("B"));
    }

    #[test]
    fn timeout_without_runtime_rejects_on_next_check() {
        let (rebinder, cell) = keyboard_rebinder();
        let mut capture = rebinder.capture_next("A", None, Some(Duration::from_millis(30)));
        assert_eq!(capture.try_result(), None);

        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(capture.try_result(), Some(Err(RebindError::TimedOut)));
        assert!(!rebinder.is_capturing());

        rebinder.handle_event(&key_event("KeyA"));
        assert_eq!(cell.get().get("KeyA"), None);
    }

    #[test]
    fn overdue_capture_is_not_applied_or_reported_pending() {
        let (rebinder, cell) = keyboard_rebinder();
        let mut capture = rebinder.capture_next("A", None, Some(Duration::from_millis(30)));
        std::thread::sleep(Duration::from_millis(100));

        rebinder.handle_event(&key_event("KeyA"));
        assert_eq!(cell.get().get("KeyA"), None);
        assert_eq!(rebinder.pending_action(), None);
        assert_eq!(capture.try_result(), Some(Err(RebindError::TimedOut)));
    }

    #[test]
    fn overdue_capture_times_out_instead_of_being_superseded() {
        let (rebinder, _) = keyboard_rebinder();
        let mut first = rebinder.capture_next("A", None, Some(Duration::from_millis(30)));
        std::thread::sleep(Duration::from_millis(100));

        let _second = rebinder.capture_next("B", None, None);
        assert_eq!(first.try_result(), Some(Err(RebindError::TimedOut)));
        assert_eq!(rebinder.pending_action().as_deref(), Some("B"));
    }

    #[test]
    fn dropped_rebinder_reads_as_cancelled() {
        let (rebinder, _) = keyboard_rebinder();
        let mut capture = rebinder.capture_next("A", None, None);
        drop(rebinder);
        assert_eq!(capture.try_result(), Some(Err(RebindError::Cancelled)));
    }
}
