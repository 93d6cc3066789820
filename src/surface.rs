//! Signal surfaces.
//!
//! A [`Surface`] is whatever an adapter listens on: a window, a canvas, a terminal. Adapters
//! attach one listener in `start()` and detach it in `stop()`.
//!
//! [`SignalBus`] is the in-process surface: the host pushes native signals with
//! [`dispatch`](SignalBus::dispatch) and gets the signal back to check whether any
//! listener prevented the default action.
use crate::signal::NativeSignal;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// Listener attached to a surface.
pub type SignalListener<S> = Arc<dyn Fn(&mut S) + Send + Sync>;

/// Handle returned by [`Surface::add_listener`].
pub type ListenerId = u64;

/// Something adapters can listen on for native signals of type `S`.
pub trait Surface<S>: Send + Sync {
    fn add_listener(&self, listener: SignalListener<S>) -> ListenerId;
    fn remove_listener(&self, id: ListenerId);
}

struct ListenerEntry<S> {
    id: ListenerId,
    listener: SignalListener<S>,
    enabled: bool,
}

impl<S> Clone for ListenerEntry<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            enabled: self.enabled,
        }
    }
}

struct BusInner<S> {
    next_id: ListenerId,
    listeners: Vec<ListenerEntry<S>>,
}

/// In-process surface that fans native signals out to attached listeners.
pub struct SignalBus<S> {
    inner: Mutex<BusInner<S>>,
}

impl<S> Default for SignalBus<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SignalBus<S> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BusInner {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    /// Creates a shared bus, the form adapters take.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Re-enables a muted listener.
    pub fn enable(&self, id: ListenerId) {
        if let Some(entry) = self.inner.lock().listeners.iter_mut().find(|e| e.id == id) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&self, id: ListenerId) {
        if let Some(entry) = self.inner.lock().listeners.iter_mut().find(|e| e.id == id) {
            entry.enabled = false;
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl<S: NativeSignal> SignalBus<S> {
    /// Delivers one signal to every enabled listener, in attach order, and hands it back.
    ///
    /// The listener list is captured before delivery, so listeners added or removed
    /// while the signal is in flight only see later signals.
    pub fn dispatch(&self, mut signal: S) -> S {
        let listeners: Vec<ListenerEntry<S>> = self.inner.lock().listeners.clone();
        for entry in listeners.iter().filter(|e| e.enabled) {
            (entry.listener)(&mut signal);
        }
        if signal.default_prevented() {
            trace!("signal default prevented");
        }
        signal
    }

    /// Delivers a batch of signals in order.
    pub fn dispatch_all(&self, signals: impl IntoIterator<Item = S>) -> Vec<S> {
        signals.into_iter().map(|s| self.dispatch(s)).collect()
    }
}

impl<S: Send> Surface<S> for SignalBus<S> {
    fn add_listener(&self, listener: SignalListener<S>) -> ListenerId {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push(ListenerEntry {
            id,
            listener,
            enabled: true,
        });
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.inner.lock().listeners.retain(|e| e.id != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::KeySignal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> SignalListener<KeySignal> {
        let counter = Arc::clone(counter);
        Arc::new(move |_s: &mut KeySignal| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn removed_and_disabled_listeners_are_skipped() {
        let bus = SignalBus::<KeySignal>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let a = bus.add_listener(counting(&hits));
        let b = bus.add_listener(counting(&hits));

        bus.dispatch(KeySignal::down("KeyA", "a"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);

        bus.disable(a);
        bus.dispatch(KeySignal::down("KeyA", "a"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);

        bus.enable(a);
        bus.remove_listener(b);
        bus.dispatch(KeySignal::down("KeyA", "a"));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn listeners_can_prevent_default() {
        let bus = SignalBus::<KeySignal>::new();
        bus.add_listener(Arc::new(|s: &mut KeySignal| s.prevent_default()));
        let signal = bus.dispatch(KeySignal::up("Space", " "));
        assert!(signal.default_prevented());
    }
}
