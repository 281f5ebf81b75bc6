//! Network reachability state.
//!
//! Passive wrapper over whatever platform integration observes the actual
//! link: something calls [`ConnectivityMonitor::set_connected`] and every
//! subscriber hears about each genuine transition. A transition to
//! connected is the sole trigger for flushing queued decisions;
//! disconnection only updates state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::debug;

type Callback = Box<dyn Fn(bool) + Send + Sync + 'static>;

struct MonitorInner {
    connected: AtomicBool,
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, Callback>>,
}

impl MonitorInner {
    fn subscribers(&self) -> MutexGuard<'_, HashMap<u64, Callback>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
}

impl ConnectivityMonitor {
    pub fn new(initially_connected: bool) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                connected: AtomicBool::new(initially_connected),
                next_id: AtomicU64::new(0),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Record a reachability observation. Subscribers are invoked only
    /// when the state actually changed.
    ///
    /// Callbacks run under the subscriber lock and must not subscribe or
    /// unsubscribe reentrantly.
    pub fn set_connected(&self, connected: bool) {
        let previous = self.inner.connected.swap(connected, Ordering::SeqCst);
        if previous == connected {
            return;
        }

        debug!(connected, "Connectivity transition");
        for callback in self.inner.subscribers().values() {
            callback(connected);
        }
    }

    /// Register a transition observer. Dropping the returned handle stops
    /// delivery.
    pub fn subscribe(&self, callback: impl Fn(bool) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribers().insert(id, Box::new(callback));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Handle tying a subscription to its monitor.
pub struct Subscription {
    id: u64,
    inner: Weak<MonitorInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.subscribers().remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_transition_reaches_subscriber_once() {
        let monitor = ConnectivityMonitor::new(false);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_cb = Arc::clone(&seen);
        let _sub = monitor.subscribe(move |connected| {
            seen_cb.lock().unwrap().push(connected);
        });

        monitor.set_connected(true);
        monitor.set_connected(true); // no transition, no delivery
        monitor.set_connected(false);

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(!monitor.is_connected());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let monitor = ConnectivityMonitor::new(false);
        let count = Arc::new(AtomicUsize::new(0));

        let count_cb = Arc::clone(&count);
        let sub = monitor.subscribe(move |_| {
            count_cb.fetch_add(1, Ordering::SeqCst);
        });

        monitor.set_connected(true);
        sub.unsubscribe();
        monitor.set_connected(false);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropping_handle_unsubscribes() {
        let monitor = ConnectivityMonitor::new(true);
        let count = Arc::new(AtomicUsize::new(0));

        let count_cb = Arc::clone(&count);
        {
            let _sub = monitor.subscribe(move |_| {
                count_cb.fetch_add(1, Ordering::SeqCst);
            });
        }

        monitor.set_connected(false);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
