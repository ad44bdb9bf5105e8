/*!
 * Dispatcher
 * A process-wide, single-consumer event bus. Producers call `dispatch`, which
 * is non-blocking unless the bounded queue is full, in which case it blocks
 * the calling informer/callback thread (backpressure). Demultiplexing to
 * handlers happens on one background consumer thread, which
 * is what gives same-target-id events their relative ordering guarantee.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::{debug, trace, warn};
use parking_lot::RwLock;

use super::events::{DispatcherEvent, EventKind};

pub type EventHandler = Arc<dyn Fn(DispatcherEvent) + Send + Sync>;

struct Shared {
    handlers: RwLock<HashMap<EventKind, Vec<EventHandler>>>,
    sender: RwLock<Option<flume::Sender<DispatcherEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    capacity: usize,
}

/// Explicit-lifecycle event bus service, treated as a handle passed through
/// the context rather than ambient module state, so tests can construct
/// independent dispatchers.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                handlers: RwLock::new(HashMap::new()),
                sender: RwLock::new(None),
                worker: Mutex::new(None),
                capacity,
            }),
        }
    }

    pub fn register_event_handler(&self, kind: EventKind, handler: EventHandler) {
        self.shared.handlers.write().entry(kind).or_default().push(handler);
    }

    pub fn unregister_all_event_handlers(&self) {
        self.shared.handlers.write().clear();
    }

    /// Spawns the background consumer. Idempotent: calling twice while already
    /// started is a no-op.
    pub fn start(&self) {
        let mut sender_guard = self.shared.sender.write();
        if sender_guard.is_some() {
            return;
        }
        let (tx, rx) = flume::bounded::<DispatcherEvent>(self.shared.capacity);
        *sender_guard = Some(tx);
        drop(sender_guard);

        let shared = self.shared.clone();
        let handle = std::thread::spawn(move || {
            for event in rx.iter() {
                let kind = event.kind();
                trace!("dispatcher: draining event kind={:?} target={}", kind, event.target_id());
                let handlers = shared.handlers.read();
                if let Some(for_kind) = handlers.get(&kind) {
                    for handler in for_kind {
                        handler(event.clone());
                    }
                }
            }
            debug!("dispatcher: consumer thread exiting, queue drained");
        });
        *self.shared.worker.lock().unwrap() = Some(handle);
    }

    /// Drains in-flight events, then halts the consumer thread. Safe to call
    /// when not started.
    pub fn stop(&self) {
        {
            let mut sender_guard = self.shared.sender.write();
            *sender_guard = None;
        }
        if let Some(handle) = self.shared.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Enqueues `event`. Blocks the caller if the queue is full. Dropped
    /// silently if the dispatcher was never started or has been stopped.
    pub fn dispatch(&self, event: DispatcherEvent) {
        let sender = self.shared.sender.read();
        match sender.as_ref() {
            Some(tx) => {
                if tx.send(event).is_err() {
                    warn!("dispatcher: send failed, consumer thread gone");
                }
            }
            None => {
                trace!("dispatcher: dropped event, not running");
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_DISPATCHER_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::events::CachedNodeEvent;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn dispatch_routes_to_registered_kind_only() {
        let dispatcher = Dispatcher::new(8);
        let node_hits = Arc::new(AtomicUsize::new(0));
        let task_hits = Arc::new(AtomicUsize::new(0));

        let node_hits_c = node_hits.clone();
        dispatcher.register_event_handler(
            EventKind::CachedNode,
            Arc::new(move |_evt| {
                node_hits_c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let task_hits_c = task_hits.clone();
        dispatcher.register_event_handler(
            EventKind::Task,
            Arc::new(move |_evt| {
                task_hits_c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        dispatcher.start();
        dispatcher.dispatch(DispatcherEvent::CachedNode(CachedNodeEvent::Accepted {
            node_id: "n1".into(),
        }));
        dispatcher.stop();

        assert_eq!(node_hits.load(Ordering::SeqCst), 1);
        assert_eq!(task_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dispatch_after_stop_is_dropped_silently() {
        let dispatcher = Dispatcher::new(4);
        dispatcher.start();
        dispatcher.stop();
        // Must not panic or block.
        dispatcher.dispatch(DispatcherEvent::CachedNode(CachedNodeEvent::Removed {
            node_id: "n1".into(),
        }));
    }

    #[test]
    fn unregister_all_clears_handlers() {
        let dispatcher = Dispatcher::new(4);
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_c = hits.clone();
        dispatcher.register_event_handler(
            EventKind::CachedNode,
            Arc::new(move |_evt| {
                hits_c.fetch_add(1, Ordering::SeqCst);
            }),
        );
        dispatcher.unregister_all_event_handlers();
        dispatcher.start();
        dispatcher.dispatch(DispatcherEvent::CachedNode(CachedNodeEvent::Accepted {
            node_id: "n1".into(),
        }));
        dispatcher.stop();
        // Give the consumer thread a beat even though `stop` already joined it.
        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
