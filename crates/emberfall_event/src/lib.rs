//! # emberfall_event - Synchronous Event Bus
//!
//! Typed publish/subscribe used by the combat and enemy systems:
//! - Events are plain structs, routed by `TypeId`
//! - Listeners run inline during `emit`, highest priority first
//! - A panicking listener is caught and logged; the rest still run
//!
//! The bus is passed into systems explicitly (usually as `Arc<EventBus>`),
//! so every simulation or test gets its own listener table.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

/// Listener priority
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

// Blanket implementation
impl<T: Send + Sync + 'static> Event for T {}

/// Type-erased listener
type DynamicHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Subscriber ID returned by [`EventBus::on`], used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

struct Listener {
    id: SubscriberId,
    priority: Priority,
    handler: DynamicHandler,
}

#[derive(Default)]
struct Listeners {
    by_type: BTreeMap<TypeId, Vec<Listener>>,
    next_subscriber_id: u64,
}

/// Event bus for subscribing to and emitting events
pub struct EventBus {
    listeners: RwLock<Listeners>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Listeners {
                by_type: BTreeMap::new(),
                next_subscriber_id: 1,
            }),
        }
    }

    /// Subscribe to an event type
    pub fn on<E: Event, F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.on_with_priority::<E, F>(handler, Priority::Normal)
    }

    /// Subscribe with priority
    pub fn on_with_priority<E: Event, F>(&self, handler: F, priority: Priority) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write();
        let id = SubscriberId(listeners.next_subscriber_id);
        listeners.next_subscriber_id += 1;

        let wrapped_handler: DynamicHandler = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                handler(event);
            }
        });

        let entries = listeners.by_type.entry(TypeId::of::<E>()).or_default();
        entries.push(Listener {
            id,
            priority,
            handler: wrapped_handler,
        });
        // Stable sort keeps subscription order within a priority
        entries.sort_by(|a, b| b.priority.cmp(&a.priority));

        id
    }

    /// Unsubscribe. Returns false if the id was not subscribed.
    pub fn off(&self, id: SubscriberId) -> bool {
        let mut listeners = self.listeners.write();
        let mut removed = false;
        for entries in listeners.by_type.values_mut() {
            let before = entries.len();
            entries.retain(|listener| listener.id != id);
            removed |= entries.len() != before;
        }
        removed
    }

    /// Deliver an event to every listener of its type, inline.
    ///
    /// Returns the number of listeners that completed without panicking.
    pub fn emit<E: Event>(&self, event: &E) -> usize {
        // Snapshot so listeners may subscribe/unsubscribe while we dispatch
        let handlers: Vec<(SubscriberId, DynamicHandler)> = {
            let listeners = self.listeners.read();
            match listeners.by_type.get(&TypeId::of::<E>()) {
                Some(entries) => entries
                    .iter()
                    .map(|listener| (listener.id, Arc::clone(&listener.handler)))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, handler) in handlers {
            let result = panic::catch_unwind(AssertUnwindSafe(|| handler(event as &dyn Any)));
            match result {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    log::error!(
                        "Listener {:?} for {} panicked: {}",
                        id,
                        std::any::type_name::<E>(),
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    /// Number of listeners subscribed to an event type
    pub fn listener_count<E: Event>(&self) -> usize {
        self.listeners
            .read()
            .by_type
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.write().by_type.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventBus, Priority, SubscriberId};
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct TestEvent(i32);
    struct OtherEvent;

    #[test]
    fn test_event_bus() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.on(move |_: &TestEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.emit(&TestEvent(42)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Different type is not delivered
        assert_eq!(bus.emit(&OtherEvent), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = bus.on(move |e: &TestEvent| {
            counter_clone.fetch_add(e.0 as u32, Ordering::SeqCst);
        });
        bus.emit(&TestEvent(2));
        assert!(bus.off(id));
        assert!(!bus.off(id));
        bus.emit(&TestEvent(5));

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(bus.listener_count::<TestEvent>(), 0);
    }

    #[test]
    fn test_priority() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let order1 = order.clone();
        let order2 = order.clone();

        bus.on_with_priority(
            move |e: &TestEvent| {
                order1.lock().push(("low", e.0));
            },
            Priority::Low,
        );

        bus.on_with_priority(
            move |e: &TestEvent| {
                order2.lock().push(("high", e.0));
            },
            Priority::High,
        );

        bus.emit(&TestEvent(42));

        let received = order.lock();
        // High priority should be first
        assert_eq!(received[0].0, "high");
        assert_eq!(received[1].0, "low");
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        bus.on_with_priority(|_: &TestEvent| panic!("listener failure"), Priority::High);
        bus.on(move |_: &TestEvent| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.emit(&TestEvent(1)), 1);
        assert_eq!(bus.emit(&TestEvent(2)), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_can_subscribe_during_emit() {
        let bus = Arc::new(EventBus::new());
        let bus_clone = bus.clone();

        bus.on(move |_: &TestEvent| {
            bus_clone.on(|_: &OtherEvent| {});
        });

        bus.emit(&TestEvent(0));
        assert_eq!(bus.listener_count::<OtherEvent>(), 1);
    }
}
