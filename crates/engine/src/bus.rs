//! In-process publish/subscribe surface for engine events.
//!
//! Subscribers register per `EventKind`; the engine publishes synchronously
//! after each state transition, so a handler always observes fully-updated
//! state. Handlers run outside the registry lock, which keeps re-entrant
//! subscription from a handler safe.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use recall_core::events::{EventKind, ReviewEvent};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Arc<dyn Fn(&ReviewEvent) + Send + Sync>;

struct Subscriber {
    id: SubscriptionId,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<Subscriber>>,
}

impl Registry {
    fn insert(&mut self, kind: EventKind, once: bool, handler: Handler) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.by_kind.entry(kind).or_default().push(Subscriber {
            id,
            once,
            handler,
        });
        id
    }
}

/// Typed event bus. Cheap to share via `Arc`.
#[derive(Default)]
pub struct EventBus {
    registry: Mutex<Registry>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persistent handler for one event kind.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ReviewEvent) + Send + Sync + 'static,
    {
        self.lock().insert(kind, false, Arc::new(handler))
    }

    /// Register a handler that is dropped after its first delivery.
    pub fn subscribe_once<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&ReviewEvent) + Send + Sync + 'static,
    {
        self.lock().insert(kind, true, Arc::new(handler))
    }

    /// Remove a subscription. Returns true if it was still registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.lock();
        for subscribers in registry.by_kind.values_mut() {
            if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
                subscribers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of live subscriptions for one event kind.
    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.lock().by_kind.get(&kind).map_or(0, Vec::len)
    }

    /// Deliver an event to every handler registered for its kind, in
    /// subscription order. One-shot handlers are removed before delivery.
    pub fn publish(&self, event: &ReviewEvent) {
        let handlers: Vec<Handler> = {
            let mut registry = self.lock();
            match registry.by_kind.get_mut(&event.kind()) {
                Some(subscribers) => {
                    let handlers = subscribers
                        .iter()
                        .map(|s| Arc::clone(&s.handler))
                        .collect();
                    subscribers.retain(|s| !s.once);
                    handlers
                }
                None => Vec::new(),
            }
        };

        for handler in handlers {
            handler(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::events::{StreakUpdated, TimeoutWarning};

    fn streak_event(current: u32) -> ReviewEvent {
        ReviewEvent::StreakUpdated(StreakUpdated { current, best: current })
    }

    #[test]
    fn delivers_only_matching_kind() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bus.subscribe(EventKind::StreakUpdated, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        bus.publish(&streak_event(5));
        bus.publish(&ReviewEvent::TimeoutWarning(TimeoutWarning {
            remaining_ms: 1_000,
        }));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].kind(), EventKind::StreakUpdated);
    }

    #[test]
    fn once_subscription_fires_exactly_once() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0_u32));

        let sink = Arc::clone(&count);
        bus.subscribe_once(EventKind::StreakUpdated, move |_| {
            *sink.lock().unwrap() += 1;
        });

        bus.publish(&streak_event(5));
        bus.publish(&streak_event(10));

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(bus.subscriber_count(EventKind::StreakUpdated), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0_u32));

        let sink = Arc::clone(&count);
        let id = bus.subscribe(EventKind::StreakUpdated, move |_| {
            *sink.lock().unwrap() += 1;
        });

        bus.publish(&streak_event(5));
        assert!(bus.unsubscribe(id));
        bus.publish(&streak_event(10));

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            bus.subscribe(EventKind::StreakUpdated, move |_| {
                sink.lock().unwrap().push(tag);
            });
        }

        bus.publish(&streak_event(5));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn handler_may_subscribe_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let inner_bus = Arc::clone(&bus);

        bus.subscribe_once(EventKind::StreakUpdated, move |_| {
            inner_bus.subscribe(EventKind::StreakUpdated, |_| {});
        });

        bus.publish(&streak_event(5));
        assert_eq!(bus.subscriber_count(EventKind::StreakUpdated), 1);
    }
}
