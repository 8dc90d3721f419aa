//! In-process event bus.
//!
//! Decouples UI actions from UI reactions: one part of the application
//! emits `"request.send"`, any number of others (activity feed, console,
//! suggestion engine) react to it without knowing about each other.
//!
//! Dispatch is synchronous and in registration order. A handler that
//! returns an error or panics is logged and skipped; the remaining
//! handlers still run and the emitter never sees the failure.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use runi_domain::Event;
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::error::HandlerResult;
use crate::ports::Clock;

type HandlerFn = dyn Fn(&Event) -> HandlerResult + Send + Sync;

/// A registered event callback. Handlers are identified by pointer, so keep
/// the `Arc` around if you intend to remove it with [`EventBus::off`].
pub type EventHandler = Arc<HandlerFn>;

type ListenerMap = HashMap<String, Vec<EventHandler>>;

/// Wraps a closure into an [`EventHandler`].
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Publish/subscribe dispatcher keyed by event type.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct EventBus {
    listeners: Arc<Mutex<ListenerMap>>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(event_type, handlers)| (event_type.as_str(), handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("listeners", &counts).finish()
    }
}

impl EventBus {
    /// Creates an empty bus that stamps events with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Emits an event with no source label.
    pub fn emit(&self, event_type: &str, payload: Value) {
        self.emit_from(event_type, payload, None);
    }

    /// Emits an event to every handler currently registered for `event_type`.
    ///
    /// Handlers run in registration order before this returns. Emitting a
    /// type nobody listens to is a no-op.
    pub fn emit_from(&self, event_type: &str, payload: Value, source: Option<&str>) {
        // Snapshot so handlers may (un)subscribe while we dispatch.
        let handlers = self.listeners.lock().get(event_type).cloned();
        let Some(handlers) = handlers else {
            trace!(event_type, "no listeners for event");
            return;
        };

        let event = Event::new(
            event_type,
            payload,
            self.clock.now_millis(),
            source.map(str::to_string),
        );

        for (index, handler) in handlers.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(
                    event_type,
                    source = event.source.as_deref().unwrap_or(""),
                    handler = index,
                    error = %err,
                    "event handler failed"
                ),
                Err(payload) => error!(
                    event_type,
                    source = event.source.as_deref().unwrap_or(""),
                    handler = index,
                    error = panic_message(payload.as_ref()),
                    "event handler panicked"
                ),
            }
        }
    }

    /// Registers `handler` for `event_type`.
    ///
    /// Registering the same handler twice for the same type keeps a single
    /// entry. The returned [`Subscription`] removes exactly this handler.
    pub fn on(&self, event_type: &str, handler: EventHandler) -> Subscription {
        {
            let mut listeners = self.listeners.lock();
            let handlers = listeners.entry(event_type.to_string()).or_default();
            if handlers.iter().any(|existing| Arc::ptr_eq(existing, &handler)) {
                trace!(event_type, "handler already registered");
            } else {
                handlers.push(Arc::clone(&handler));
                debug!(event_type, listeners = handlers.len(), "handler registered");
            }
        }

        Subscription {
            listeners: Arc::downgrade(&self.listeners),
            event_type: event_type.to_string(),
            handler,
        }
    }

    /// Registers `handler` to run on the next `event_type` emission only.
    ///
    /// The returned subscription can cancel it before it ever fires.
    pub fn once(&self, event_type: &str, handler: EventHandler) -> Subscription {
        let this: Arc<Mutex<Option<Weak<HandlerFn>>>> = Arc::new(Mutex::new(None));
        let fired = AtomicBool::new(false);
        let listeners = Arc::downgrade(&self.listeners);
        let owned_type = event_type.to_string();
        let slot = Arc::clone(&this);

        let wrapper: EventHandler = Arc::new(move |event: &Event| {
            if fired.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            let me = slot.lock().as_ref().and_then(Weak::upgrade);
            if let (Some(listeners), Some(me)) = (listeners.upgrade(), me) {
                remove_handler(&listeners, &owned_type, &me);
            }
            handler(event)
        });
        *this.lock() = Some(Arc::downgrade(&wrapper));

        self.on(event_type, wrapper)
    }

    /// Removes `handler` from `event_type`. Unknown handlers are ignored.
    pub fn off(&self, event_type: &str, handler: &EventHandler) {
        remove_handler(&self.listeners, event_type, handler);
    }

    /// Removes every handler for `event_type`, or for all types when `None`.
    pub fn remove_all_listeners(&self, event_type: Option<&str>) {
        let mut listeners = self.listeners.lock();
        match event_type {
            Some(event_type) => {
                listeners.remove(event_type);
            }
            None => listeners.clear(),
        }
    }

    /// Number of handlers registered for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.listeners.lock().get(event_type).map_or(0, Vec::len)
    }
}

/// Handle returned by [`EventBus::on`] and [`EventBus::once`].
///
/// Dropping it does not unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    listeners: Weak<Mutex<ListenerMap>>,
    event_type: String,
    handler: EventHandler,
}

impl Subscription {
    /// Removes the handler. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            remove_handler(&listeners, &self.event_type, &self.handler);
        }
    }

    /// The event type this subscription listens to.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Removes one handler by identity, dropping the type's entry once empty.
fn remove_handler(listeners: &Mutex<ListenerMap>, event_type: &str, handler: &EventHandler) {
    let mut listeners = listeners.lock();
    let Some(handlers) = listeners.get_mut(event_type) else {
        return;
    };

    handlers.retain(|existing| !Arc::ptr_eq(existing, handler));
    if handlers.is_empty() {
        listeners.remove(event_type);
        debug!(event_type, "last handler removed");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tracing_subscriber::layer::{Context, SubscriberExt};

    struct WallClock;

    impl Clock for WallClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    fn bus() -> EventBus {
        EventBus::new(Arc::new(WallClock))
    }

    /// Records every event a handler sees, tagged with a label.
    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<(&'static str, Event)>>>) -> EventHandler {
        let log = Arc::clone(log);
        handler(move |event| {
            log.lock().push((label, event.clone()));
            Ok(())
        })
    }

    /// Counts ERROR-level tracing events.
    struct ErrorCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for ErrorCounter {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::ERROR {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let bus = bus();
        bus.emit("nobody.listens", json!({"x": 1}));
        assert_eq!(bus.listener_count("nobody.listens"), 0);
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _h1 = bus.on("request.send", recorder("h1", &log));
        let _h2 = bus.on("request.send", recorder("h2", &log));

        let before = Utc::now().timestamp_millis();
        bus.emit("request.send", json!({"url": "https://x"}));
        let after = Utc::now().timestamp_millis();

        let log = log.lock();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].0, "h1");
        assert_eq!(log[1].0, "h2");
        for (_, event) in log.iter() {
            assert_eq!(event.event_type, "request.send");
            assert_eq!(event.payload, json!({"url": "https://x"}));
            assert_eq!(event.source, None);
            assert!(event.timestamp >= before && event.timestamp <= after);
        }
    }

    #[test]
    fn test_source_is_recorded() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = bus.on("response.received", recorder("h", &log));

        bus.emit_from("response.received", json!(200), Some("ResponsePanel"));

        assert_eq!(log.lock()[0].1.source.as_deref(), Some("ResponsePanel"));
    }

    #[test]
    fn test_failing_handlers_are_isolated_and_logged() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = bus.on("request.send", handler(|_| Err("subscriber broke".into())));
        let _b = bus.on("request.send", handler(|_| panic!("subscriber exploded")));
        let _c = bus.on("request.send", recorder("survivor", &log));

        let errors = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
        tracing::subscriber::with_default(subscriber, || {
            bus.emit("request.send", json!(null));
        });

        assert_eq!(log.lock().len(), 1);
        assert_eq!(errors.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_once_fires_exactly_once_with_first_payload() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _sub = bus.once("request.send", recorder("once", &log));
        assert_eq!(bus.listener_count("request.send"), 1);

        bus.emit("request.send", json!(1));
        bus.emit("request.send", json!(2));

        let log = log.lock();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1.payload, json!(1));
        assert_eq!(bus.listener_count("request.send"), 0);
    }

    #[test]
    fn test_once_removes_only_itself() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _first = bus.on("a", recorder("on", &log));
        let _once = bus.once("a", recorder("once", &log));
        let _last = bus.on("a", recorder("after", &log));

        bus.emit("a", json!(1));
        assert_eq!(bus.listener_count("a"), 2);
        bus.emit("a", json!(2));

        let labels: Vec<_> = log.lock().iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["on", "once", "after", "on", "after"]);
    }

    #[test]
    fn test_unsubscribe_before_emit() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let on_sub = bus.on("a", recorder("on", &log));
        let once_sub = bus.once("a", recorder("once", &log));

        on_sub.unsubscribe();
        once_sub.unsubscribe();
        once_sub.unsubscribe();
        bus.emit("a", json!(null));

        assert!(log.lock().is_empty());
        assert_eq!(bus.listener_count("a"), 0);
    }

    #[test]
    fn test_off_and_listener_count() {
        let bus = bus();
        let h = handler(|_| Ok(()));
        let other = handler(|_| Ok(()));

        let _s1 = bus.on("t", Arc::clone(&h));
        let _s2 = bus.on("t", Arc::clone(&h));
        let _s3 = bus.on("t", Arc::clone(&other));
        assert_eq!(bus.listener_count("t"), 2);

        bus.off("t", &h);
        assert_eq!(bus.listener_count("t"), 1);
        bus.off("t", &other);
        assert_eq!(bus.listener_count("t"), 0);

        bus.off("t", &other);
        assert_eq!(bus.listener_count("t"), 0);
        assert!(!bus.listeners.lock().contains_key("t"));
    }

    #[test]
    fn test_same_handler_on_different_types() {
        let bus = bus();
        let log = Arc::new(Mutex::new(Vec::new()));
        let h = recorder("shared", &log);
        let _a = bus.on("a", Arc::clone(&h));
        let _b = bus.on("b", Arc::clone(&h));

        bus.off("a", &h);
        bus.emit("a", json!(null));
        bus.emit("b", json!(null));

        let log = log.lock();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1.event_type, "b");
    }

    #[test]
    fn test_remove_all_listeners() {
        let bus = bus();
        let _a = bus.on("a", handler(|_| Ok(())));
        let _b = bus.on("b", handler(|_| Ok(())));

        bus.remove_all_listeners(Some("a"));
        assert_eq!(bus.listener_count("a"), 0);
        assert_eq!(bus.listener_count("b"), 1);

        bus.remove_all_listeners(None);
        assert_eq!(bus.listener_count("b"), 0);
    }

    #[test]
    fn test_handler_may_subscribe_during_dispatch() {
        let bus = bus();
        let inner_bus = bus.clone();
        let _sub = bus.on(
            "boot",
            handler(move |_| {
                let _late = inner_bus.on("boot", handler(|_| Ok(())));
                Ok(())
            }),
        );

        bus.emit("boot", json!(null));
        assert_eq!(bus.listener_count("boot"), 2);
    }
}
