//! The dispatch engine.
//!
//! [`DispatchEngine::dispatch`] is the single entry point between the host
//! callback boundary and the handler chain. It is synchronous — the host
//! blocks on the returned [`Verdict`] — and it never fails: every raw
//! notification produces exactly one verdict, whatever the handlers do.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{Level, debug, error, span, warn};

use crate::event::{Event, EventKind, RawNotification};
use crate::registry::HandlerRegistry;

/// The interception verdict returned to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No handler claimed the event; the host continues default processing.
    Ignored,
    /// A handler claimed the event; the host suppresses default processing.
    Intercepted,
}

impl Verdict {
    /// The raw integer the host callback contract expects.
    pub fn code(self) -> i32 {
        match self {
            Self::Ignored => 0,
            Self::Intercepted => 1,
        }
    }
}

/// Channel carrying dispatched events to the protocol bridge.
pub type EventSink = mpsc::Sender<Event>;

/// The central dispatch engine.
///
/// Holds the frozen [`HandlerRegistry`] and an optional sink the bridge
/// consumes. `DispatchEngine` is `Send + Sync`; concurrent dispatch
/// invocations only read the registry.
pub struct DispatchEngine {
    registry: Arc<HandlerRegistry>,
    sink: Option<EventSink>,
}

impl DispatchEngine {
    /// Creates an engine over a frozen registry, with no event sink.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            sink: None,
        }
    }

    /// Attaches the bridge sink dispatched events are forwarded into.
    pub fn with_sink(mut self, sink: EventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Returns the registry this engine dispatches against.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Dispatches one raw host notification and returns the verdict.
    ///
    /// 1. Builds the typed event; an unknown sub-kind is logged and answered
    ///    with [`Verdict::Ignored`] — the host must always get a verdict.
    /// 2. Invokes the registered handlers in priority order, stopping at the
    ///    first that marks the event handled.
    /// 3. A handler error or panic is logged with the handler's name and the
    ///    chain continues with the next handler.
    /// 4. The event is forwarded to the bridge sink without blocking.
    pub fn dispatch(&self, kind: EventKind, raw: RawNotification) -> Verdict {
        let span = span!(Level::DEBUG, "dispatch", kind = %kind, sub_kind = raw.sub_kind);
        let _enter = span.enter();

        let mut event = match Event::build(kind, raw) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "dropping notification");
                return Verdict::Ignored;
            }
        };

        for registration in self.registry.resolve(kind) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| registration.invoke(&mut event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(handler = registration.name(), error = %err, "handler failed");
                }
                Err(_) => {
                    error!(handler = registration.name(), "handler panicked");
                }
            }
            if event.handled() {
                debug!(handler = registration.name(), "event intercepted");
                break;
            }
        }

        let verdict = if event.handled() {
            Verdict::Intercepted
        } else {
            Verdict::Ignored
        };

        self.forward(event);
        verdict
    }

    /// Hands the event to the bridge sink.
    ///
    /// Uses `try_send` so a slow bridge can never block the host callback; a
    /// full queue drops the event with a warning.
    fn forward(&self, event: Event) {
        let Some(sink) = &self.sink else {
            return;
        };
        match sink.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(kind = %event.kind(), "publish queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("publish channel closed");
            }
        }
    }
}

impl std::fmt::Debug for DispatchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchEngine")
            .field("registry", &self.registry)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::registry::HandlerRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn group_message() -> RawNotification {
        RawNotification::new(1)
            .with_message_id(42)
            .with_user_id(123)
            .with_group_id(456)
            .with_text("hi")
    }

    #[test]
    fn no_handlers_means_ignored() {
        let engine = DispatchEngine::new(Arc::new(HandlerRegistry::new()));
        let verdict = engine.dispatch(EventKind::GroupMessage, group_message());
        assert_eq!(verdict, Verdict::Ignored);
        assert_eq!(verdict.code(), 0);
    }

    #[test]
    fn unknown_sub_kind_is_ignored_without_running_handlers() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_handler = Arc::clone(&calls);

        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::GroupMessage, "count", 30_000, move |_| {
                calls_handler.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let engine = DispatchEngine::new(Arc::new(registry));
        let verdict = engine.dispatch(EventKind::GroupMessage, RawNotification::new(9));
        assert_eq!(verdict, Verdict::Ignored);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn lower_priority_runs_first_and_interception_short_circuits() {
        // "B" at 20000 must observe the event before "A" at 30000, and once
        // B claims it A must never run.
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut registry = HandlerRegistry::new();
        let order_a = Arc::clone(&order);
        registry
            .register(EventKind::PrivateMessage, "A", 30_000, move |_| {
                order_a.lock().unwrap().push("A");
                Ok(())
            })
            .unwrap();
        let order_b = Arc::clone(&order);
        registry
            .register(EventKind::PrivateMessage, "B", 20_000, move |event| {
                order_b.lock().unwrap().push("B");
                event.mark_handled();
                Ok(())
            })
            .unwrap();

        let engine = DispatchEngine::new(Arc::new(registry));
        let raw = RawNotification::new(11).with_user_id(1).with_text("hello");
        let verdict = engine.dispatch(EventKind::PrivateMessage, raw);

        assert_eq!(verdict, Verdict::Intercepted);
        assert_eq!(verdict.code(), 1);
        assert_eq!(*order.lock().unwrap(), vec!["B"]);
    }

    #[test]
    fn failing_handler_does_not_stop_the_chain() {
        let reached = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::GroupMessage, "broken", 20_000, |_| {
                Err(HandlerError::new("boom"))
            })
            .unwrap();
        let reached_next = Arc::clone(&reached);
        registry
            .register(EventKind::GroupMessage, "next", 30_000, move |event| {
                reached_next.fetch_add(1, Ordering::SeqCst);
                event.mark_handled();
                Ok(())
            })
            .unwrap();

        let engine = DispatchEngine::new(Arc::new(registry));
        let verdict = engine.dispatch(EventKind::GroupMessage, group_message());

        assert_eq!(verdict, Verdict::Intercepted);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_handler_is_contained() {
        let reached = Arc::new(AtomicUsize::new(0));

        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::GroupMessage, "explosive", 20_000, |_| {
                panic!("handler bug")
            })
            .unwrap();
        let reached_next = Arc::clone(&reached);
        registry
            .register(EventKind::GroupMessage, "survivor", 30_000, move |_| {
                reached_next.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        let engine = DispatchEngine::new(Arc::new(registry));
        let verdict = engine.dispatch(EventKind::GroupMessage, group_message());

        assert_eq!(verdict, Verdict::Ignored);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dispatched_events_reach_the_sink() {
        let (tx, mut rx) = mpsc::channel(4);
        let engine = DispatchEngine::new(Arc::new(HandlerRegistry::new())).with_sink(tx);

        engine.dispatch(EventKind::GroupMessage, group_message());

        let event = rx.try_recv().expect("event forwarded");
        assert_eq!(event.kind(), EventKind::GroupMessage);
        assert_eq!(event.message_text(), Some("hi"));
    }

    #[test]
    fn full_sink_never_blocks_dispatch() {
        let (tx, _rx) = mpsc::channel(1);
        let engine = DispatchEngine::new(Arc::new(HandlerRegistry::new())).with_sink(tx);

        // Second dispatch overflows the queue; both must still return.
        let first = engine.dispatch(EventKind::GroupMessage, group_message());
        let second = engine.dispatch(EventKind::GroupMessage, group_message());
        assert_eq!(first, Verdict::Ignored);
        assert_eq!(second, Verdict::Ignored);
    }
}
