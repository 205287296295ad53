//! Handler registration and resolution.
//!
//! Handlers are registered once during startup, each under a unique name per
//! event kind with a numeric priority, and the registry is frozen into an
//! `Arc` before dispatch begins. Resolution returns handlers sorted by
//! ascending priority (lower runs first), ties in registration order.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::error::{HandlerResult, RegistryError};
use crate::event::{Event, EventKind};

/// Lowest accepted handler priority (runs first).
pub const PRIORITY_MIN: i32 = 10_000;
/// Highest accepted handler priority (runs last).
pub const PRIORITY_MAX: i32 = 50_000;
/// Priority assigned when a registration passes an out-of-range value.
pub const PRIORITY_DEFAULT: i32 = 30_000;

/// A type-erased event handler.
///
/// Handlers receive the event by mutable reference and claim it with
/// [`Event::mark_handled`]. They must stay bounded — the host blocks on the
/// dispatch verdict.
pub type HandlerFn = Arc<dyn Fn(&mut Event) -> HandlerResult + Send + Sync>;

/// One named, prioritized handler registration.
#[derive(Clone)]
pub struct Registration {
    name: String,
    priority: i32,
    handler: HandlerFn,
}

impl Registration {
    /// The unique (per kind) handler name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The effective (validated) priority.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Invokes the handler on the event.
    pub fn invoke(&self, event: &mut Event) -> HandlerResult {
        (self.handler)(event)
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// The ordered handler collection, one slot per event kind.
///
/// Read-only after the startup registration pass, so it is shared across
/// dispatch invocations without locking.
#[derive(Default)]
pub struct HandlerRegistry {
    slots: HashMap<EventKind, Vec<Registration>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `kind` under `name` with the given priority.
    ///
    /// Priorities outside `PRIORITY_MIN..=PRIORITY_MAX` are replaced with
    /// [`PRIORITY_DEFAULT`]. Fails if `name` is already taken for `kind` —
    /// a duplicate would silently mask a handler, so this is fatal at
    /// startup.
    pub fn register<F>(
        &mut self,
        kind: EventKind,
        name: impl Into<String>,
        priority: i32,
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&mut Event) -> HandlerResult + Send + Sync + 'static,
    {
        let name = name.into();
        let slot = self.slots.entry(kind).or_default();
        if slot.iter().any(|r| r.name == name) {
            return Err(RegistryError::DuplicateName { kind, name });
        }

        let priority = validate_priority(&name, priority);
        slot.push(Registration {
            name,
            priority,
            handler: Arc::new(handler),
        });
        // Stable sort: equal priorities keep registration order.
        slot.sort_by_key(|r| r.priority);
        Ok(())
    }

    /// Returns the handlers registered for `kind` in invocation order.
    ///
    /// An empty slice, not an error, when nothing is registered.
    pub fn resolve(&self, kind: EventKind) -> &[Registration] {
        self.slots.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registrations across all kinds.
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    /// Returns whether the registry holds no registrations.
    pub fn is_empty(&self) -> bool {
        self.slots.values().all(Vec::is_empty)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("registrations", &self.len())
            .finish()
    }
}

fn validate_priority(name: &str, priority: i32) -> i32 {
    if (PRIORITY_MIN..=PRIORITY_MAX).contains(&priority) {
        priority
    } else {
        warn!(
            handler = name,
            priority,
            default = PRIORITY_DEFAULT,
            "handler priority out of range, using default"
        );
        PRIORITY_DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_unregistered_kind_is_empty() {
        let registry = HandlerRegistry::new();
        assert!(registry.resolve(EventKind::GroupMessage).is_empty());
    }

    #[test]
    fn resolution_is_sorted_by_priority() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::GroupMessage, "late", 40_000, |_| Ok(()))
            .unwrap();
        registry
            .register(EventKind::GroupMessage, "early", 20_000, |_| Ok(()))
            .unwrap();
        registry
            .register(EventKind::GroupMessage, "middle", 30_000, |_| Ok(()))
            .unwrap();

        let names: Vec<&str> = registry
            .resolve(EventKind::GroupMessage)
            .iter()
            .map(Registration::name)
            .collect();
        assert_eq!(names, ["early", "middle", "late"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut registry = HandlerRegistry::new();
        for name in ["first", "second", "third"] {
            registry
                .register(EventKind::PrivateMessage, name, 30_000, |_| Ok(()))
                .unwrap();
        }

        let names: Vec<&str> = registry
            .resolve(EventKind::PrivateMessage)
            .iter()
            .map(Registration::name)
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn out_of_range_priority_falls_back_to_default() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::GroupMessage, "low", 5, |_| Ok(()))
            .unwrap();
        registry
            .register(EventKind::GroupMessage, "high", 99_999, |_| Ok(()))
            .unwrap();

        for registration in registry.resolve(EventKind::GroupMessage) {
            assert_eq!(registration.priority(), PRIORITY_DEFAULT);
        }
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::FriendRequest, "gate", 30_000, |_| Ok(()))
            .unwrap();
        let err = registry
            .register(EventKind::FriendRequest, "gate", 20_000, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_name_on_different_kinds_is_allowed() {
        let mut registry = HandlerRegistry::new();
        registry
            .register(EventKind::GroupMessage, "audit", 30_000, |_| Ok(()))
            .unwrap();
        registry
            .register(EventKind::PrivateMessage, "audit", 30_000, |_| Ok(()))
            .unwrap();
        assert_eq!(registry.len(), 2);
    }
}
