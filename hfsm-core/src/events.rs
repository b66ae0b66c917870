//! Event identifiers and the immutable event envelope.

use crate::Priority;
use std::any::Any;
use std::fmt;

/// Type-safe event identifier.
///
/// Identifiers below [`EventId::USER_BASE`] are reserved for the
/// framework (notably [`EventId::START`]); identifiers at or above it are
/// free for callers to assign to their own signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u32);

impl EventId {
    /// First identifier available to user-defined events.
    pub const USER_BASE: u32 = 1000;

    /// Reserved identifier for the synthetic initial-transition event.
    pub const START: EventId = EventId(0);

    /// Build a user-defined identifier, offset from [`EventId::USER_BASE`].
    pub const fn user(offset: u32) -> EventId {
        EventId(Self::USER_BASE + offset)
    }

    /// Whether this identifier falls in the framework-reserved range.
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::USER_BASE
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

/// An immutable event accepted by the event hub.
///
/// Events carry an integer identifier, a human-readable name for trace
/// output, a priority, and an optional opaque payload. Once constructed
/// an event is never mutated; the dispatcher only ever reads it.
pub struct Event {
    id: EventId,
    name: &'static str,
    priority: Priority,
    payload: Option<Box<dyn Any + Send>>,
}

impl Event {
    /// Create an event with no payload.
    pub fn new(id: EventId, name: &'static str, priority: Priority) -> Self {
        Self { id, name, priority, payload: None }
    }

    /// Create an event carrying an arbitrary payload.
    pub fn with_payload<T: Send + 'static>(
        id: EventId,
        name: &'static str,
        priority: Priority,
        payload: T,
    ) -> Self {
        Self { id, name, priority, payload: Some(Box::new(payload)) }
    }

    /// The synthetic `Start` event: highest priority, no payload.
    pub fn start() -> Self {
        Self::new(EventId::START, "Start", Priority::High)
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Borrow the payload as `T`, if one was attached and it matches.
    pub fn payload_ref<T: 'static>(&self) -> Option<&T> {
        self.payload.as_ref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_event_is_reserved_and_high_priority() {
        let evt = Event::start();
        assert!(evt.id().is_reserved());
        assert_eq!(evt.priority(), Priority::High);
    }

    #[test]
    fn user_ids_are_not_reserved() {
        let id = EventId::user(1);
        assert!(!id.is_reserved());
    }

    #[test]
    fn payload_round_trips() {
        let evt = Event::with_payload(EventId::user(1), "Ping", Priority::Mid, 42u32);
        assert_eq!(evt.payload_ref::<u32>(), Some(&42));
        assert_eq!(evt.payload_ref::<&str>(), None);
    }
}
