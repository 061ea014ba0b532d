//! Synchronous label notifications
//!
//! Key principles:
//! - Registration per event kind (only interested listeners are notified)
//! - Immediate delivery at the end of the triggering operation
//! - Listeners may register or unregister while a dispatch is running

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::foundation::collections::{ListenerKey, ListenerMap};
use crate::text::AtlasError;

/// Event kind identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// New characters were packed into the atlas
    AtlasChanged,
    /// The pool scale factor was changed
    ScaleFactorChanged,
    /// The atlas could not place a character
    Error,
}

/// Notification payload
#[derive(Debug, Clone)]
pub enum LabelEvent {
    /// New characters were packed into the atlas
    AtlasChanged,
    /// The pool scale factor was changed
    ScaleFactorChanged {
        /// New scale factor
        scale_factor: f32,
    },
    /// The atlas could not place a character
    Error(AtlasError),
}

impl LabelEvent {
    /// Kind used to route this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AtlasChanged => EventKind::AtlasChanged,
            Self::ScaleFactorChanged { .. } => EventKind::ScaleFactorChanged,
            Self::Error(_) => EventKind::Error,
        }
    }
}

type Listener = Rc<dyn Fn(&LabelEvent)>;

#[derive(Default)]
struct Registry {
    listeners: ListenerMap<Listener>,
    by_kind: HashMap<EventKind, Vec<ListenerKey>>,
}

/// Listener registry with immediate dispatch
///
/// All methods take `&self` so the registry can live in shared state and be reached
/// from inside a listener.
#[derive(Default)]
pub struct EventSystem {
    registry: RefCell<Registry>,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one event kind
    pub fn register_handler<F>(&self, kind: EventKind, handler: F) -> ListenerKey
    where
        F: Fn(&LabelEvent) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let key = registry.listeners.insert(Rc::new(handler));
        registry.by_kind.entry(kind).or_default().push(key);
        key
    }

    /// Remove a listener. Returns false if the key was not registered.
    pub fn unregister(&self, key: ListenerKey) -> bool {
        let mut registry = self.registry.borrow_mut();
        if registry.listeners.remove(key).is_none() {
            return false;
        }
        for keys in registry.by_kind.values_mut() {
            keys.retain(|k| *k != key);
        }
        true
    }

    /// Deliver an event to every listener registered for its kind
    ///
    /// The listener list is captured before delivery: listeners added during this call are
    /// not notified, listeners removed during this call are skipped.
    pub fn dispatch(&self, event: &LabelEvent) {
        let keys = match self.registry.borrow().by_kind.get(&event.kind()) {
            Some(keys) => keys.clone(),
            None => return,
        };

        for key in keys {
            let listener = self.registry.borrow().listeners.get(key).cloned();
            if let Some(listener) = listener {
                listener(event);
            }
        }
    }

    /// Number of listeners registered for a kind
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registry
            .borrow()
            .by_kind
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Remove every listener
    pub fn clear(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.listeners.clear();
        registry.by_kind.clear();
    }
}

impl std::fmt::Debug for EventSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSystem")
            .field("listeners", &self.registry.borrow().listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_dispatch_routes_by_kind() {
        let system = EventSystem::new();
        let atlas_hits = Rc::new(Cell::new(0));
        let scale_hits = Rc::new(Cell::new(0.0));

        let hits = atlas_hits.clone();
        system.register_handler(EventKind::AtlasChanged, move |_| hits.set(hits.get() + 1));
        let seen = scale_hits.clone();
        system.register_handler(EventKind::ScaleFactorChanged, move |event| {
            if let LabelEvent::ScaleFactorChanged { scale_factor } = event {
                seen.set(*scale_factor);
            }
        });

        system.dispatch(&LabelEvent::AtlasChanged);
        system.dispatch(&LabelEvent::ScaleFactorChanged { scale_factor: 2.5 });

        assert_eq!(atlas_hits.get(), 1);
        assert_eq!(scale_hits.get(), 2.5);
    }

    #[test]
    fn test_unregister() {
        let system = EventSystem::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let key = system.register_handler(EventKind::AtlasChanged, move |_| {
            counter.set(counter.get() + 1);
        });

        assert!(system.unregister(key));
        assert!(!system.unregister(key));
        system.dispatch(&LabelEvent::AtlasChanged);

        assert_eq!(hits.get(), 0);
        assert_eq!(system.listener_count(EventKind::AtlasChanged), 0);
    }

    #[test]
    fn test_listener_added_during_dispatch_is_not_called() {
        let system = Rc::new(EventSystem::new());
        let late_hits = Rc::new(Cell::new(0));

        let inner_system = Rc::downgrade(&system);
        let inner_hits = late_hits.clone();
        system.register_handler(EventKind::AtlasChanged, move |_| {
            if let Some(system) = inner_system.upgrade() {
                let hits = inner_hits.clone();
                system.register_handler(EventKind::AtlasChanged, move |_| hits.set(hits.get() + 1));
            }
        });

        system.dispatch(&LabelEvent::AtlasChanged);
        assert_eq!(late_hits.get(), 0);
        assert_eq!(system.listener_count(EventKind::AtlasChanged), 2);

        system.dispatch(&LabelEvent::AtlasChanged);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_listener_removed_during_dispatch_is_skipped() {
        let system = Rc::new(EventSystem::new());
        let second_key = Rc::new(Cell::new(None));
        let second_hits = Rc::new(Cell::new(0));

        let weak = Rc::downgrade(&system);
        let key_slot = second_key.clone();
        system.register_handler(EventKind::AtlasChanged, move |_| {
            if let (Some(system), Some(key)) = (weak.upgrade(), key_slot.get()) {
                system.unregister(key);
            }
        });
        let hits = second_hits.clone();
        let key = system.register_handler(EventKind::AtlasChanged, move |_| hits.set(hits.get() + 1));
        second_key.set(Some(key));

        system.dispatch(&LabelEvent::AtlasChanged);
        assert_eq!(second_hits.get(), 0);
    }
}
