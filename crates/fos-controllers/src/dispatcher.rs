//! Event Dispatcher
//!
//! Routes bindings to one multiplexer per (target, event name, options) and
//! feeds host events to them.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use fos_dom::{EventHost, EventTarget, HostEvent, ListenerOptions};

use crate::binding::Binding;
use crate::event_listener::{DispatchedEvent, EventListener};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ListenerKey {
    event_name: String,
    options: ListenerOptions,
}

/// Owns every event listener multiplexer
pub struct Dispatcher<E> {
    event_listener_maps: BTreeMap<EventTarget, BTreeMap<ListenerKey, EventListener<E>>>,
    started: bool,
}

impl<E> fmt::Debug for Dispatcher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners: Vec<&EventListener<E>> =
            self.event_listener_maps.values().flat_map(|map| map.values()).collect();
        f.debug_struct("Dispatcher")
            .field("started", &self.started)
            .field("event_listeners", &listeners)
            .finish()
    }
}

impl<E: HostEvent> Default for Dispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: HostEvent> Dispatcher<E> {
    pub fn new() -> Self {
        Self {
            event_listener_maps: BTreeMap::new(),
            started: false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Connect every multiplexer
    pub fn start(&mut self, host: &mut dyn EventHost) {
        self.started = true;
        for listener in self.event_listeners_mut() {
            listener.connect(host);
        }
        tracing::debug!("Dispatcher started ({} listeners)", self.event_listeners().len());
    }

    /// Disconnect every multiplexer
    pub fn stop(&mut self, host: &mut dyn EventHost) {
        self.started = false;
        for listener in self.event_listeners_mut() {
            listener.disconnect(host);
        }
        tracing::debug!("Dispatcher stopped");
    }

    pub fn event_listeners(&self) -> Vec<&EventListener<E>> {
        self.event_listener_maps.values().flat_map(|map| map.values()).collect()
    }

    fn event_listeners_mut(&mut self) -> impl Iterator<Item = &mut EventListener<E>> {
        self.event_listener_maps.values_mut().flat_map(|map| map.values_mut())
    }

    // Binding observer delegate

    pub fn binding_connected(&mut self, host: &mut dyn EventHost, binding: Rc<dyn Binding<E>>) {
        self.fetch_event_listener_for_binding(host, binding.as_ref())
            .binding_connected(binding);
    }

    /// Detach `binding`; with `clear_event_listeners` an emptied multiplexer is dropped
    ///
    /// A binding without a multiplexer was never connected and is ignored.
    pub fn binding_disconnected(
        &mut self,
        host: &mut dyn EventHost,
        binding: &Rc<dyn Binding<E>>,
        clear_event_listeners: bool,
    ) {
        let Some(listener) = self.event_listener_for_binding_mut(binding.as_ref()) else {
            return;
        };
        listener.binding_disconnected(binding);
        if clear_event_listeners && !listener.has_bindings() {
            self.clear_event_listener(host, binding.as_ref());
        }
    }

    fn clear_event_listener(&mut self, host: &mut dyn EventHost, binding: &dyn Binding<E>) {
        let target = binding.event_target();
        let Some(map) = self.event_listener_maps.get_mut(&target) else {
            return;
        };
        if let Some(mut listener) = map.remove(&Self::cache_key(binding)) {
            listener.disconnect(host);
            tracing::trace!("Cleared event listener {:?} {}", target, listener.event_name());
        }
        if map.is_empty() {
            self.event_listener_maps.remove(&target);
        }
    }

    // Event listeners

    fn fetch_event_listener_for_binding(
        &mut self,
        host: &mut dyn EventHost,
        binding: &dyn Binding<E>,
    ) -> &mut EventListener<E> {
        let target = binding.event_target();
        let started = self.started;
        self.event_listener_maps
            .entry(target)
            .or_default()
            .entry(Self::cache_key(binding))
            .or_insert_with(|| {
                let mut listener = EventListener::new(target, binding.event_name(), binding.event_options());
                if started {
                    listener.connect(host);
                }
                tracing::trace!("Created event listener {:?} {}", target, binding.event_name());
                listener
            })
    }

    fn event_listener_for_binding_mut(&mut self, binding: &dyn Binding<E>) -> Option<&mut EventListener<E>> {
        self.event_listener_maps
            .get_mut(&binding.event_target())?
            .get_mut(&Self::cache_key(binding))
    }

    fn cache_key(binding: &dyn Binding<E>) -> ListenerKey {
        ListenerKey {
            event_name: binding.event_name().to_string(),
            options: binding.event_options(),
        }
    }

    /// Host entry point for an event fired on `target`
    ///
    /// Capture multiplexers run before the others, as the host delivers them.
    /// Every connected multiplexer for (target, event name) sees the same
    /// wrapper, so a stop in one halts the rest.
    pub fn handle_event(&self, target: EventTarget, event_name: &str, event: &mut DispatchedEvent<E>) {
        let Some(map) = self.event_listener_maps.get(&target) else {
            return;
        };
        for capture in [true, false] {
            for (key, listener) in map {
                if key.options.capture == capture && key.event_name == event_name && listener.is_connected() {
                    listener.handle_event(event);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use fos_dom::{DomEvent, EventListenerRegistry, NodeId};

    struct Action {
        index: usize,
        target: EventTarget,
        name: &'static str,
        options: ListenerOptions,
        stops: bool,
        log: Rc<RefCell<Vec<usize>>>,
    }

    impl Binding<DomEvent> for Action {
        fn index(&self) -> usize {
            self.index
        }

        fn event_target(&self) -> EventTarget {
            self.target
        }

        fn event_name(&self) -> &str {
            self.name
        }

        fn event_options(&self) -> ListenerOptions {
            self.options
        }

        fn handle_event(&self, event: &mut DispatchedEvent<DomEvent>) {
            self.log.borrow_mut().push(self.index);
            if self.stops {
                event.stop_immediate_propagation();
            }
        }
    }

    fn action(index: usize, name: &'static str, log: &Rc<RefCell<Vec<usize>>>) -> Rc<dyn Binding<DomEvent>> {
        Rc::new(Action {
            index,
            target: EventTarget::Element(NodeId::ROOT),
            name,
            options: ListenerOptions::default(),
            stops: false,
            log: Rc::clone(log),
        })
    }

    fn phase_action(index: usize, capture: bool, stops: bool, log: &Rc<RefCell<Vec<usize>>>) -> Rc<dyn Binding<DomEvent>> {
        Rc::new(Action {
            index,
            target: EventTarget::Element(NodeId::ROOT),
            name: "click",
            options: ListenerOptions { capture, ..Default::default() },
            stops,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn test_listeners_connect_on_start_and_creation() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let target = EventTarget::Element(NodeId::ROOT);

        dispatcher.binding_connected(&mut host, action(0, "click", &log));
        assert_eq!(host.listener_count(target, "click"), 0);

        dispatcher.start(&mut host);
        assert_eq!(host.listener_count(target, "click"), 1);

        dispatcher.binding_connected(&mut host, action(1, "click", &log));
        dispatcher.binding_connected(&mut host, action(0, "input", &log));
        assert_eq!(host.listener_count(target, "click"), 1);
        assert_eq!(host.listener_count(target, "input"), 1);
        assert_eq!(dispatcher.event_listeners().len(), 2);

        dispatcher.stop(&mut host);
        assert_eq!(host.listener_count(target, "click"), 0);
        assert_eq!(host.listener_count(target, "input"), 0);
    }

    #[test]
    fn test_options_split_listeners() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        dispatcher.start(&mut host);

        let capture = Rc::new(Action {
            index: 0,
            target: EventTarget::Window,
            name: "resize",
            options: ListenerOptions { capture: true, ..Default::default() },
            stops: false,
            log: Rc::clone(&log),
        });
        let bubble = Rc::new(Action {
            index: 1,
            target: EventTarget::Window,
            name: "resize",
            options: ListenerOptions::default(),
            stops: false,
            log: Rc::clone(&log),
        });
        dispatcher.binding_connected(&mut host, capture);
        dispatcher.binding_connected(&mut host, bubble);

        assert_eq!(dispatcher.event_listeners().len(), 2);
        assert_eq!(host.listener_count(EventTarget::Window, "resize"), 2);
    }

    #[test]
    fn test_disconnect_keeps_listener_unless_cleared() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let target = EventTarget::Element(NodeId::ROOT);
        dispatcher.start(&mut host);

        let click = action(0, "click", &log);
        dispatcher.binding_connected(&mut host, Rc::clone(&click));
        dispatcher.binding_disconnected(&mut host, &click, false);
        assert_eq!(dispatcher.event_listeners().len(), 1);
        assert!(!dispatcher.event_listeners()[0].has_bindings());
        assert_eq!(host.listener_count(target, "click"), 1);

        dispatcher.binding_connected(&mut host, Rc::clone(&click));
        dispatcher.binding_disconnected(&mut host, &click, true);
        assert!(dispatcher.event_listeners().is_empty());
        assert_eq!(host.listener_count(target, "click"), 0);
    }

    #[test]
    fn test_handle_event_routes_by_target_and_name() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        dispatcher.start(&mut host);
        dispatcher.binding_connected(&mut host, action(1, "click", &log));
        dispatcher.binding_connected(&mut host, action(2, "input", &log));

        let target = EventTarget::Element(NodeId::ROOT);
        let mut event = DispatchedEvent::new(DomEvent::new("click", target));
        dispatcher.handle_event(target, "click", &mut event);
        dispatcher.handle_event(EventTarget::Document, "click", &mut event);

        assert_eq!(*log.borrow(), vec![1]);

        dispatcher.stop(&mut host);
        dispatcher.handle_event(target, "click", &mut event);
        assert_eq!(*log.borrow(), vec![1]);
    }

    #[test]
    fn test_capture_listeners_run_first() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        dispatcher.start(&mut host);
        dispatcher.binding_connected(&mut host, phase_action(1, false, true, &log));
        dispatcher.binding_connected(&mut host, phase_action(0, true, false, &log));

        let target = EventTarget::Element(NodeId::ROOT);
        let mut event = DispatchedEvent::new(DomEvent::new("click", target));
        dispatcher.handle_event(target, "click", &mut event);

        assert_eq!(*log.borrow(), vec![0, 1]);
        assert!(event.is_immediate_propagation_stopped());
    }

    #[test]
    fn test_stop_in_capture_listener_skips_bubble_listener() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        dispatcher.start(&mut host);
        dispatcher.binding_connected(&mut host, phase_action(0, false, false, &log));
        dispatcher.binding_connected(&mut host, phase_action(5, true, true, &log));

        let target = EventTarget::Element(NodeId::ROOT);
        let mut event = DispatchedEvent::new(DomEvent::new("click", target));
        dispatcher.handle_event(target, "click", &mut event);

        assert_eq!(*log.borrow(), vec![5]);
    }

    #[test]
    fn test_disconnect_of_unknown_binding_creates_nothing() {
        let mut host = EventListenerRegistry::new();
        let mut dispatcher = Dispatcher::<DomEvent>::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        dispatcher.start(&mut host);

        dispatcher.binding_disconnected(&mut host, &action(0, "click", &log), false);

        assert!(dispatcher.event_listeners().is_empty());
        assert_eq!(host.listener_count(EventTarget::Element(NodeId::ROOT), "click"), 0);
        assert!(format!("{:?}", dispatcher).starts_with("Dispatcher"));
    }
}
