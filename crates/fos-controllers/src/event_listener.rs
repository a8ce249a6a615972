//! Event Listener Multiplexer
//!
//! One host subscription fanned out to an ordered set of bindings.

use std::fmt;
use std::rc::Rc;

use fos_dom::{EventHost, EventTarget, HostEvent, ListenerOptions};

use crate::binding::Binding;

/// Host event plus the immediate-propagation flag bindings observe
#[derive(Debug)]
pub struct DispatchedEvent<E> {
    event: E,
    immediate_propagation_stopped: bool,
}

impl<E: HostEvent> DispatchedEvent<E> {
    /// Wrap a raw host event, once per dispatch
    pub fn new(event: E) -> Self {
        Self {
            event,
            immediate_propagation_stopped: false,
        }
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn event_mut(&mut self) -> &mut E {
        &mut self.event
    }

    pub fn into_inner(self) -> E {
        self.event
    }

    pub fn event_type(&self) -> &str {
        self.event.event_type()
    }

    /// Halt remaining bindings and forward to the host event
    pub fn stop_immediate_propagation(&mut self) {
        self.immediate_propagation_stopped = true;
        self.event.stop_immediate_propagation();
    }

    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }
}

/// Bindings sharing one host listener
pub struct EventListener<E> {
    event_target: EventTarget,
    event_name: String,
    event_options: ListenerOptions,
    unordered_bindings: Vec<Rc<dyn Binding<E>>>,
    connected: bool,
}

impl<E> fmt::Debug for EventListener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("event_target", &self.event_target)
            .field("event_name", &self.event_name)
            .field("event_options", &self.event_options)
            .field("bindings", &self.unordered_bindings.len())
            .field("connected", &self.connected)
            .finish()
    }
}

impl<E: HostEvent> EventListener<E> {
    pub fn new(event_target: EventTarget, event_name: &str, event_options: ListenerOptions) -> Self {
        Self {
            event_target,
            event_name: event_name.to_string(),
            event_options,
            unordered_bindings: Vec::new(),
            connected: false,
        }
    }

    pub fn event_target(&self) -> EventTarget {
        self.event_target
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn event_options(&self) -> ListenerOptions {
        self.event_options
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Subscribe to the host, at most once
    pub fn connect(&mut self, host: &mut dyn EventHost) {
        if !self.connected {
            host.add_event_listener(self.event_target, &self.event_name, self.event_options);
            self.connected = true;
        }
    }

    pub fn disconnect(&mut self, host: &mut dyn EventHost) {
        if self.connected {
            host.remove_event_listener(self.event_target, &self.event_name, self.event_options);
            self.connected = false;
        }
    }

    pub fn binding_connected(&mut self, binding: Rc<dyn Binding<E>>) {
        if !self.contains(&binding) {
            self.unordered_bindings.push(binding);
        }
    }

    pub fn binding_disconnected(&mut self, binding: &Rc<dyn Binding<E>>) {
        self.unordered_bindings.retain(|b| !Rc::ptr_eq(b, binding));
    }

    fn contains(&self, binding: &Rc<dyn Binding<E>>) -> bool {
        self.unordered_bindings.iter().any(|b| Rc::ptr_eq(b, binding))
    }

    pub fn has_bindings(&self) -> bool {
        !self.unordered_bindings.is_empty()
    }

    /// Bindings by ascending index, ties in connection order
    pub fn bindings(&self) -> Vec<Rc<dyn Binding<E>>> {
        let mut bindings = self.unordered_bindings.clone();
        bindings.sort_by_key(|binding| binding.index());
        bindings
    }

    /// Run bindings in order until one stops immediate propagation
    pub fn handle_event(&self, event: &mut DispatchedEvent<E>) {
        for binding in self.bindings() {
            if event.is_immediate_propagation_stopped() {
                break;
            }
            binding.handle_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use fos_dom::{DomEvent, EventListenerRegistry};

    struct Recorder {
        index: usize,
        stop: bool,
        log: Rc<RefCell<Vec<usize>>>,
    }

    impl Binding<DomEvent> for Recorder {
        fn index(&self) -> usize {
            self.index
        }

        fn event_target(&self) -> EventTarget {
            EventTarget::Document
        }

        fn event_name(&self) -> &str {
            "click"
        }

        fn handle_event(&self, event: &mut DispatchedEvent<DomEvent>) {
            self.log.borrow_mut().push(self.index);
            if self.stop {
                event.stop_immediate_propagation();
            }
        }
    }

    fn binding(index: usize, stop: bool, log: &Rc<RefCell<Vec<usize>>>) -> Rc<dyn Binding<DomEvent>> {
        Rc::new(Recorder {
            index,
            stop,
            log: Rc::clone(log),
        })
    }

    fn click() -> DispatchedEvent<DomEvent> {
        DispatchedEvent::new(DomEvent::new("click", EventTarget::Document))
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut host = EventListenerRegistry::new();
        let mut listener = EventListener::<DomEvent>::new(EventTarget::Document, "click", ListenerOptions::default());

        listener.connect(&mut host);
        listener.connect(&mut host);
        assert_eq!(host.listener_count(EventTarget::Document, "click"), 1);

        listener.disconnect(&mut host);
        listener.disconnect(&mut host);
        assert_eq!(host.listener_count(EventTarget::Document, "click"), 0);
        assert!(!listener.is_connected());
    }

    #[test]
    fn test_bindings_run_by_index_with_stable_ties() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listener = EventListener::new(EventTarget::Document, "click", ListenerOptions::default());
        for index in [3, 1, 2, 1] {
            listener.binding_connected(binding(index, false, &log));
        }

        listener.handle_event(&mut click());

        assert_eq!(*log.borrow(), vec![1, 1, 2, 3]);
    }

    #[test]
    fn test_stop_immediate_propagation_halts_later_bindings() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listener = EventListener::new(EventTarget::Document, "click", ListenerOptions::default());
        listener.binding_connected(binding(3, false, &log));
        listener.binding_connected(binding(1, true, &log));
        listener.binding_connected(binding(2, false, &log));

        let mut event = click();
        listener.handle_event(&mut event);

        assert_eq!(*log.borrow(), vec![1]);
        assert!(event.is_immediate_propagation_stopped());
        assert!(event.event().is_immediate_propagation_stopped());
    }

    #[test]
    fn test_duplicate_bindings_are_ignored() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listener = EventListener::new(EventTarget::Document, "click", ListenerOptions::default());
        let shared = binding(1, false, &log);

        listener.binding_connected(Rc::clone(&shared));
        listener.binding_connected(Rc::clone(&shared));
        assert_eq!(listener.bindings().len(), 1);

        listener.binding_disconnected(&shared);
        assert!(!listener.has_bindings());
        assert!(format!("{:?}", listener).contains("bindings: 0"));
    }
}
