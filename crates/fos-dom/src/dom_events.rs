//! DOM Events
//!
//! Host event objects, event targets and the host-level listener table.

use std::collections::HashMap;

use crate::NodeId;
use crate::host::{EventHost, HostEvent};

/// Object that can receive events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventTarget {
    Window,
    Document,
    Element(NodeId),
}

/// Event listener options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

/// DOM event
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: String,
    pub target: EventTarget,
    pub bubbles: bool,
    pub cancelable: bool,
    pub timestamp: f64,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl DomEvent {
    /// Create an event of `event_type` aimed at `target`
    pub fn new(event_type: &str, target: EventTarget) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            bubbles: true,
            cancelable: true,
            timestamp: 0.0,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    /// Prevent default action
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop propagation
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Check if default was prevented
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Check if propagation was stopped
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Check if immediate propagation was stopped
    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }
}

impl HostEvent for DomEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn stop_immediate_propagation(&mut self) {
        self.immediate_propagation_stopped = true;
        self.propagation_stopped = true;
    }
}

/// Host-level listener subscriptions
#[derive(Debug, Default)]
pub struct EventListenerRegistry {
    /// Map of target -> event type -> subscription count per options
    listeners: HashMap<EventTarget, HashMap<String, HashMap<ListenerOptions, usize>>>,
}

impl EventListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total subscriptions for a target and event type
    pub fn listener_count(&self, target: EventTarget, event_type: &str) -> usize {
        self.listeners
            .get(&target)
            .and_then(|types| types.get(event_type))
            .map(|by_options| by_options.values().sum())
            .unwrap_or(0)
    }

    /// Check for a subscription with exactly these options
    pub fn has_listener(&self, target: EventTarget, event_type: &str, options: ListenerOptions) -> bool {
        self.listeners
            .get(&target)
            .and_then(|types| types.get(event_type))
            .is_some_and(|by_options| by_options.contains_key(&options))
    }

    /// Clear all listeners for a target
    pub fn clear_target(&mut self, target: EventTarget) {
        self.listeners.remove(&target);
    }
}

impl EventHost for EventListenerRegistry {
    fn add_event_listener(&mut self, target: EventTarget, event_name: &str, options: ListenerOptions) {
        *self.listeners
            .entry(target)
            .or_default()
            .entry(event_name.to_string())
            .or_default()
            .entry(options)
            .or_default() += 1;
    }

    fn remove_event_listener(&mut self, target: EventTarget, event_name: &str, options: ListenerOptions) {
        let Some(types) = self.listeners.get_mut(&target) else {
            return;
        };
        let Some(by_options) = types.get_mut(event_name) else {
            return;
        };
        if let Some(count) = by_options.get_mut(&options) {
            *count -= 1;
            if *count == 0 {
                by_options.remove(&options);
            }
        }
        if by_options.is_empty() {
            types.remove(event_name);
        }
        if types.is_empty() {
            self.listeners.remove(&target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_immediate_propagation() {
        let mut event = DomEvent::new("click", EventTarget::Document);
        assert!(!event.is_immediate_propagation_stopped());

        event.stop_immediate_propagation();

        assert!(event.is_immediate_propagation_stopped());
        assert!(event.is_propagation_stopped());
        assert_eq!(HostEvent::event_type(&event), "click");
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let mut event = DomEvent::new("scroll", EventTarget::Window);
        event.cancelable = false;
        event.prevent_default();
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_registry_counts() {
        let mut registry = EventListenerRegistry::new();
        let target = EventTarget::Element(NodeId(3));
        let capture = ListenerOptions { capture: true, ..Default::default() };

        registry.add_event_listener(target, "click", ListenerOptions::default());
        registry.add_event_listener(target, "click", capture);
        assert_eq!(registry.listener_count(target, "click"), 2);
        assert!(registry.has_listener(target, "click", capture));

        registry.remove_event_listener(target, "click", capture);
        registry.remove_event_listener(target, "click", capture);
        assert_eq!(registry.listener_count(target, "click"), 1);
        assert!(!registry.has_listener(target, "click", capture));

        registry.remove_event_listener(target, "click", ListenerOptions::default());
        assert_eq!(registry.listener_count(target, "click"), 0);
    }
}
