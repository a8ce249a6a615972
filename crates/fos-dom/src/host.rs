//! Host traits
//!
//! What the observer chain and event dispatcher need from the environment
//! they run in. `DomTree`, `DomEvent` and `EventListenerRegistry` are the
//! in-crate implementations; embedders can supply their own.

use crate::{MutationObserverInit, MutationRecord, NodeId, ObserverId};
use crate::dom_events::{EventTarget, ListenerOptions};

/// Read-only view of a host tree
pub trait TreeView {
    /// Check if the node is an element
    fn is_element(&self, node: NodeId) -> bool;

    /// Read an attribute value
    fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str>;

    /// Check attribute presence
    fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.get_attribute(element, name).is_some()
    }

    /// Descendant elements of `root` in document order, `root` excluded
    fn descendant_elements(&self, root: NodeId) -> Vec<NodeId>;

    /// Inclusive containment
    fn contains(&self, root: NodeId, node: NodeId) -> bool;

    /// Check if the node is attached to the document
    fn is_connected(&self, node: NodeId) -> bool;
}

/// Source of batched mutation records
pub trait MutationSource: TreeView {
    /// Start recording mutations under `target`
    fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId;

    /// Stop recording; pending records are dropped
    fn disconnect(&mut self, id: ObserverId);

    /// Take the pending batch
    fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord>;
}

/// Host-level event subscriptions
pub trait EventHost {
    fn add_event_listener(&mut self, target: EventTarget, event_name: &str, options: ListenerOptions);

    fn remove_event_listener(&mut self, target: EventTarget, event_name: &str, options: ListenerOptions);
}

/// Event object delivered by the host
pub trait HostEvent {
    /// Get event type name
    fn event_type(&self) -> &str;

    /// Stop immediate propagation at the host level
    fn stop_immediate_propagation(&mut self);
}
