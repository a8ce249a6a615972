//! Event bindings

use fos_dom::{EventTarget, ListenerOptions};

use crate::event_listener::DispatchedEvent;

/// A handler attached to one (target, event name, options) triple
///
/// Bindings are shared through `Rc`; handlers needing state use interior
/// mutability.
pub trait Binding<E> {
    /// Ordering key among bindings of the same listener
    fn index(&self) -> usize;

    fn event_target(&self) -> EventTarget;

    fn event_name(&self) -> &str;

    fn event_options(&self) -> ListenerOptions {
        ListenerOptions::default()
    }

    fn handle_event(&self, event: &mut DispatchedEvent<E>);
}
