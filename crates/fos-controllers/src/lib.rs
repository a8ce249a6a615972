//! fOS Controllers
//!
//! Controller scope lifecycle and event binding dispatch.
//!
//! `ScopeObserver` turns the controller attribute's identifier tokens into
//! reference-counted scopes. `Dispatcher` multiplexes host events onto
//! ordered bindings.

mod config;
mod error;
mod scope_observer;
mod binding;
mod event_listener;
mod dispatcher;

pub use config::Schema;
pub use error::{ControllerError, ErrorDetail, ErrorHandler};
pub use scope_observer::{ScopeKey, ScopeObserver, ScopeObserverDelegate};
pub use binding::Binding;
pub use event_listener::{DispatchedEvent, EventListener};
pub use dispatcher::Dispatcher;
