//! Controller errors and reporting

use fos_dom::NodeId;
use fos_observers::ObserverError;

/// Controller layer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("Failed to create scope {identifier:?}: {message}")]
    ScopeCreation { identifier: String, message: String },

    #[error("Lifecycle callback failed for {identifier:?}: {message}")]
    Lifecycle { identifier: String, message: String },

    #[error("Observer error: {0}")]
    Observer(#[from] ObserverError),
}

/// Context attached to a reported error
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    pub identifier: Option<String>,
    pub element: Option<NodeId>,
}

/// Sink for errors that must not unwind observer bookkeeping
pub trait ErrorHandler {
    fn handle_error(&mut self, error: &ControllerError, message: &str, detail: &ErrorDetail) {
        tracing::error!(
            "Error {}: {} (identifier: {:?}, element: {:?})",
            message,
            error,
            detail.identifier,
            detail.element
        );
    }
}
