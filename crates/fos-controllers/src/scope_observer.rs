//! Scope Observer
//!
//! Turns controller identifier tokens into reference-counted scopes.
//!
//! A scope is created at most once per (element, identifier) and connected
//! while at least one matched token refers to it. Repeated identifiers on the
//! same element share the scope and its count.

use std::collections::HashMap;
use std::fmt;

use fos_dom::{MutationRecord, MutationSource, NodeId, TreeView};
use fos_observers::{Token, ValueListObserver, ValueListObserverDelegate};

use crate::config::Schema;
use crate::error::{ControllerError, ErrorDetail, ErrorHandler};

/// Scope factory and lifecycle callbacks
pub trait ScopeObserverDelegate: ErrorHandler {
    type Scope;

    /// `Ok(None)` refuses the identifier
    fn create_scope_for_element_and_identifier(
        &mut self,
        tree: &dyn TreeView,
        element: NodeId,
        identifier: &str,
    ) -> Result<Option<Self::Scope>, ControllerError>;

    fn scope_connected(&mut self, tree: &dyn TreeView, scope: &Self::Scope) -> Result<(), ControllerError>;

    fn scope_disconnected(&mut self, tree: &dyn TreeView, scope: &Self::Scope) -> Result<(), ControllerError>;
}

/// Identity of a scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub element: NodeId,
    pub identifier: String,
}

struct ScopeTracker<D: ScopeObserverDelegate> {
    delegate: D,
    scopes_by_identifier_by_element: HashMap<NodeId, HashMap<String, D::Scope>>,
    scope_reference_counts: HashMap<ScopeKey, usize>,
}

impl<D: ScopeObserverDelegate> ScopeTracker<D> {
    fn has_scope(&self, key: &ScopeKey) -> bool {
        self.scopes_by_identifier_by_element
            .get(&key.element)
            .is_some_and(|scopes| scopes.contains_key(&key.identifier))
    }

    fn report(&mut self, error: &ControllerError, message: &str, key: &ScopeKey) {
        let detail = ErrorDetail {
            identifier: Some(key.identifier.clone()),
            element: Some(key.element),
        };
        self.delegate.handle_error(error, message, &detail);
    }
}

impl<D: ScopeObserverDelegate> ValueListObserverDelegate for ScopeTracker<D> {
    type Value = ScopeKey;

    fn parse_value_for_token(&mut self, tree: &dyn TreeView, token: &Token) -> Option<ScopeKey> {
        let key = ScopeKey {
            element: token.element,
            identifier: token.content.clone(),
        };
        if self.has_scope(&key) {
            return Some(key);
        }

        match self.delegate.create_scope_for_element_and_identifier(tree, key.element, &key.identifier) {
            Ok(Some(scope)) => {
                self.scopes_by_identifier_by_element
                    .entry(key.element)
                    .or_default()
                    .insert(key.identifier.clone(), scope);
                Some(key)
            }
            Ok(None) => None,
            Err(error) => {
                self.report(&error, "creating scope", &key);
                None
            }
        }
    }

    fn element_matched_value(&mut self, tree: &dyn TreeView, _element: NodeId, key: &ScopeKey) {
        let count = self.scope_reference_counts.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count != 1 {
            return;
        }

        tracing::trace!("Scope connected: {:?} {:?}", key.element, key.identifier);
        let scope = self.scopes_by_identifier_by_element
            .get(&key.element)
            .and_then(|scopes| scopes.get(&key.identifier));
        let result = match scope {
            Some(scope) => self.delegate.scope_connected(tree, scope),
            None => Ok(()),
        };
        if let Err(error) = result {
            self.report(&error, "connecting scope", key);
        }
    }

    fn element_unmatched_value(&mut self, tree: &dyn TreeView, _element: NodeId, key: &ScopeKey) {
        let Some(count) = self.scope_reference_counts.get_mut(key) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        self.scope_reference_counts.remove(key);

        tracing::trace!("Scope disconnected: {:?} {:?}", key.element, key.identifier);
        let scope = self.scopes_by_identifier_by_element
            .get(&key.element)
            .and_then(|scopes| scopes.get(&key.identifier));
        let result = match scope {
            Some(scope) => self.delegate.scope_disconnected(tree, scope),
            None => Ok(()),
        };
        if let Err(error) = result {
            self.report(&error, "disconnecting scope", key);
        }
    }
}

/// Observes controller identifiers under a root
///
/// Memoized scopes outlive their connection so that an element moved out of
/// and back into the tree gets its scope back. They are only forgotten through
/// `release_element`, which the embedder calls once the host destroys the
/// element; until then the memo grows with every (element, identifier) seen.
pub struct ScopeObserver<D: ScopeObserverDelegate> {
    value_list_observer: ValueListObserver<ScopeTracker<D>>,
}

impl<D: ScopeObserverDelegate + fmt::Debug> fmt::Debug for ScopeObserver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracker = self.value_list_observer.delegate();
        f.debug_struct("ScopeObserver")
            .field("element", &self.element())
            .field("controller_attribute", &self.controller_attribute())
            .field("started", &self.is_started())
            .field("connected_scopes", &tracker.scope_reference_counts.len())
            .field("delegate", &tracker.delegate)
            .finish()
    }
}

impl<D: ScopeObserverDelegate> ScopeObserver<D> {
    pub fn new(element: NodeId, schema: &Schema, delegate: D) -> Result<Self, ControllerError> {
        let tracker = ScopeTracker {
            delegate,
            scopes_by_identifier_by_element: HashMap::new(),
            scope_reference_counts: HashMap::new(),
        };
        Ok(Self {
            value_list_observer: ValueListObserver::new(element, &schema.controller_attribute, tracker)?,
        })
    }

    pub fn element(&self) -> NodeId {
        self.value_list_observer.element()
    }

    pub fn controller_attribute(&self) -> &str {
        self.value_list_observer.attribute_name()
    }

    pub fn is_started(&self) -> bool {
        self.value_list_observer.is_started()
    }

    pub fn delegate(&self) -> &D {
        &self.value_list_observer.delegate().delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.value_list_observer.delegate_mut().delegate
    }

    /// Matched tokens currently referring to the scope
    pub fn reference_count(&self, element: NodeId, identifier: &str) -> usize {
        let key = ScopeKey {
            element,
            identifier: identifier.to_string(),
        };
        self.value_list_observer.delegate().scope_reference_counts.get(&key).copied().unwrap_or(0)
    }

    /// Memoized scope, connected or not
    pub fn scope_for(&self, element: NodeId, identifier: &str) -> Option<&D::Scope> {
        self.value_list_observer.delegate()
            .scopes_by_identifier_by_element
            .get(&element)
            .and_then(|scopes| scopes.get(identifier))
    }

    /// Forget memoized scopes of a destroyed element
    ///
    /// Scopes still referenced by a matched token are kept.
    pub fn release_element(&mut self, element: NodeId) {
        let tracker = self.value_list_observer.delegate_mut();
        let counts = &tracker.scope_reference_counts;
        let Some(scopes) = tracker.scopes_by_identifier_by_element.get_mut(&element) else {
            return;
        };

        scopes.retain(|identifier, _| {
            counts.contains_key(&ScopeKey {
                element,
                identifier: identifier.clone(),
            })
        });
        if scopes.is_empty() {
            tracker.scopes_by_identifier_by_element.remove(&element);
        }
    }

    pub fn start<T: MutationSource>(&mut self, tree: &mut T) {
        self.value_list_observer.start(tree);
    }

    pub fn stop<T: MutationSource>(&mut self, tree: &mut T) {
        self.value_list_observer.stop(tree);
    }

    pub fn pause<T: MutationSource, R>(&mut self, tree: &mut T, callback: impl FnOnce(&mut T) -> R) -> R {
        self.value_list_observer.pause(tree, callback)
    }

    pub fn flush<T: MutationSource>(&mut self, tree: &mut T) {
        self.value_list_observer.flush(tree);
    }

    pub fn refresh(&mut self, tree: &dyn TreeView) {
        self.value_list_observer.refresh(tree);
    }

    pub fn process_mutations(&mut self, tree: &dyn TreeView, mutations: &[MutationRecord]) {
        self.value_list_observer.process_mutations(tree, mutations);
    }
}
