//! Value List Observer
//!
//! Maps each matched token to a delegate-parsed value. The value parsed when
//! a token matched is the one reported when it unmatches.

use std::collections::HashMap;
use std::fmt;

use fos_dom::{MutationRecord, MutationSource, NodeId, TreeView};

use crate::ObserverError;
use crate::token::Token;
use crate::token_list_observer::{TokenListObserver, TokenListObserverDelegate};

/// Token parsing and per-value callbacks
pub trait ValueListObserverDelegate {
    type Value;

    /// Parse a token; `None` means the token carries no value
    fn parse_value_for_token(&mut self, tree: &dyn TreeView, token: &Token) -> Option<Self::Value>;

    fn element_matched_value(&mut self, tree: &dyn TreeView, element: NodeId, value: &Self::Value);

    fn element_unmatched_value(&mut self, tree: &dyn TreeView, element: NodeId, value: &Self::Value);
}

struct ValueTracker<D: ValueListObserverDelegate> {
    delegate: D,
    values_by_token_by_element: HashMap<NodeId, HashMap<Token, D::Value>>,
}

impl<D: ValueListObserverDelegate> TokenListObserverDelegate for ValueTracker<D> {
    fn token_matched(&mut self, tree: &dyn TreeView, token: &Token) {
        let Some(value) = self.delegate.parse_value_for_token(tree, token) else {
            return;
        };

        let values = self.values_by_token_by_element.entry(token.element).or_default();
        let value = values.entry(token.clone()).insert_entry(value).into_mut();
        self.delegate.element_matched_value(tree, token.element, value);
    }

    fn token_unmatched(&mut self, tree: &dyn TreeView, token: &Token) {
        let Some(values) = self.values_by_token_by_element.get_mut(&token.element) else {
            return;
        };
        let Some(value) = values.remove(token) else {
            return;
        };
        if values.is_empty() {
            self.values_by_token_by_element.remove(&token.element);
        }
        self.delegate.element_unmatched_value(tree, token.element, &value);
    }
}

/// Observes the parsed values of one attribute's token list
pub struct ValueListObserver<D: ValueListObserverDelegate> {
    token_list_observer: TokenListObserver<ValueTracker<D>>,
}

impl<D: ValueListObserverDelegate + fmt::Debug> fmt::Debug for ValueListObserver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueListObserver")
            .field("element", &self.element())
            .field("attribute_name", &self.attribute_name())
            .field("started", &self.is_started())
            .field("delegate", self.delegate())
            .finish()
    }
}

impl<D: ValueListObserverDelegate> ValueListObserver<D> {
    pub fn new(element: NodeId, attribute_name: &str, delegate: D) -> Result<Self, ObserverError> {
        let tracker = ValueTracker {
            delegate,
            values_by_token_by_element: HashMap::new(),
        };
        Ok(Self {
            token_list_observer: TokenListObserver::new(element, attribute_name, tracker)?,
        })
    }

    pub fn element(&self) -> NodeId {
        self.token_list_observer.element()
    }

    pub fn attribute_name(&self) -> &str {
        self.token_list_observer.attribute_name()
    }

    pub fn is_started(&self) -> bool {
        self.token_list_observer.is_started()
    }

    /// Values currently matched for `element`, in token order
    pub fn values_for_element(&self, element: NodeId) -> Vec<&D::Value> {
        let tracker = self.token_list_observer.delegate();
        let Some(values) = tracker.values_by_token_by_element.get(&element) else {
            return Vec::new();
        };
        self.token_list_observer.tokens_for_element(element)
            .iter()
            .filter_map(|token| values.get(token))
            .collect()
    }

    pub fn delegate(&self) -> &D {
        &self.token_list_observer.delegate().delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.token_list_observer.delegate_mut().delegate
    }

    pub fn start<T: MutationSource>(&mut self, tree: &mut T) {
        self.token_list_observer.start(tree);
    }

    pub fn stop<T: MutationSource>(&mut self, tree: &mut T) {
        self.token_list_observer.stop(tree);
    }

    pub fn pause<T: MutationSource, R>(&mut self, tree: &mut T, callback: impl FnOnce(&mut T) -> R) -> R {
        self.token_list_observer.pause(tree, callback)
    }

    pub fn flush<T: MutationSource>(&mut self, tree: &mut T) {
        self.token_list_observer.flush(tree);
    }

    pub fn refresh(&mut self, tree: &dyn TreeView) {
        self.token_list_observer.refresh(tree);
    }

    pub fn process_mutations(&mut self, tree: &dyn TreeView, mutations: &[MutationRecord]) {
        self.token_list_observer.process_mutations(tree, mutations);
    }
}
