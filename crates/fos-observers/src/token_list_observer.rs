//! Token List Observer
//!
//! Turns attribute value changes into per-token matched/unmatched events.
//!
//! On a value change the previous and current token sequences are compared
//! position by position. Everything from the first differing position on is
//! unmatched (old) and matched (new); the common prefix fires nothing.

use fos_dom::{MutationRecord, MutationSource, NodeId, TreeView};

use crate::ObserverError;
use crate::attribute_observer::{AttributeObserver, AttributeObserverDelegate};
use crate::multimap::Multimap;
use crate::token::{Token, parse_token_string};

/// Per-token callbacks
pub trait TokenListObserverDelegate {
    fn token_matched(&mut self, tree: &dyn TreeView, token: &Token);

    fn token_unmatched(&mut self, tree: &dyn TreeView, token: &Token);
}

/// Remembers the tokens reported for each element
#[derive(Debug)]
struct TokenTracker<D> {
    delegate: D,
    tokens_by_element: Multimap<NodeId, Token>,
}

impl<D: TokenListObserverDelegate> TokenTracker<D> {
    fn tokens_matched(&mut self, tree: &dyn TreeView, tokens: Vec<Token>) {
        for token in tokens {
            self.tokens_by_element.add(token.element, token.clone());
            tracing::trace!("Token matched: {:?} {:?}[{}]", token.element, token.content, token.index);
            self.delegate.token_matched(tree, &token);
        }
    }

    fn tokens_unmatched(&mut self, tree: &dyn TreeView, tokens: Vec<Token>) {
        for token in tokens {
            self.tokens_by_element.delete(&token.element, &token);
            tracing::trace!("Token unmatched: {:?} {:?}[{}]", token.element, token.content, token.index);
            self.delegate.token_unmatched(tree, &token);
        }
    }

    /// (unmatched, matched) since the last recorded tokens
    fn refresh_tokens_for_element(
        &self,
        tree: &dyn TreeView,
        element: NodeId,
        attribute_name: &str,
    ) -> (Vec<Token>, Vec<Token>) {
        let mut previous_tokens = self.tokens_by_element.get_values_for_key(&element).to_vec();
        let mut current_tokens = read_tokens_for_element(tree, element, attribute_name);

        let length = previous_tokens.len().max(current_tokens.len());
        let first_differing_index = (0..length)
            .find(|&index| previous_tokens.get(index) != current_tokens.get(index));

        match first_differing_index {
            None => (Vec::new(), Vec::new()),
            Some(index) => (previous_tokens.split_off(index), current_tokens.split_off(index)),
        }
    }
}

impl<D: TokenListObserverDelegate> AttributeObserverDelegate for TokenTracker<D> {
    fn element_matched_attribute(&mut self, tree: &dyn TreeView, element: NodeId, attribute_name: &str) {
        let tokens = read_tokens_for_element(tree, element, attribute_name);
        self.tokens_matched(tree, tokens);
    }

    fn element_attribute_value_changed(&mut self, tree: &dyn TreeView, element: NodeId, attribute_name: &str) {
        let (unmatched_tokens, matched_tokens) = self.refresh_tokens_for_element(tree, element, attribute_name);
        self.tokens_unmatched(tree, unmatched_tokens);
        self.tokens_matched(tree, matched_tokens);
    }

    fn element_unmatched_attribute(&mut self, tree: &dyn TreeView, element: NodeId, _attribute_name: &str) {
        let tokens = self.tokens_by_element.get_values_for_key(&element).to_vec();
        self.tokens_unmatched(tree, tokens);
    }
}

fn read_tokens_for_element(tree: &dyn TreeView, element: NodeId, attribute_name: &str) -> Vec<Token> {
    let token_string = tree.get_attribute(element, attribute_name).unwrap_or("");
    parse_token_string(token_string, element, attribute_name)
}

/// Observes the token list of one attribute under a root
#[derive(Debug)]
pub struct TokenListObserver<D> {
    attribute_observer: AttributeObserver<TokenTracker<D>>,
}

impl<D: TokenListObserverDelegate> TokenListObserver<D> {
    pub fn new(element: NodeId, attribute_name: &str, delegate: D) -> Result<Self, ObserverError> {
        let tracker = TokenTracker {
            delegate,
            tokens_by_element: Multimap::new(),
        };
        Ok(Self {
            attribute_observer: AttributeObserver::new(element, attribute_name, tracker)?,
        })
    }

    pub fn element(&self) -> NodeId {
        self.attribute_observer.element()
    }

    pub fn attribute_name(&self) -> &str {
        self.attribute_observer.attribute_name()
    }

    pub fn is_started(&self) -> bool {
        self.attribute_observer.is_started()
    }

    /// Tokens currently matched for `element`, in index order
    pub fn tokens_for_element(&self, element: NodeId) -> &[Token] {
        self.attribute_observer.delegate().tokens_by_element.get_values_for_key(&element)
    }

    pub fn delegate(&self) -> &D {
        &self.attribute_observer.delegate().delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.attribute_observer.delegate_mut().delegate
    }

    pub fn start<T: MutationSource>(&mut self, tree: &mut T) {
        self.attribute_observer.start(tree);
    }

    pub fn stop<T: MutationSource>(&mut self, tree: &mut T) {
        self.attribute_observer.stop(tree);
    }

    pub fn pause<T: MutationSource, R>(&mut self, tree: &mut T, callback: impl FnOnce(&mut T) -> R) -> R {
        self.attribute_observer.pause(tree, callback)
    }

    pub fn flush<T: MutationSource>(&mut self, tree: &mut T) {
        self.attribute_observer.flush(tree);
    }

    pub fn refresh(&mut self, tree: &dyn TreeView) {
        self.attribute_observer.refresh(tree);
    }

    pub fn process_mutations(&mut self, tree: &dyn TreeView, mutations: &[MutationRecord]) {
        self.attribute_observer.process_mutations(tree, mutations);
    }
}
