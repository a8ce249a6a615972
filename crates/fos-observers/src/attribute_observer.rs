//! Attribute Observer
//!
//! Element observer specialized to "carries attribute X".

use fos_dom::{MutationRecord, MutationSource, NodeId, TreeView};

use crate::ObserverError;
use crate::element_observer::{ElementObserver, ElementObserverDelegate};

/// Callbacks for elements gaining, changing or losing one attribute
pub trait AttributeObserverDelegate {
    fn element_matched_attribute(&mut self, _tree: &dyn TreeView, _element: NodeId, _attribute_name: &str) {}

    fn element_attribute_value_changed(&mut self, _tree: &dyn TreeView, _element: NodeId, _attribute_name: &str) {}

    fn element_unmatched_attribute(&mut self, _tree: &dyn TreeView, _element: NodeId, _attribute_name: &str) {}
}

/// Presence predicate fed to the element observer
#[derive(Debug)]
struct AttributeMatcher<D> {
    attribute_name: String,
    delegate: D,
}

impl<D: AttributeObserverDelegate> ElementObserverDelegate for AttributeMatcher<D> {
    fn match_element(&self, tree: &dyn TreeView, element: NodeId) -> bool {
        tree.has_attribute(element, &self.attribute_name)
    }

    fn match_elements_in_tree(&self, tree: &dyn TreeView, root: NodeId) -> Vec<NodeId> {
        let mut matches = Vec::new();
        if tree.is_element(root) && self.match_element(tree, root) {
            matches.push(root);
        }
        matches.extend(
            tree.descendant_elements(root)
                .into_iter()
                .filter(|&element| self.match_element(tree, element)),
        );
        matches
    }

    fn element_matched(&mut self, tree: &dyn TreeView, element: NodeId) {
        self.delegate.element_matched_attribute(tree, element, &self.attribute_name);
    }

    fn element_unmatched(&mut self, tree: &dyn TreeView, element: NodeId) {
        self.delegate.element_unmatched_attribute(tree, element, &self.attribute_name);
    }

    fn element_attribute_changed(&mut self, tree: &dyn TreeView, element: NodeId, attribute_name: &str) {
        if self.attribute_name == attribute_name {
            self.delegate.element_attribute_value_changed(tree, element, attribute_name);
        }
    }
}

/// Tracks elements under a root carrying `attribute_name`
#[derive(Debug)]
pub struct AttributeObserver<D> {
    element_observer: ElementObserver<AttributeMatcher<D>>,
}

impl<D: AttributeObserverDelegate> AttributeObserver<D> {
    /// Fails for names that can never appear on an element
    pub fn new(element: NodeId, attribute_name: &str, delegate: D) -> Result<Self, ObserverError> {
        if attribute_name.is_empty() || attribute_name.contains(char::is_whitespace) {
            return Err(ObserverError::InvalidAttributeName(attribute_name.to_string()));
        }

        let matcher = AttributeMatcher {
            attribute_name: attribute_name.to_string(),
            delegate,
        };
        Ok(Self {
            element_observer: ElementObserver::new(element, matcher),
        })
    }

    pub fn element(&self) -> NodeId {
        self.element_observer.element()
    }

    pub fn attribute_name(&self) -> &str {
        &self.element_observer.delegate().attribute_name
    }

    /// Selector equivalent of the predicate
    pub fn selector(&self) -> String {
        format!("[{}]", self.attribute_name())
    }

    pub fn is_started(&self) -> bool {
        self.element_observer.is_started()
    }

    /// Elements currently carrying the attribute
    pub fn elements(&self) -> &[NodeId] {
        self.element_observer.elements()
    }

    pub fn delegate(&self) -> &D {
        &self.element_observer.delegate().delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.element_observer.delegate_mut().delegate
    }

    pub fn start<T: MutationSource>(&mut self, tree: &mut T) {
        self.element_observer.start(tree);
    }

    pub fn stop<T: MutationSource>(&mut self, tree: &mut T) {
        self.element_observer.stop(tree);
    }

    pub fn pause<T: MutationSource, R>(&mut self, tree: &mut T, callback: impl FnOnce(&mut T) -> R) -> R {
        self.element_observer.pause(tree, callback)
    }

    pub fn flush<T: MutationSource>(&mut self, tree: &mut T) {
        self.element_observer.flush(tree);
    }

    pub fn refresh(&mut self, tree: &dyn TreeView) {
        self.element_observer.refresh(tree);
    }

    pub fn process_mutations(&mut self, tree: &dyn TreeView, mutations: &[MutationRecord]) {
        self.element_observer.process_mutations(tree, mutations);
    }
}
