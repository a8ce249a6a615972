//! Element Observer
//!
//! Maintains the set of elements under a root that satisfy a delegate
//! predicate, reconciling it against batches of mutation records.

use std::collections::HashSet;

use fos_dom::{MutationObserverInit, MutationRecord, MutationSource, MutationType, NodeId, ObserverId, TreeView};

/// Predicate and callbacks driving an `ElementObserver`
pub trait ElementObserverDelegate {
    /// Check if a single element matches
    fn match_element(&self, tree: &dyn TreeView, element: NodeId) -> bool;

    /// All matching elements in the subtree rooted at `root`, root included
    fn match_elements_in_tree(&self, tree: &dyn TreeView, root: NodeId) -> Vec<NodeId>;

    fn element_matched(&mut self, _tree: &dyn TreeView, _element: NodeId) {}

    fn element_unmatched(&mut self, _tree: &dyn TreeView, _element: NodeId) {}

    /// A tracked element changed an attribute and still matches
    fn element_attribute_changed(&mut self, _tree: &dyn TreeView, _element: NodeId, _attribute_name: &str) {}
}

/// Tracks matching elements beneath one root
#[derive(Debug)]
pub struct ElementObserver<D> {
    element: NodeId,
    delegate: D,
    /// Tracked elements in insertion order
    elements: Vec<NodeId>,
    tracked: HashSet<NodeId>,
    observation: Option<ObserverId>,
}

impl<D: ElementObserverDelegate> ElementObserver<D> {
    pub fn new(element: NodeId, delegate: D) -> Self {
        Self {
            element,
            delegate,
            elements: Vec::new(),
            tracked: HashSet::new(),
            observation: None,
        }
    }

    fn observer_init() -> MutationObserverInit {
        MutationObserverInit {
            attributes: true,
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }

    /// Observed root
    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn is_started(&self) -> bool {
        self.observation.is_some()
    }

    /// Tracked elements in the order they matched
    pub fn elements(&self) -> &[NodeId] {
        &self.elements
    }

    /// Check if an element is currently tracked
    pub fn is_tracking(&self, element: NodeId) -> bool {
        self.tracked.contains(&element)
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    /// Begin observing and match the current tree
    pub fn start<T: MutationSource>(&mut self, tree: &mut T) {
        if self.observation.is_none() {
            self.observation = Some(tree.observe(self.element, Self::observer_init()));
            tracing::debug!("Element observer started on {:?}", self.element);
            self.refresh(&*tree);
        }
    }

    /// Stop observing; pending records are discarded
    pub fn stop<T: MutationSource>(&mut self, tree: &mut T) {
        if let Some(id) = self.observation.take() {
            let discarded = tree.take_records(id);
            tree.disconnect(id);
            tracing::debug!(
                "Element observer stopped on {:?} ({} pending records discarded)",
                self.element,
                discarded.len()
            );
        }
    }

    /// Run `callback` with observation detached
    ///
    /// Records already pending are processed first. Nothing `callback` does to
    /// the tree is ever observed.
    pub fn pause<T: MutationSource, R>(&mut self, tree: &mut T, callback: impl FnOnce(&mut T) -> R) -> R {
        let Some(id) = self.observation else {
            return callback(tree);
        };

        let pending = tree.take_records(id);
        self.process_mutations(&*tree, &pending);
        tree.disconnect(id);
        self.observation = None;

        let result = callback(tree);

        self.observation = Some(tree.observe(self.element, Self::observer_init()));
        tracing::debug!("Element observer resumed on {:?}", self.element);
        result
    }

    /// Take the pending batch from the source and process it
    pub fn flush<T: MutationSource>(&mut self, tree: &mut T) {
        if let Some(id) = self.observation {
            let records = tree.take_records(id);
            self.process_mutations(&*tree, &records);
        }
    }

    /// Reconcile the tracked set against a full scan of the root
    pub fn refresh(&mut self, tree: &dyn TreeView) {
        if !self.is_started() {
            return;
        }

        let matches = self.delegate.match_elements_in_tree(tree, self.element);
        let matched: HashSet<NodeId> = matches.iter().copied().collect();

        for element in self.elements.clone() {
            if !matched.contains(&element) {
                self.remove_element(tree, element);
            }
        }

        for element in matches {
            self.add_element(tree, element);
        }
    }

    // Mutation record processing

    /// Process one batch of records in delivery order
    pub fn process_mutations(&mut self, tree: &dyn TreeView, mutations: &[MutationRecord]) {
        if self.is_started() {
            for mutation in mutations {
                self.process_mutation(tree, mutation);
            }
        }
    }

    fn process_mutation(&mut self, tree: &dyn TreeView, mutation: &MutationRecord) {
        match mutation.mutation_type {
            MutationType::Attributes => {
                if let Some(name) = &mutation.attribute_name {
                    self.process_attribute_change(tree, mutation.target, name);
                }
            }
            MutationType::ChildList => {
                self.process_removed_nodes(tree, &mutation.removed_nodes);
                self.process_added_nodes(tree, &mutation.added_nodes);
            }
            MutationType::CharacterData => {}
        }
    }

    fn process_attribute_change(&mut self, tree: &dyn TreeView, element: NodeId, attribute_name: &str) {
        if !tree.is_element(element) {
            return;
        }

        if self.tracked.contains(&element) {
            if self.delegate.match_element(tree, element) {
                self.delegate.element_attribute_changed(tree, element, attribute_name);
            } else {
                self.remove_element(tree, element);
            }
        } else if self.delegate.match_element(tree, element) {
            self.add_element(tree, element);
        }
    }

    fn process_removed_nodes(&mut self, tree: &dyn TreeView, nodes: &[NodeId]) {
        for &node in nodes {
            if !tree.is_element(node) {
                continue;
            }

            for element in self.delegate.match_elements_in_tree(tree, node) {
                self.remove_element(tree, element);
            }

            // Elements that stopped matching after they left the tree
            let stale: Vec<NodeId> = self.elements.iter()
                .copied()
                .filter(|&element| tree.contains(node, element))
                .collect();
            for element in stale {
                self.remove_element(tree, element);
            }
        }
    }

    fn process_added_nodes(&mut self, tree: &dyn TreeView, nodes: &[NodeId]) {
        for &node in nodes {
            if tree.is_element(node) && self.element_is_active(tree, node) {
                for element in self.delegate.match_elements_in_tree(tree, node) {
                    self.add_element(tree, element);
                }
            }
        }
    }

    // Element tracking

    fn element_is_active(&self, tree: &dyn TreeView, element: NodeId) -> bool {
        tree.is_connected(element) == tree.is_connected(self.element)
            && tree.contains(self.element, element)
    }

    fn add_element(&mut self, tree: &dyn TreeView, element: NodeId) {
        if !self.tracked.contains(&element) && self.element_is_active(tree, element) {
            self.tracked.insert(element);
            self.elements.push(element);
            tracing::trace!("Element matched: {:?}", element);
            self.delegate.element_matched(tree, element);
        }
    }

    fn remove_element(&mut self, tree: &dyn TreeView, element: NodeId) {
        if self.tracked.remove(&element) {
            self.elements.retain(|&e| e != element);
            tracing::trace!("Element unmatched: {:?}", element);
            self.delegate.element_unmatched(tree, element);
        }
    }
}
