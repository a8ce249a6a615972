//! DOM Tree (arena-based allocation)
//!
//! Structural and attribute edits append mutation records for every
//! registered observation that covers the edited node.

use crate::{DomError, Node, NodeId};
use crate::host::{MutationSource, TreeView};
use crate::mutation::{MutationLog, MutationObserverInit, MutationRecord, ObserverId};

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
    mutations: MutationLog,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
            mutations: MutationLog::default(),
        }
    }

    /// Document node
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.push(Node::element(tag_name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.tag_name.as_str())
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).map(|n| n.parent).filter(|p| p.is_valid())
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let first = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        std::iter::successors(first.is_valid().then_some(first), move |&child| {
            let next = self.nodes[child.index()].next_sibling;
            next.is_valid().then_some(next)
        })
    }

    /// Inclusive ancestor chain, nearest first
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = id;
        while let Some(node) = self.get(current) {
            chain.push(current);
            current = node.parent;
        }
        chain
    }

    /// Elements carrying `name` under `root`: root first, then descendants
    pub fn query_by_attribute(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        std::iter::once(root)
            .chain(self.descendant_elements(root))
            .filter(|&id| self.has_attribute(id, name))
            .collect()
    }

    // Structural edits

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, NodeId::NONE)
    }

    /// Insert `child` before `reference` (NONE appends)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<(), DomError> {
        self.validate_insert(parent, child, reference).inspect_err(|err| {
            tracing::warn!("Rejected insertion: {}", err);
        })?;

        let mut reference = reference;
        if reference == child {
            reference = self.nodes[child.index()].next_sibling;
        }

        let old_parent = self.nodes[child.index()].parent;
        if old_parent.is_valid() {
            self.unlink_and_record(old_parent, child);
        }

        self.link(parent, child, reference);

        if !self.mutations.is_empty() {
            let node = &self.nodes[child.index()];
            let record = MutationRecord::child_list(parent, vec![child], Vec::new())
                .with_siblings(node.prev_sibling, node.next_sibling);
            self.record(record);
        }
        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let node = self.get(child).ok_or(DomError::NodeNotFound(child))?;
        if self.get(parent).is_none() {
            return Err(DomError::NodeNotFound(parent));
        }
        if node.parent != parent {
            tracing::warn!("Rejected removal of {:?} from {:?}", child, parent);
            return Err(DomError::NotAChild { parent, child });
        }

        self.unlink_and_record(parent, child);
        Ok(())
    }

    /// Remove `node` from its parent, if any
    pub fn detach(&mut self, node: NodeId) -> Result<(), DomError> {
        match self.get(node) {
            None => Err(DomError::NodeNotFound(node)),
            Some(n) if n.parent.is_valid() => {
                let parent = n.parent;
                self.remove_child(parent, node)
            }
            Some(_) => Ok(()),
        }
    }

    fn validate_insert(&self, parent: NodeId, child: NodeId, reference: NodeId) -> Result<(), DomError> {
        let parent_node = self.get(parent).ok_or(DomError::NodeNotFound(parent))?;
        if self.get(child).is_none() {
            return Err(DomError::NodeNotFound(child));
        }

        if parent_node.as_text().is_some() || child == NodeId::ROOT || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }

        if reference.is_valid() {
            let reference_node = self.get(reference).ok_or(DomError::NodeNotFound(reference))?;
            if reference_node.parent != parent {
                return Err(DomError::NotAChild { parent, child: reference });
            }
        }
        Ok(())
    }

    fn unlink_and_record(&mut self, parent: NodeId, child: NodeId) {
        let (prev, next) = self.unlink(child);
        if !self.mutations.is_empty() {
            let record = MutationRecord::child_list(parent, Vec::new(), vec![child])
                .with_siblings(prev, next);
            self.record(record);
        }
    }

    fn unlink(&mut self, child: NodeId) -> (NodeId, NodeId) {
        let node = &mut self.nodes[child.index()];
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = next;
        } else {
            self.nodes[parent.index()].first_child = next;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = prev;
        } else {
            self.nodes[parent.index()].last_child = prev;
        }
        (prev, next)
    }

    fn link(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        let (prev, next) = if reference.is_valid() {
            (self.nodes[reference.index()].prev_sibling, reference)
        } else {
            (self.nodes[parent.index()].last_child, NodeId::NONE)
        };

        let node = &mut self.nodes[child.index()];
        node.parent = parent;
        node.prev_sibling = prev;
        node.next_sibling = next;

        if prev.is_valid() {
            self.nodes[prev.index()].next_sibling = child;
        } else {
            self.nodes[parent.index()].first_child = child;
        }
        if next.is_valid() {
            self.nodes[next.index()].prev_sibling = child;
        } else {
            self.nodes[parent.index()].last_child = child;
        }
    }

    // Attribute and text edits

    /// Set an attribute value
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let elem = self.element_mut(element)?;
        let old_value = elem.set_attr(name, value.to_string());
        if !self.mutations.is_empty() {
            self.record(MutationRecord::attributes(element, name, old_value));
        }
        Ok(())
    }

    /// Remove an attribute; records nothing if it was absent
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let old_value = self.element_mut(element)?.remove_attr(name);
        if old_value.is_some() && !self.mutations.is_empty() {
            self.record(MutationRecord::attributes(element, name, old_value.clone()));
        }
        Ok(old_value)
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, node: NodeId, content: &str) -> Result<(), DomError> {
        let entry = self.nodes.get_mut(node.index()).ok_or(DomError::NodeNotFound(node))?;
        let crate::NodeData::Text(text) = &mut entry.data else {
            return Err(DomError::NotText(node));
        };
        let old_value = std::mem::replace(text, content.to_string());
        if !self.mutations.is_empty() {
            self.record(MutationRecord::character_data(node, old_value));
        }
        Ok(())
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut crate::ElementData, DomError> {
        self.nodes.get_mut(id.index())
            .ok_or(DomError::NodeNotFound(id))?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(id))
    }

    fn record(&mut self, record: MutationRecord) {
        let ancestors = self.ancestors(record.target);
        self.mutations.record(&record, &ancestors);
    }
}

impl TreeView for DomTree {
    fn is_element(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(Node::is_element)
    }

    fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.get(element)?.as_element()?.get_attr(name)
    }

    fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();

        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
        }
        out
    }

    fn contains(&self, root: NodeId, node: NodeId) -> bool {
        if self.get(root).is_none() {
            return false;
        }
        let mut current = node;
        while let Some(n) = self.get(current) {
            if current == root {
                return true;
            }
            current = n.parent;
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.contains(NodeId::ROOT, node)
    }
}

impl MutationSource for DomTree {
    fn observe(&mut self, target: NodeId, options: MutationObserverInit) -> ObserverId {
        self.mutations.observe(target, options)
    }

    fn disconnect(&mut self, id: ObserverId) {
        self.mutations.disconnect(id);
    }

    fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.mutations.take_records(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MutationType;

    fn observe_all(tree: &mut DomTree) -> ObserverId {
        tree.observe(NodeId::ROOT, MutationObserverInit {
            child_list: true,
            attributes: true,
            character_data: true,
            subtree: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_append_and_document_order() {
        let mut tree = DomTree::new();
        let body = tree.create_element("body");
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let c = tree.create_element("span");
        let text = tree.create_text("hi");

        tree.append_child(NodeId::ROOT, body).unwrap();
        tree.append_child(body, a).unwrap();
        tree.append_child(a, c).unwrap();
        tree.append_child(body, text).unwrap();
        tree.insert_before(body, b, text).unwrap();

        assert_eq!(tree.descendant_elements(NodeId::ROOT), vec![body, a, c, b]);
        assert_eq!(tree.children(body).collect::<Vec<_>>(), vec![a, b, text]);
        assert!(tree.is_connected(c));
        assert!(tree.contains(body, c));
        assert!(!tree.contains(b, c));
    }

    #[test]
    fn test_detached_nodes_are_not_connected() {
        let mut tree = DomTree::new();
        let fragment = tree.create_element("div");
        let child = tree.create_element("p");
        tree.append_child(fragment, child).unwrap();

        assert!(!tree.is_connected(fragment));
        assert!(!tree.is_connected(child));
        assert!(tree.contains(fragment, child));
    }

    #[test]
    fn test_hierarchy_errors() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();

        assert_eq!(
            tree.append_child(inner, outer),
            Err(DomError::HierarchyRequest { parent: inner, child: outer })
        );
        assert_eq!(
            tree.remove_child(NodeId::ROOT, inner),
            Err(DomError::NotAChild { parent: NodeId::ROOT, child: inner })
        );
        assert!(tree.set_attribute(NodeId(99), "id", "x").is_err());
    }

    #[test]
    fn test_move_records_removal_then_addition() {
        let mut tree = DomTree::new();
        let left = tree.create_element("div");
        let right = tree.create_element("div");
        let item = tree.create_element("span");
        tree.append_child(NodeId::ROOT, left).unwrap();
        tree.append_child(NodeId::ROOT, right).unwrap();
        tree.append_child(left, item).unwrap();

        let id = observe_all(&mut tree);
        tree.append_child(right, item).unwrap();

        let records = tree.take_records(id);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, left);
        assert_eq!(records[0].removed_nodes, vec![item]);
        assert_eq!(records[1].target, right);
        assert_eq!(records[1].added_nodes, vec![item]);
    }

    #[test]
    fn test_attribute_records() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        tree.append_child(NodeId::ROOT, div).unwrap();
        let id = observe_all(&mut tree);

        tree.set_attribute(div, "data-controller", "hello").unwrap();
        tree.remove_attribute(div, "missing").unwrap();
        tree.remove_attribute(div, "data-controller").unwrap();

        let records = tree.take_records(id);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.mutation_type == MutationType::Attributes));
        assert_eq!(records[0].attribute_name.as_deref(), Some("data-controller"));
    }

    #[test]
    fn test_mutations_in_detached_fragment_not_observed_from_document() {
        let mut tree = DomTree::new();
        let id = observe_all(&mut tree);
        let fragment = tree.create_element("div");
        let child = tree.create_element("p");
        tree.append_child(fragment, child).unwrap();
        tree.set_attribute(child, "data-controller", "x").unwrap();

        assert!(tree.take_records(id).is_empty());
    }

    #[test]
    fn test_query_by_attribute_root_first() {
        let mut tree = DomTree::new();
        let root = tree.create_element("div");
        let child = tree.create_element("div");
        tree.append_child(root, child).unwrap();
        tree.set_attribute(root, "data-x", "").unwrap();
        tree.set_attribute(child, "data-x", "").unwrap();

        assert_eq!(tree.query_by_attribute(root, "data-x"), vec![root, child]);
    }
}
