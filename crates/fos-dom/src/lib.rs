//! fOS DOM - Observable host tree
//!
//! Arena-based DOM tree that records mutations for registered observers,
//! plus the host traits the observer chain consumes.

mod node;
mod tree;
mod mutation;
pub mod host;
pub mod dom_events;

pub use node::{Node, NodeData, ElementData, Attribute};
pub use tree::DomTree;
pub use mutation::{MutationRecord, MutationType, MutationObserverInit, ObserverId};
pub use host::{TreeView, MutationSource, EventHost, HostEvent};
pub use dom_events::{DomEvent, EventTarget, ListenerOptions, EventListenerRegistry};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Document node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Null node ID
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this ID refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// DOM edit error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Node is not an element: {0:?}")]
    NotAnElement(NodeId),

    #[error("Node is not a text node: {0:?}")]
    NotText(NodeId),

    #[error("Cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
}
