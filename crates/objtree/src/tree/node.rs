//! Core node types for the object tree

use std::fmt;

use derive_more::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::inspect::{is_dunder, Inspect};
use crate::tree::DiffKey;

/// Unique identifier for a node within a tree
///
/// Internally an index into arena storage plus the generation of the slot.
/// Slots are reused after their node is removed, so an id kept across a
/// refresh either still names the same node or resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// The root node always lives in the first slot and is never freed
    pub const ROOT: NodeId = NodeId {
        index: 0,
        generation: 0,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        NodeId { index, generation }
    }

    /// Index of the arena slot
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Generation of the arena slot
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

/// How a node was discovered from its parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeKind {
    /// The inspected value itself, or the invisible root above it
    #[display(fmt = "root")]
    Root,
    /// A sequence, set or mapping entry
    #[display(fmt = "structural")]
    Structural,
    /// A named attribute found by reflection
    #[display(fmt = "attribute")]
    Attribute,
}

impl NodeKind {
    /// Returns true if this node is an attribute of its parent
    pub const fn is_attribute(self) -> bool {
        matches!(self, NodeKind::Attribute)
    }

    /// Returns true if this node is a sequence, set or mapping entry
    pub const fn is_structural(self) -> bool {
        matches!(self, NodeKind::Structural)
    }
}

/// A single node in the tree
///
/// Generic over the inspected value type `V`. The node holds a handle to the
/// value; the value's lifetime belongs to whoever created it.
#[derive(Debug, Clone)]
pub struct Node<V> {
    /// Display label: an index, a mapping key or an attribute name
    pub name: String,
    /// Accessor expression from the root, e.g. `root['a'].b[0]`
    pub path: String,
    /// How the node was discovered
    pub kind: NodeKind,
    /// The wrapped value
    pub value: V,
}

impl<V> Node<V> {
    /// Create a new node
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: NodeKind, value: V) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
            value,
        }
    }

    /// Returns true if this node is an attribute of its parent
    pub fn is_attribute(&self) -> bool {
        self.kind.is_attribute()
    }

    /// Returns true for attributes named like `__len__`
    pub fn is_dunder_attribute(&self) -> bool {
        self.kind.is_attribute() && is_dunder(&self.name)
    }

    /// The identity used to align old and new children during refresh
    pub fn diff_key(&self) -> DiffKey {
        (self.name.clone(), self.kind)
    }
}

impl<V: Inspect> Node<V> {
    /// Returns true if the wrapped value can be called
    pub fn is_callable(&self) -> bool {
        self.value.is_callable()
    }
}

impl<V> fmt::Display for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        assert_eq!(NodeId::ROOT, NodeId::new(0, 0));
        let id = NodeId::new(5, 2);
        assert_eq!(id.index(), 5);
        assert_eq!(id.generation(), 2);
        assert_ne!(id, NodeId::new(5, 3));
        assert_eq!(id.to_string(), "NodeId(5v2)");
    }

    #[test]
    fn test_node_kind() {
        assert!(NodeKind::Attribute.is_attribute());
        assert!(!NodeKind::Attribute.is_structural());
        assert!(NodeKind::Structural.is_structural());
        assert!(!NodeKind::Root.is_attribute());
        assert_eq!(NodeKind::Structural.to_string(), "structural");
    }

    #[test]
    fn test_node() {
        let node = Node::new("__len__", "lst.__len__", NodeKind::Attribute, 3);
        assert!(node.is_attribute());
        assert!(node.is_dunder_attribute());
        assert_eq!(node.diff_key(), ("__len__".to_string(), NodeKind::Attribute));
        assert_eq!(node.to_string(), "lst.__len__ (attribute)");

        let entry = Node::new("__len__", "d['__len__']", NodeKind::Structural, 3);
        assert!(!entry.is_dunder_attribute());
    }
}
