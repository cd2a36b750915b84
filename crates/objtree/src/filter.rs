//! Display-only visibility rules

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::inspect::Inspect;
use crate::tree::{Node, NodeId, NodeKind, ObjectTree, Tree};

/// Which children a view shows.
///
/// Applying a filter never touches the tree; toggling a setting only changes
/// what [`accepts`](Self::accepts) returns for the nodes already fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewFilter {
    pub show_callables: bool,
    pub show_dunder_attributes: bool,
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            show_callables: true,
            show_dunder_attributes: true,
        }
    }
}

impl ViewFilter {
    /// A filter that shows everything
    pub fn show_all() -> Self {
        Self::default()
    }

    pub fn with_callables(mut self, show: bool) -> Self {
        self.show_callables = show;
        self
    }

    pub fn with_dunder_attributes(mut self, show: bool) -> Self {
        self.show_dunder_attributes = show;
        self
    }

    /// Returns true if `node` should be shown.
    ///
    /// Callables are hidden whatever their kind; dunder names only when the
    /// node is an attribute, so a mapping key `"__x__"` stays visible. Root
    /// nodes are always shown.
    pub fn accepts<V: Inspect>(&self, node: &Node<V>) -> bool {
        if node.kind == NodeKind::Root {
            return true;
        }
        if !self.show_callables && node.is_callable() {
            return false;
        }
        if !self.show_dunder_attributes && node.is_dunder_attribute() {
            return false;
        }
        true
    }

    /// Returns true if the node behind `id` exists and should be shown
    pub fn is_visible<V: Inspect>(&self, tree: &ObjectTree<V>, id: NodeId) -> bool {
        tree.get(id).map(|node| self.accepts(node)).unwrap_or(false)
    }

    /// Fetched children of `parent` that should be shown, with their rows
    pub fn visible_children<V: Inspect>(
        &self,
        tree: &ObjectTree<V>,
        parent: NodeId,
    ) -> Vec<(usize, NodeId)> {
        tree.child_ids(parent)
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, id)| self.is_visible(tree, id))
            .collect()
    }

    /// Row of the first shown child of `parent`
    pub fn first_visible_row<V: Inspect>(&self, tree: &ObjectTree<V>, parent: NodeId) -> Option<usize> {
        tree.child_ids(parent)
            .iter()
            .position(|&id| self.is_visible(tree, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Function, Value};

    fn node(name: &str, kind: NodeKind, value: Value) -> Node<Value> {
        Node::new(name, name, kind, value)
    }

    #[test]
    fn test_defaults_show_everything() {
        let filter = ViewFilter::default();
        assert!(filter.accepts(&node("__len__", NodeKind::Attribute, Value::from(1))));
        assert!(filter.accepts(&node(
            "f",
            NodeKind::Attribute,
            Value::function(Function::new("f"))
        )));
    }

    #[test]
    fn test_hidden_callables() {
        let filter = ViewFilter::default().with_callables(false);
        let function = Value::function(Function::new("f"));
        assert!(!filter.accepts(&node("f", NodeKind::Attribute, function.clone())));
        assert!(!filter.accepts(&node("0", NodeKind::Structural, function.clone())));
        assert!(filter.accepts(&node("f", NodeKind::Root, function)));
        assert!(filter.accepts(&node("x", NodeKind::Attribute, Value::from(1))));
    }

    #[test]
    fn test_hidden_dunder_attributes() {
        let filter = ViewFilter::default().with_dunder_attributes(false);
        assert!(!filter.accepts(&node("__doc__", NodeKind::Attribute, Value::None)));
        assert!(filter.accepts(&node("__doc__", NodeKind::Structural, Value::None)));
        assert!(filter.accepts(&node("_private", NodeKind::Attribute, Value::None)));
    }

    #[test]
    fn test_first_visible_row_skips_hidden_rows() {
        let value = Value::ordered_dict(vec![
            (Value::from("f"), Value::function(Function::new("f"))),
            (Value::from("x"), Value::from(1)),
        ]);
        let tree = ObjectTree::new(value, "");
        let all = ViewFilter::default();
        let no_callables = all.with_callables(false);

        assert_eq!(tree.first_visible_index(&all), Some(vec![0]));
        assert_eq!(tree.first_visible_index(&no_callables), Some(vec![1]));
        assert_eq!(
            no_callables.visible_children(&tree, NodeId::ROOT)[0],
            (1, tree.child(NodeId::ROOT, 1).unwrap())
        );
    }

    #[test]
    fn test_named_root_is_first_row() {
        let tree = ObjectTree::new(Value::list(vec![]), "lst");
        let filter = ViewFilter::default().with_callables(false);
        assert_eq!(tree.first_visible_index(&filter), Some(vec![0]));
    }
}
