//! Read-only navigation over trees of inspected values

use std::collections::{HashSet, VecDeque};

use crate::tree::{Node, NodeId, NodeKind};

/// A tree of [`Node`]s that can be navigated without fetching anything.
///
/// Only nodes that have already been materialised are visible through this
/// trait; `children` of an unfetched node is empty. Derived methods build on
/// the four required ones.
///
/// # Example
///
/// ```ignore
/// fn print_tree<T: Tree>(tree: &T) {
///     for id in tree.walk(TraversalOrder::PreOrder) {
///         let node = tree.get(id).unwrap();
///         println!("{:indent$}{}", "", node.name, indent = tree.depth(id) * 2);
///     }
/// }
/// ```
pub trait Tree {
    /// The inspected value type held by each node
    type Value;

    /// Get the root node ID (always exists)
    fn root(&self) -> NodeId;

    /// Get a node by its ID
    ///
    /// Returns `None` if the ID is invalid or stale.
    fn get(&self, id: NodeId) -> Option<&Node<Self::Value>>;

    /// Get the parent of a node
    ///
    /// Returns `None` for the root node.
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Iterate over the already fetched children of a node
    fn children(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_>;

    /// Count live nodes in the tree
    fn node_count(&self) -> usize;

    /// Get the name of a node
    fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    /// Get the accessor path of a node
    fn path(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.path.as_str())
    }

    /// Get the kind of a node
    fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(|n| n.kind)
    }

    /// Get the depth of a node (root = 0)
    fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).len()
    }

    /// Get all ancestors of a node, from parent to root
    fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(id);
        while let Some(parent_id) = current {
            ancestors.push(parent_id);
            current = self.parent(parent_id);
        }
        ancestors
    }
}

/// Traversal order for walking the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraversalOrder {
    /// Visit parent before children (top-down)
    PreOrder,
    /// Visit children before parent (bottom-up)
    PostOrder,
    /// Visit level by level (breadth-first)
    BreadthFirst,
}

/// Extension trait providing traversal and search utilities
///
/// Automatically implemented for all types that implement `Tree`.
pub trait TreeTraversal: Tree {
    /// Walk the fetched part of the tree from the root
    fn walk(&self, order: TraversalOrder) -> TreeWalker<'_, Self>
    where
        Self: Sized,
    {
        TreeWalker::new(self, self.root(), order)
    }

    /// Walk the fetched part of the tree below `start`, including `start`
    fn walk_from(&self, start: NodeId, order: TraversalOrder) -> TreeWalker<'_, Self>
    where
        Self: Sized,
    {
        TreeWalker::new(self, start, order)
    }

    /// Find nodes matching a predicate
    fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Node<Self::Value>) -> bool,
        Self: Sized,
    {
        self.walk(TraversalOrder::PreOrder)
            .filter(|&id| self.get(id).map(&predicate).unwrap_or(false))
            .collect()
    }

    /// Find a fetched node by its accessor path
    fn find_by_path(&self, path: &str) -> Option<NodeId>
    where
        Self: Sized,
    {
        self.walk(TraversalOrder::PreOrder)
            .find(|&id| self.path(id) == Some(path))
    }
}

impl<T: Tree> TreeTraversal for T {}

/// Iterator for traversing a tree in different orders
pub struct TreeWalker<'a, T: Tree + ?Sized> {
    tree: &'a T,
    order: TraversalOrder,
    pending: VecDeque<NodeId>,
    visited: HashSet<NodeId>,
}

impl<'a, T: Tree + ?Sized> TreeWalker<'a, T> {
    /// Create a new tree walker starting from the given node
    pub fn new(tree: &'a T, start: NodeId, order: TraversalOrder) -> Self {
        let mut pending = VecDeque::new();
        if tree.get(start).is_some() {
            pending.push_back(start);
        }
        Self {
            tree,
            order,
            pending,
            visited: HashSet::new(),
        }
    }

    fn next_preorder(&mut self) -> Option<NodeId> {
        let current = self.pending.pop_back()?;
        let children: Vec<_> = self.tree.children(current).collect();
        self.pending.extend(children.into_iter().rev());
        Some(current)
    }

    fn next_postorder(&mut self) -> Option<NodeId> {
        while let Some(&current) = self.pending.back() {
            if !self.visited.insert(current) {
                self.pending.pop_back();
                return Some(current);
            }
            let children: Vec<_> = self.tree.children(current).collect();
            self.pending.extend(children.into_iter().rev());
        }
        None
    }

    fn next_breadthfirst(&mut self) -> Option<NodeId> {
        let current = self.pending.pop_front()?;
        self.pending.extend(self.tree.children(current));
        Some(current)
    }
}

impl<'a, T: Tree + ?Sized> Iterator for TreeWalker<'a, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        match self.order {
            TraversalOrder::PreOrder => self.next_preorder(),
            TraversalOrder::PostOrder => self.next_postorder(),
            TraversalOrder::BreadthFirst => self.next_breadthfirst(),
        }
    }
}
