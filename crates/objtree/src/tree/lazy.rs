//! Object tree with lazy, on-demand child enumeration

use log::{debug, warn};

use crate::enumerate::{enumerate, EnumerateOptions};
use crate::error::{Result, TreeError};
use crate::filter::ViewFilter;
use crate::inspect::Inspect;
use crate::tree::{Node, NodeId, NodeKind, Tree, TreeListener};

/// Name of the synthetic root that holds a named inspected node
pub const INVISIBLE_ROOT_NAME: &str = "<invisible_root>";

/// State of a node's children
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChildrenState {
    /// Children have not been fetched yet
    NotLoaded,
    /// Children have been fetched
    Loaded(Vec<NodeId>),
    /// Enumeration failed; the node counts as fetched with no children
    Failed(String),
}

/// Number of children as far as the tree knows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildCount {
    Known(usize),
    /// Not fetched yet; a view should assume there is something to expand
    Unknown,
}

#[derive(Debug)]
pub(crate) struct Entry<V> {
    pub(crate) node: Node<V>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: ChildrenState,
}

#[derive(Debug)]
struct Slot<V> {
    generation: u32,
    entry: Option<Entry<V>>,
}

/// A lazily expanded tree over an inspected value.
///
/// Nodes are created only when their parent's children are fetched. The
/// tree holds handles to the inspected values but never changes them.
///
/// There are two root layouts. Given a display name, an invisible synthetic
/// root holds exactly one child, the inspected node, so a view shows one
/// named top-level row. Given an empty name, the inspected value is the root
/// itself and its children are fetched immediately.
///
/// # Example
///
/// ```ignore
/// let mut tree = ObjectTree::new(value, "root");
/// let inspected = tree.inspected();
/// tree.fetch_children(inspected, &mut ())?;
/// for &child in tree.child_ids(inspected) {
///     println!("{}", tree.get(child).unwrap().path);
/// }
/// ```
#[derive(Debug)]
pub struct ObjectTree<V> {
    slots: Vec<Slot<V>>,
    free: Vec<u32>,
    live: usize,
    inspected: NodeId,
    options: EnumerateOptions,
}

impl<V: Inspect> ObjectTree<V> {
    /// Create a tree over `value` shown under `name`
    pub fn new(value: V, name: impl Into<String>) -> Self {
        Self::with_options(value, name, EnumerateOptions::default())
    }

    pub fn with_options(value: V, name: impl Into<String>, options: EnumerateOptions) -> Self {
        let name = name.into();
        let mut tree = ObjectTree {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            inspected: NodeId::ROOT,
            options,
        };

        if name.is_empty() {
            let root = tree.alloc(Node::new("", "", NodeKind::Root, value), None);
            // The hidden root is never expanded by a view, so fetch now.
            if let Err(err) = tree.fetch_children(root, &mut ()) {
                warn!("unable to fetch root children: {err}");
            }
        } else {
            let root = tree.alloc(
                Node::new(INVISIBLE_ROOT_NAME, "", NodeKind::Root, value.clone()),
                None,
            );
            let path = name.clone();
            let inspected = tree.alloc(Node::new(name, path, NodeKind::Root, value), Some(root));
            if let Some(entry) = tree.entry_mut(root) {
                entry.children = ChildrenState::Loaded(vec![inspected]);
            }
            tree.inspected = inspected;
        }
        tree
    }

    /// Fetch the children of `id` unless that already happened.
    ///
    /// An enumeration failure is not an error: the node becomes fetched with
    /// no children and [`fetch_error`](Self::fetch_error) reports the message.
    pub fn fetch_children(&mut self, id: NodeId, listener: &mut dyn TreeListener) -> Result<()> {
        let entry = self.entry(id).ok_or(TreeError::InvalidNode(id))?;
        if !matches!(entry.children, ChildrenState::NotLoaded) {
            return Ok(());
        }

        match enumerate(&entry.node.value, &entry.node.path, &self.options) {
            Ok(enumeration) => {
                debug!(
                    "fetched {} children of {:?} ({} attributes skipped)",
                    enumeration.children.len(),
                    entry.node.path,
                    enumeration.skipped.len()
                );
                self.set_children_state(id, ChildrenState::Loaded(Vec::new()));
                self.insert_children(id, 0, enumeration.children, listener);
            }
            Err(err) => {
                warn!("{err}");
                self.set_children_state(id, ChildrenState::Failed(err.to_string()));
            }
        }
        Ok(())
    }

    /// Replace the inspected value. Call `refresh` afterwards to update the
    /// fetched nodes.
    pub fn set_inspected_value(&mut self, value: V) {
        if self.inspected != NodeId::ROOT {
            if let Some(entry) = self.entry_mut(NodeId::ROOT) {
                entry.node.value = value.clone();
            }
        }
        let inspected = self.inspected;
        if let Some(entry) = self.entry_mut(inspected) {
            entry.node.value = value;
        }
    }

    /// Returns true if `id` has children, or may have them once fetched
    pub fn has_children(&self, id: NodeId) -> bool {
        match self.entry(id) {
            Some(entry) => match &entry.children {
                ChildrenState::NotLoaded => !entry.node.value.is_leaf_hint(),
                ChildrenState::Loaded(ids) => !ids.is_empty(),
                ChildrenState::Failed(_) => false,
            },
            None => false,
        }
    }
}

impl<V> ObjectTree<V> {
    /// The options children are enumerated with
    pub fn options(&self) -> &EnumerateOptions {
        &self.options
    }

    /// The node wrapping the inspected value
    pub fn inspected(&self) -> NodeId {
        self.inspected
    }

    /// True if the inspected value is shown as its own named row
    pub fn inspected_node_visible(&self) -> bool {
        self.inspected != NodeId::ROOT
    }

    /// The value wrapped by a node
    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.get(id).map(|n| &n.value)
    }

    /// Fetched children of a node; empty if nothing was fetched
    pub fn child_ids(&self, id: NodeId) -> &[NodeId] {
        match self.entry(id).map(|e| &e.children) {
            Some(ChildrenState::Loaded(ids)) => ids,
            _ => &[],
        }
    }

    /// The child in `row` under `parent`
    pub fn child(&self, parent: NodeId, row: usize) -> Option<NodeId> {
        self.child_ids(parent).get(row).copied()
    }

    /// Position of a node among its parent's children
    pub fn row(&self, id: NodeId) -> Option<usize> {
        let parent = self.entry(id)?.parent?;
        self.child_ids(parent).iter().position(|&c| c == id)
    }

    /// Rows leading from the root down to `id`; empty for the root
    pub fn index_path(&self, id: NodeId) -> Option<Vec<usize>> {
        self.entry(id)?;
        let mut rows = Vec::new();
        let mut current = id;
        while let Some(row) = self.row(current) {
            rows.push(row);
            current = self.entry(current)?.parent?;
        }
        rows.reverse();
        Some(rows)
    }

    /// Resolve a chain of rows from the root; unfetched nodes are not entered
    pub fn node_at(&self, rows: &[usize]) -> Option<NodeId> {
        rows.iter()
            .try_fold(NodeId::ROOT, |node, &row| self.child(node, row))
    }

    pub fn child_count(&self, id: NodeId) -> ChildCount {
        match self.entry(id).map(|e| &e.children) {
            Some(ChildrenState::Loaded(ids)) => ChildCount::Known(ids.len()),
            Some(ChildrenState::Failed(_)) | None => ChildCount::Known(0),
            Some(ChildrenState::NotLoaded) => ChildCount::Unknown,
        }
    }

    /// True once the children of `id` were fetched, whether or not that failed
    pub fn is_fetched(&self, id: NodeId) -> bool {
        self.entry(id)
            .map(|e| !matches!(e.children, ChildrenState::NotLoaded))
            .unwrap_or(false)
    }

    /// True if fetching `id` would do anything
    pub fn can_fetch_more(&self, id: NodeId) -> bool {
        self.entry(id)
            .map(|e| matches!(e.children, ChildrenState::NotLoaded))
            .unwrap_or(false)
    }

    /// The message of a failed enumeration, for an inline error row
    pub fn fetch_error(&self, id: NodeId) -> Option<&str> {
        match self.entry(id).map(|e| &e.children) {
            Some(ChildrenState::Failed(message)) => Some(message),
            _ => None,
        }
    }

    /// Rows of the first row a view should select.
    ///
    /// That is the inspected node when it is visible, otherwise the first
    /// child of the hidden root that `filter` lets through.
    pub fn first_visible_index(&self, filter: &ViewFilter) -> Option<Vec<usize>>
    where
        V: Inspect,
    {
        if self.inspected_node_visible() {
            return self.index_path(self.inspected);
        }
        filter.first_visible_row(self, NodeId::ROOT).map(|row| vec![row])
    }

    pub(crate) fn entry(&self, id: NodeId) -> Option<&Entry<V>> {
        let slot = self.slots.get(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entry.as_ref()
    }

    pub(crate) fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry<V>> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.entry.as_mut()
    }

    pub(crate) fn set_children_state(&mut self, id: NodeId, state: ChildrenState) {
        if let Some(entry) = self.entry_mut(id) {
            entry.children = state;
        }
    }

    fn alloc(&mut self, node: Node<V>, parent: Option<NodeId>) -> NodeId {
        let entry = Entry {
            node,
            parent,
            children: ChildrenState::NotLoaded,
        };
        self.live += 1;
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                NodeId::new(index, 0)
            }
        }
    }

    /// Release a node and everything below it
    fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index()) else {
                continue;
            };
            if slot.generation != current.generation() {
                continue;
            }
            if let Some(entry) = slot.entry.take() {
                if let ChildrenState::Loaded(children) = entry.children {
                    pending.extend(children);
                }
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index() as u32);
                self.live -= 1;
            }
        }
    }

    /// Insert freshly built, unfetched nodes at `at` under `parent`
    pub(crate) fn insert_children(
        &mut self,
        parent: NodeId,
        at: usize,
        nodes: Vec<Node<V>>,
        listener: &mut dyn TreeListener,
    ) -> usize {
        if nodes.is_empty() || self.entry(parent).is_none() {
            return 0;
        }
        let count = nodes.len();
        listener.begin_insert_rows(parent, at, at + count - 1);
        let ids: Vec<NodeId> = nodes
            .into_iter()
            .map(|node| self.alloc(node, Some(parent)))
            .collect();
        if let Some(entry) = self.entry_mut(parent) {
            match &mut entry.children {
                ChildrenState::Loaded(children) => {
                    let at = at.min(children.len());
                    children.splice(at..at, ids);
                }
                state => *state = ChildrenState::Loaded(ids),
            }
        }
        listener.end_insert_rows();
        count
    }

    /// Remove `count` children of `parent` starting at `first`, with their
    /// whole fetched subtrees
    pub(crate) fn remove_children(
        &mut self,
        parent: NodeId,
        first: usize,
        count: usize,
        listener: &mut dyn TreeListener,
    ) -> usize {
        let available = self.child_ids(parent).len();
        if count == 0 || first >= available {
            return 0;
        }
        let count = count.min(available - first);
        listener.begin_remove_rows(parent, first, first + count - 1);
        let removed: Vec<NodeId> = match self.entry_mut(parent).map(|e| &mut e.children) {
            Some(ChildrenState::Loaded(children)) => children.drain(first..first + count).collect(),
            _ => Vec::new(),
        };
        for id in removed {
            self.release(id);
        }
        listener.end_remove_rows();
        count
    }
}

impl<V> Tree for ObjectTree<V> {
    type Value = V;

    fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn get(&self, id: NodeId) -> Option<&Node<V>> {
        self.entry(id).map(|e| &e.node)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id)?.parent
    }

    fn children(&self, id: NodeId) -> Box<dyn Iterator<Item = NodeId> + '_> {
        Box::new(self.child_ids(id).iter().copied())
    }

    fn node_count(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InspectError;
    use crate::tree::{EventLog, TreeEvent, TreeTraversal};
    use crate::value::{Object, Value};
    use pretty_assertions::assert_eq;

    fn names(tree: &ObjectTree<Value>, id: NodeId) -> Vec<String> {
        tree.child_ids(id)
            .iter()
            .map(|&c| tree.get(c).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_named_root_layout() {
        let tree = ObjectTree::new(Value::list(vec![1.into()]), "lst");
        assert!(tree.inspected_node_visible());
        assert_eq!(tree.child_ids(NodeId::ROOT), &[tree.inspected()]);
        assert_eq!(tree.get(NodeId::ROOT).unwrap().name, INVISIBLE_ROOT_NAME);

        let inspected = tree.get(tree.inspected()).unwrap();
        assert_eq!(inspected.name, "lst");
        assert_eq!(inspected.path, "lst");
        assert_eq!(inspected.kind, NodeKind::Root);
        assert!(tree.can_fetch_more(tree.inspected()));
        assert_eq!(tree.child_count(tree.inspected()), ChildCount::Unknown);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_unnamed_root_is_fetched_immediately() {
        let tree = ObjectTree::new(Value::list(vec![1.into(), 2.into()]), "");
        assert!(!tree.inspected_node_visible());
        assert_eq!(tree.inspected(), NodeId::ROOT);
        assert!(tree.is_fetched(NodeId::ROOT));
        assert_eq!(names(&tree, NodeId::ROOT)[..2], ["0", "1"]);
        assert_eq!(tree.get(tree.child(NodeId::ROOT, 1).unwrap()).unwrap().path, "[1]");
    }

    #[test]
    fn test_fetch_is_idempotent() {
        let mut tree = ObjectTree::new(Value::list(vec![1.into(), 2.into()]), "lst");
        let inspected = tree.inspected();
        let mut log = EventLog::new();

        tree.fetch_children(inspected, &mut log).unwrap();
        let first = tree.child_ids(inspected).to_vec();
        let count = tree.node_count();
        assert_eq!(
            log.take()[0],
            TreeEvent::BeginInsertRows {
                parent: inspected,
                first: 0,
                last: first.len() - 1,
            }
        );

        tree.fetch_children(inspected, &mut log).unwrap();
        assert_eq!(tree.child_ids(inspected), first.as_slice());
        assert_eq!(tree.node_count(), count);
        assert!(log.is_empty());
        assert_eq!(tree.child_count(inspected), ChildCount::Known(first.len()));
    }

    #[test]
    fn test_failed_fetch_is_local() {
        let broken = Value::object(
            Object::new("Stream").with_items(|_| Err(InspectError::raised("closed"))),
        );
        let value = Value::list(vec![broken, Value::from(2)]);
        let mut tree = ObjectTree::new(value, "data");
        let inspected = tree.inspected();
        tree.fetch_children(inspected, &mut ()).unwrap();

        let stream = tree.child(inspected, 0).unwrap();
        tree.fetch_children(stream, &mut ()).unwrap();
        assert!(tree.is_fetched(stream));
        assert!(!tree.has_children(stream));
        assert_eq!(tree.child_count(stream), ChildCount::Known(0));
        assert!(tree.fetch_error(stream).unwrap().contains("closed"));

        let other = tree.child(inspected, 1).unwrap();
        tree.fetch_children(other, &mut ()).unwrap();
        assert_eq!(tree.fetch_error(other), None);
    }

    #[test]
    fn test_invalid_node() {
        let mut tree = ObjectTree::new(Value::None, "none");
        let bogus = NodeId::new(42, 0);
        assert_eq!(
            tree.fetch_children(bogus, &mut ()),
            Err(TreeError::InvalidNode(bogus))
        );
        assert!(!tree.has_children(bogus));
        assert!(!tree.can_fetch_more(bogus));
        assert_eq!(tree.index_path(bogus), None);
    }

    #[test]
    fn test_row_addressing() {
        let d = Value::dict(vec![(Value::from("y"), Value::list(vec![2.into(), 3.into()]))]);
        let mut tree = ObjectTree::new(d, "root");
        let inspected = tree.inspected();
        tree.fetch_children(inspected, &mut ()).unwrap();
        let y = tree.child(inspected, 0).unwrap();
        tree.fetch_children(y, &mut ()).unwrap();
        let y1 = tree.child(y, 1).unwrap();

        assert_eq!(tree.get(y1).unwrap().path, "root['y'][1]");
        assert_eq!(tree.row(y1), Some(1));
        assert_eq!(tree.index_path(y1), Some(vec![0, 0, 1]));
        assert_eq!(tree.node_at(&[0, 0, 1]), Some(y1));
        assert_eq!(tree.node_at(&[]), Some(NodeId::ROOT));
        assert_eq!(tree.node_at(&[0, 0, 1, 0]), None);
        assert_eq!(tree.find_by_path("root['y'][1]"), Some(y1));
        assert_eq!(tree.depth(y1), 3);
    }

    #[test]
    fn test_removed_ids_go_stale() {
        let mut tree = ObjectTree::new(Value::list(vec![1.into(), 2.into()]), "lst");
        let inspected = tree.inspected();
        tree.fetch_children(inspected, &mut ()).unwrap();
        let first = tree.child(inspected, 0).unwrap();
        let before = tree.node_count();

        assert_eq!(tree.remove_children(inspected, 0, 1, &mut ()), 1);
        assert!(tree.get(first).is_none());
        assert_eq!(tree.node_count(), before - 1);

        // the freed slot is reused under a new generation
        let n = tree.insert_children(
            inspected,
            0,
            vec![Node::new("0", "lst[0]", NodeKind::Structural, Value::from(9))],
            &mut (),
        );
        assert_eq!(n, 1);
        let reused = tree.child(inspected, 0).unwrap();
        assert_eq!(reused.index(), first.index());
        assert_ne!(reused, first);
        assert!(tree.get(first).is_none());
    }

    #[test]
    fn test_set_inspected_value() {
        let mut tree = ObjectTree::new(Value::from(1), "n");
        tree.set_inspected_value(Value::from(2));
        assert_eq!(tree.value(tree.inspected()).unwrap().repr().unwrap(), "2");
    }

    #[test]
    fn test_leaf_hint() {
        let tree = ObjectTree::new(serde_json::json!(5), "five");
        assert!(!tree.has_children(tree.inspected()));
        let tree = ObjectTree::new(serde_json::json!([5]), "list");
        assert!(tree.has_children(tree.inspected()));
    }
}
