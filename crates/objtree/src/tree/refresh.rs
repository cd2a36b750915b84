//! Diff-based refresh of an already expanded tree
//!
//! Refreshing re-enumerates every fetched node and aligns the fresh children
//! with the existing ones by `(name, kind)`. Aligned children keep their
//! node ids, and with them any state a view keeps per node (expansion,
//! selection); only their values are replaced. Everything else is removed or
//! inserted through the listener so a view can follow along.

use std::fmt;

use log::{debug, error, warn};
use similar::{capture_diff_slices, Algorithm, DiffOp};

use crate::enumerate::enumerate;
use crate::inspect::Inspect;
use crate::tree::lazy::ChildrenState;
use crate::tree::{Node, NodeId, NodeKind, ObjectTree, TreeListener};

/// Identity of a child for alignment purposes
pub type DiffKey = (String, NodeKind);

/// One run of an edit script turning `old` into `new`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// `old[old_index..old_index + len]` matches `new[new_index..new_index + len]`
    Equal {
        old_index: usize,
        new_index: usize,
        len: usize,
    },
    Delete {
        old_index: usize,
        old_len: usize,
        new_index: usize,
    },
    Insert {
        old_index: usize,
        new_index: usize,
        new_len: usize,
    },
    /// The old run is replaced by the new run; the lengths may differ
    Replace {
        old_index: usize,
        old_len: usize,
        new_index: usize,
        new_len: usize,
    },
}

impl From<DiffOp> for EditOp {
    fn from(op: DiffOp) -> Self {
        match op {
            DiffOp::Equal {
                old_index,
                new_index,
                len,
            } => EditOp::Equal {
                old_index,
                new_index,
                len,
            },
            DiffOp::Delete {
                old_index,
                old_len,
                new_index,
            } => EditOp::Delete {
                old_index,
                old_len,
                new_index,
            },
            DiffOp::Insert {
                old_index,
                new_index,
                new_len,
            } => EditOp::Insert {
                old_index,
                new_index,
                new_len,
            },
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => EditOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            },
        }
    }
}

/// Compute the edit script turning `old` into `new`.
///
/// Uses Myers' algorithm without a deadline, so the result is always a
/// minimal script. Runs are returned in ascending index order.
pub fn edit_script<T: Eq + std::hash::Hash + Ord>(old: &[T], new: &[T]) -> Vec<EditOp> {
    capture_diff_slices(Algorithm::Myers, old, new)
        .into_iter()
        .map(EditOp::from)
        .collect()
}

/// What a refresh pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Fetched nodes whose children were re-enumerated
    pub visited: usize,
    /// Existing nodes that kept their id and got a fresh value
    pub updated: usize,
    pub inserted: usize,
    pub removed: usize,
    /// Nodes whose re-enumeration failed
    pub failed: usize,
}

impl fmt::Display for RefreshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visited, {} updated, {} inserted, {} removed, {} failed",
            self.visited, self.updated, self.inserted, self.removed, self.failed
        )
    }
}

impl<V: Inspect> ObjectTree<V> {
    /// Bring every fetched node in line with the current values.
    ///
    /// Unfetched nodes are left alone; they will see live data when first
    /// expanded. Ends with a single `data_changed` notification.
    pub fn refresh(&mut self, listener: &mut dyn TreeListener) -> RefreshStats {
        let stats = self.refresh_node(NodeId::ROOT, listener);
        listener.data_changed();
        debug!("refresh: {stats}");
        stats
    }

    /// Refresh the subtree below `id` without the final `data_changed`
    pub fn refresh_node(&mut self, id: NodeId, listener: &mut dyn TreeListener) -> RefreshStats {
        let mut stats = RefreshStats::default();
        self.refresh_recursive(id, listener, &mut stats);
        stats
    }

    fn refresh_recursive(
        &mut self,
        id: NodeId,
        listener: &mut dyn TreeListener,
        stats: &mut RefreshStats,
    ) {
        let Some(entry) = self.entry(id) else {
            return;
        };
        let old_ids = match &entry.children {
            ChildrenState::NotLoaded => return,
            ChildrenState::Loaded(ids) => ids.clone(),
            ChildrenState::Failed(_) => Vec::new(),
        };
        stats.visited += 1;

        // The synthetic root has exactly one child, whatever the value holds.
        if id == NodeId::ROOT && self.inspected_node_visible() {
            let inspected = self.inspected();
            self.refresh_recursive(inspected, listener, stats);
            return;
        }

        let (fresh, failure) = match enumerate(&entry.node.value, &entry.node.path, self.options())
        {
            Ok(enumeration) => (enumeration.children, None),
            Err(err) => {
                warn!("refresh: {err}");
                stats.failed += 1;
                (Vec::new(), Some(err.to_string()))
            }
        };

        let old_keys: Vec<DiffKey> = old_ids
            .iter()
            .filter_map(|&child| self.entry(child))
            .map(|e| e.node.diff_key())
            .collect();
        let new_keys: Vec<DiffKey> = fresh.iter().map(Node::diff_key).collect();
        if old_keys.len() != old_ids.len() {
            report_violation(&format!("{id} lists children that no longer exist"));
        }

        self.set_children_state(id, ChildrenState::Loaded(old_ids.clone()));
        let mut fresh: Vec<Option<Node<V>>> = fresh.into_iter().map(Some).collect();

        // Back to front, so the indexes of earlier runs stay valid.
        for op in edit_script(&old_keys, &new_keys).into_iter().rev() {
            match op {
                EditOp::Equal {
                    old_index,
                    new_index,
                    len,
                } => {
                    for k in 0..len {
                        let child = old_ids[old_index + k];
                        if let Some(node) = fresh[new_index + k].take() {
                            self.update_in_place(child, node);
                            stats.updated += 1;
                        }
                        self.refresh_recursive(child, listener, stats);
                    }
                }
                EditOp::Delete {
                    old_index, old_len, ..
                } => {
                    stats.removed += self.remove_children(id, old_index, old_len, listener);
                }
                EditOp::Insert {
                    old_index,
                    new_index,
                    new_len,
                } => {
                    let nodes = take_run(&mut fresh, new_index, new_len);
                    stats.inserted += self.insert_children(id, old_index, nodes, listener);
                }
                EditOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    stats.removed += self.remove_children(id, old_index, old_len, listener);
                    let nodes = take_run(&mut fresh, new_index, new_len);
                    stats.inserted += self.insert_children(id, old_index, nodes, listener);
                }
            }
        }

        let actual: Vec<DiffKey> = self
            .child_ids(id)
            .iter()
            .filter_map(|&child| self.entry(child))
            .map(|e| e.node.diff_key())
            .collect();
        if actual != new_keys {
            report_violation(&format!(
                "{id} has {} children after refresh, expected {}",
                actual.len(),
                new_keys.len()
            ));
        }

        if let Some(message) = failure {
            self.set_children_state(id, ChildrenState::Failed(message));
        }
    }

    fn update_in_place(&mut self, id: NodeId, fresh: Node<V>) {
        if let Some(entry) = self.entry_mut(id) {
            entry.node.value = fresh.value;
            entry.node.path = fresh.path;
        }
    }
}

fn take_run<V>(fresh: &mut [Option<Node<V>>], start: usize, len: usize) -> Vec<Node<V>> {
    fresh[start..start + len]
        .iter_mut()
        .filter_map(Option::take)
        .collect()
}

fn report_violation(message: &str) {
    error!("structural invariant violated: {message}");
    debug_assert!(false, "structural invariant violated: {message}");
}
