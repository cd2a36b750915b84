//! Structural change notifications sent to the hosting view

use crate::tree::NodeId;

/// Receives row changes as the tree applies them.
///
/// Mirrors the classic tree-view contract: every insert or remove is
/// announced before the tree changes and confirmed after. Rows are the
/// indexes of the affected children under `parent`, both ends inclusive.
/// All methods default to doing nothing.
pub trait TreeListener {
    fn begin_insert_rows(&mut self, _parent: NodeId, _first: usize, _last: usize) {}

    fn end_insert_rows(&mut self) {}

    fn begin_remove_rows(&mut self, _parent: NodeId, _first: usize, _last: usize) {}

    fn end_remove_rows(&mut self) {}

    /// Every displayed value may have changed
    fn data_changed(&mut self) {}
}

/// Discards all notifications
impl TreeListener for () {}

impl<L: TreeListener + ?Sized> TreeListener for &mut L {
    fn begin_insert_rows(&mut self, parent: NodeId, first: usize, last: usize) {
        (**self).begin_insert_rows(parent, first, last)
    }

    fn end_insert_rows(&mut self) {
        (**self).end_insert_rows()
    }

    fn begin_remove_rows(&mut self, parent: NodeId, first: usize, last: usize) {
        (**self).begin_remove_rows(parent, first, last)
    }

    fn end_remove_rows(&mut self) {
        (**self).end_remove_rows()
    }

    fn data_changed(&mut self) {
        (**self).data_changed()
    }
}

/// A recorded notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    BeginInsertRows {
        parent: NodeId,
        first: usize,
        last: usize,
    },
    EndInsertRows,
    BeginRemoveRows {
        parent: NodeId,
        first: usize,
        last: usize,
    },
    EndRemoveRows,
    DataChanged,
}

/// A listener that records every notification in order
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<TreeEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TreeEvent] {
        &self.events
    }

    /// Remove and return everything recorded so far
    pub fn take(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Parents and row ranges of all removals, in the order they happened
    pub fn removed_ranges(&self) -> Vec<(NodeId, usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                TreeEvent::BeginRemoveRows {
                    parent,
                    first,
                    last,
                } => Some((parent, first, last)),
                _ => None,
            })
            .collect()
    }

    /// Parents and row ranges of all insertions, in the order they happened
    pub fn inserted_ranges(&self) -> Vec<(NodeId, usize, usize)> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                TreeEvent::BeginInsertRows {
                    parent,
                    first,
                    last,
                } => Some((parent, first, last)),
                _ => None,
            })
            .collect()
    }
}

impl TreeListener for EventLog {
    fn begin_insert_rows(&mut self, parent: NodeId, first: usize, last: usize) {
        self.events.push(TreeEvent::BeginInsertRows {
            parent,
            first,
            last,
        });
    }

    fn end_insert_rows(&mut self) {
        self.events.push(TreeEvent::EndInsertRows);
    }

    fn begin_remove_rows(&mut self, parent: NodeId, first: usize, last: usize) {
        self.events.push(TreeEvent::BeginRemoveRows {
            parent,
            first,
            last,
        });
    }

    fn end_remove_rows(&mut self) {
        self.events.push(TreeEvent::EndRemoveRows);
    }

    fn data_changed(&mut self) {
        self.events.push(TreeEvent::DataChanged);
    }
}
