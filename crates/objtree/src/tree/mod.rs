//! Lazily expanded trees over inspected values
//!
//! [`ObjectTree`] owns the nodes and fetches children on demand;
//! [`ObjectTree::refresh`] patches an expanded tree in place. The [`Tree`]
//! and [`TreeTraversal`] traits give read-only navigation over whatever has
//! been fetched so far.

mod events;
pub(crate) mod lazy;
mod node;
mod refresh;
mod traits;

pub use events::{EventLog, TreeEvent, TreeListener};
pub use lazy::{ChildCount, ObjectTree, INVISIBLE_ROOT_NAME};
pub use node::{Node, NodeId, NodeKind};
pub use refresh::{edit_script, DiffKey, EditOp, RefreshStats};
pub use traits::{TraversalOrder, Tree, TreeTraversal, TreeWalker};

/// Re-export common types for convenience
pub mod prelude {
    pub use super::{
        ChildCount, EventLog, Node, NodeId, NodeKind, ObjectTree, RefreshStats, TraversalOrder,
        Tree, TreeEvent, TreeListener, TreeTraversal,
    };
}
