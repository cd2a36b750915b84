//! Object Tree Library
//!
//! Browse arbitrary in-memory values as a lazily expanded tree that can be
//! refreshed in place.
//!
//! # Core Concepts
//!
//! - **Inspect**: the reflection capability a value type implements
//! - **Enumerator**: turns one value into its ordered children
//! - **ObjectTree**: fetches children on demand and diff-refreshes them
//! - **ViewFilter**: hides callables or dunder attributes without touching the tree
//!
//! # Example
//!
//! ```
//! use obj_tree::prelude::*;
//! use obj_tree::value::Value;
//!
//! let data = Value::dict(vec![(Value::from("x"), Value::from(1))]);
//! let mut tree = ObjectTree::new(data, "root");
//! let root = tree.inspected();
//! tree.fetch_children(root, &mut ()).unwrap();
//!
//! for id in tree.walk(TraversalOrder::PreOrder) {
//!     let node = tree.get(id).unwrap();
//!     println!("{:indent$}{}", "", node.name, indent = tree.depth(id) * 2);
//! }
//! ```

pub mod enumerate;
pub mod error;
pub mod filter;
pub mod inspect;
pub mod json;
pub mod tree;
pub mod value;

pub use error::{EnumerationError, InspectError, TreeError};
pub use filter::ViewFilter;
pub use inspect::{Inspect, Shape, SortKey};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::enumerate::{enumerate, EnumerateOptions};
    pub use crate::error::{InspectError, TreeError};
    pub use crate::filter::ViewFilter;
    pub use crate::inspect::{Inspect, Shape};
    pub use crate::tree::prelude::*;
}
