//! Child enumeration policy
//!
//! Turns one value into the ordered list of nodes that become its children:
//! structural entries first (sequence, set or mapping, whichever probe
//! matches first), then every readable attribute sorted by name.

use log::{debug, warn};

use crate::error::{EnumerationError, InspectError};
use crate::inspect::{sort_naturally, Inspect, Shape};
use crate::tree::{Node, NodeKind};

/// Name given to every set element; sets have no per-element accessor
pub const SET_ELEMENT_NAME: &str = "pop()";

/// Stands in for an empty root path inside a path expression
pub const ROOT_PLACEHOLDER: &str = "<root>";

/// Limits applied while enumerating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumerateOptions {
    /// Show at most this many structural children per node
    pub max_structural_items: Option<usize>,
}

/// An attribute that could not be read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedAttribute {
    pub name: String,
    pub error: InspectError,
}

/// The children of one value
#[derive(Debug, Clone)]
pub struct Enumeration<V> {
    /// Structural children followed by attribute children
    pub children: Vec<Node<V>>,
    /// Attributes left out because reading them failed
    pub skipped: Vec<SkippedAttribute>,
}

/// Enumerate the children of `value`, which lives at `path`.
///
/// For a fixed value and options the result is always the same sequence;
/// the refresh engine relies on it.
pub fn enumerate<V: Inspect>(
    value: &V,
    path: &str,
    options: &EnumerateOptions,
) -> Result<Enumeration<V>, EnumerationError> {
    let shape = Shape::of(value);
    let mut children = structural_children(value, path, shape).map_err(|source| {
        EnumerationError {
            path: path.to_string(),
            shape,
            source,
        }
    })?;

    if let Some(max) = options.max_structural_items {
        if children.len() > max {
            debug!(
                "truncating {:?}: showing {} of {} {} items",
                path,
                max,
                children.len(),
                shape
            );
            children.truncate(max);
        }
    }

    let mut skipped = Vec::new();
    let mut names = value.attribute_names();
    names.sort();
    names.dedup();
    for name in names {
        match value.attribute(&name) {
            Ok(attr) => {
                let attr_path = attribute_path(path, &name);
                children.push(Node::new(name, attr_path, NodeKind::Attribute, attr));
            }
            Err(error) => {
                warn!("skipping attribute {:?} of {:?}: {}", name, path, error);
                skipped.push(SkippedAttribute { name, error });
            }
        }
    }

    Ok(Enumeration { children, skipped })
}

fn structural_children<V: Inspect>(
    value: &V,
    path: &str,
    shape: Shape,
) -> Result<Vec<Node<V>>, InspectError> {
    let nodes = match shape {
        Shape::Sequence => value
            .sequence_items()?
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                Node::new(i.to_string(), index_path(path, i), NodeKind::Structural, item)
            })
            .collect(),
        Shape::Set => {
            let mut items = value.set_items()?;
            if !sort_naturally(&mut items, |item| item.sort_key()) {
                debug!("unable to sort set elements of {:?}", path);
            }
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    Node::new(
                        SET_ELEMENT_NAME,
                        set_element_path(path, i),
                        NodeKind::Structural,
                        item,
                    )
                })
                .collect()
        }
        Shape::Mapping => {
            let mut entries = value.mapping_entries()?;
            if !value.preserves_insertion_order()
                && !sort_naturally(&mut entries, |(key, _)| key.sort_key())
            {
                debug!("unable to sort mapping keys of {:?}", path);
            }
            entries
                .into_iter()
                .map(|(key, item)| {
                    let name = key_name(&key);
                    let literal = key.repr().unwrap_or_else(|_| name.clone());
                    let entry_path = key_path(path, &literal);
                    Node::new(name, entry_path, NodeKind::Structural, item)
                })
                .collect()
        }
        Shape::Plain => Vec::new(),
    };
    Ok(nodes)
}

/// Display name of a mapping key
fn key_name<V: Inspect>(key: &V) -> String {
    key.to_text()
        .or_else(|_| key.repr())
        .unwrap_or_else(|err| format!("<unprintable key: {err}>"))
}

/// Path of the element at `index` of the sequence at `parent`
pub fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

/// Path of the entry with the key literal `literal` in the mapping at `parent`
pub fn key_path(parent: &str, literal: &str) -> String {
    format!("{parent}[{literal}]")
}

/// Path of the attribute `name` of the value at `parent`
pub fn attribute_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Path of the `index`-th element, in sorted order, of the set at `parent`
pub fn set_element_path(parent: &str, index: usize) -> String {
    let parent = if parent.is_empty() {
        ROOT_PLACEHOLDER
    } else {
        parent
    };
    format!("sorted({parent})[{index}]")
}
