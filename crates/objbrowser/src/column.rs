//! Attribute columns of the object table
//!
//! Each column maps a node to one line of text. The table is declarative:
//! hosts pick a subset of [`all_columns`] and may change widths and
//! visibility, but the data functions only ever see `Node` fields.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use obj_tree::tree::{Node, NodeKind};
use obj_tree::{Inspect, InspectError, Shape};

/// Shown in place of the name or path of a nameless root
pub const ROOT_LABEL: &str = "<root>";

/// Replaces line breaks so every cell fits on one line
pub const LINE_BREAK_MARKER: char = '\u{21B5}';

pub const SMALL_COL_WIDTH: usize = 12;
pub const MEDIUM_COL_WIDTH: usize = 24;

/// Computes the text of a cell
pub type DataFn<V> = fn(&Node<V>) -> Result<String, InspectError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[display(fmt = "left")]
    Left,
    #[display(fmt = "right")]
    Right,
}

/// How one property of a node is rendered in a table column
#[derive(Debug, Clone)]
pub struct AttributeColumn<V> {
    pub name: &'static str,
    pub doc: &'static str,
    pub data_fn: DataFn<V>,
    pub visible: bool,
    /// Width in characters
    pub width: usize,
    pub alignment: Alignment,
}

impl<V: Inspect> AttributeColumn<V> {
    pub fn new(name: &'static str, doc: &'static str, data_fn: DataFn<V>) -> Self {
        Self {
            name,
            doc,
            data_fn,
            visible: true,
            width: SMALL_COL_WIDTH,
            alignment: Alignment::Left,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn align_right(mut self) -> Self {
        self.alignment = Alignment::Right;
        self
    }

    /// The display text of `node` in this column, always a single line
    pub fn cell_text(&self, node: &Node<V>) -> String {
        match (self.data_fn)(node) {
            Ok(text) => single_line(&text),
            Err(err) => display_error(&err),
        }
    }

    /// Column name usable as a settings key: spaces become underscores,
    /// punctuation and other whitespace are dropped
    pub fn settings_name(&self) -> String {
        self.name
            .chars()
            .filter_map(|c| match c {
                ' ' => Some('_'),
                c if c.is_ascii_punctuation() || c.is_whitespace() => None,
                c => Some(c),
            })
            .collect()
    }
}

/// Inline marker for a value that failed to render
pub fn display_error(err: &InspectError) -> String {
    format!("**ERROR**: {err}")
}

pub fn single_line(text: &str) -> String {
    let marker = LINE_BREAK_MARKER.to_string();
    text.replace("\r\n", &marker)
        .replace(['\n', '\r'], &marker)
}

fn name<V>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(if node.name.is_empty() {
        ROOT_LABEL.to_string()
    } else {
        node.name.clone()
    })
}

fn path<V>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(if node.path.is_empty() {
        ROOT_LABEL.to_string()
    } else {
        node.path.clone()
    })
}

/// A short description: text as is, the size of containers, nothing for
/// callables, otherwise the string form
pub fn summary<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    let value = &node.value;
    if Shape::of(value).is_container() {
        let type_name = value.type_name();
        return Ok(match value.length() {
            Some(0) => format!("empty {type_name}"),
            Some(1) => format!("{type_name} of 1 item"),
            Some(n) => format!("{type_name} of {n} items"),
            None => type_name,
        });
    }
    if value.is_callable() {
        return Ok(String::new());
    }
    value.to_text()
}

fn unicode<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    node.value.to_text()
}

fn repr<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    node.value.repr()
}

fn type_name<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(node.value.type_name())
}

fn length<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(node.value.length().map(|n| n.to_string()).unwrap_or_default())
}

fn id<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(node
        .value
        .identity()
        .map(|id| format!("0x{id:X}"))
        .unwrap_or_default())
}

fn is_attribute<V>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(match node.kind {
        NodeKind::Root => String::new(),
        kind => python_bool(kind.is_attribute()),
    })
}

fn is_callable<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(python_bool(node.value.is_callable()))
}

fn is_routine<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(python_bool(node.value.is_routine()))
}

fn doc_string<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    Ok(node.value.doc().unwrap_or_default())
}

fn pretty<V: Inspect>(node: &Node<V>) -> Result<String, InspectError> {
    node.value.pretty()
}

fn python_bool(b: bool) -> String {
    if b { "True" } else { "False" }.to_string()
}

/// Every column the browser knows
pub fn all_columns<V: Inspect>() -> Vec<AttributeColumn<V>> {
    vec![
        AttributeColumn::new("name", "The name of the object.", name).width(SMALL_COL_WIDTH * 2),
        AttributeColumn::new("path", "A path to the data: e.g. var[1]['a'].item", path)
            .width(MEDIUM_COL_WIDTH),
        AttributeColumn::new(
            "summary",
            "A summary of the object for regular objects (empty for callables).",
            summary,
        )
        .width(MEDIUM_COL_WIDTH),
        AttributeColumn::new("unicode", "The string form of the object.", unicode)
            .width(MEDIUM_COL_WIDTH),
        AttributeColumn::new("repr", "The unambiguous string representation of the object.", repr)
            .width(MEDIUM_COL_WIDTH),
        AttributeColumn::new("type name", "The name of the type of the object.", type_name)
            .width(SMALL_COL_WIDTH),
        AttributeColumn::new("length", "The number of items in the object.", length)
            .hidden()
            .align_right(),
        AttributeColumn::new("id", "The identity of the object.", id)
            .hidden()
            .align_right()
            .width(MEDIUM_COL_WIDTH / 2 + 4),
        AttributeColumn::new(
            "is attribute",
            "The object is an attribute of the parent, opposed to e.g. a list element.",
            is_attribute,
        )
        .hidden(),
        AttributeColumn::new("is callable", "True if the object is callable.", is_callable),
        AttributeColumn::new(
            "is routine",
            "True if the object is a user-defined or built-in function or method.",
            is_routine,
        )
        .hidden(),
        AttributeColumn::new("doc string", "The object's doc string.", doc_string)
            .hidden()
            .width(MEDIUM_COL_WIDTH),
        AttributeColumn::new("pretty print", "Pretty printed representation of the object.", pretty)
            .hidden()
            .width(MEDIUM_COL_WIDTH),
    ]
}

/// The columns shown when nothing else is asked for
pub fn default_columns<V: Inspect>() -> Vec<AttributeColumn<V>> {
    let wanted = ["name", "path", "summary", "repr", "type name", "length", "is callable"];
    all_columns()
        .into_iter()
        .filter(|c| wanted.contains(&c.name))
        .collect()
}

/// Look up columns by name, in the requested order
pub fn columns_by_name<V: Inspect>(names: &[&str]) -> Result<Vec<AttributeColumn<V>>, String> {
    let all = all_columns::<V>();
    names
        .iter()
        .map(|wanted| {
            all.iter()
                .find(|c| c.name == *wanted || c.settings_name() == *wanted)
                .cloned()
                .ok_or_else(|| format!("unknown column {wanted:?}"))
        })
        .collect()
}
