//! Detail pane modes

use derive_more::Display;
use serde::{Deserialize, Serialize};

use obj_tree::tree::Node;
use obj_tree::Inspect;

use crate::column::display_error;

pub const NO_DOC: &str = "<no doc string found>";
pub const NO_SOURCE: &str = "<no source code found>";

/// What the detail pane shows for the selected node
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DetailMode {
    #[default]
    #[display(fmt = "str")]
    Str,
    #[display(fmt = "repr")]
    Repr,
    #[display(fmt = "pretty print")]
    Pretty,
    #[display(fmt = "doc string")]
    Doc,
    #[display(fmt = "source")]
    Source,
}

impl DetailMode {
    pub const ALL: [DetailMode; 5] = [
        DetailMode::Str,
        DetailMode::Repr,
        DetailMode::Pretty,
        DetailMode::Doc,
        DetailMode::Source,
    ];

    /// Full text for the detail pane; unlike table cells it may span lines
    pub fn render<V: Inspect>(self, node: &Node<V>) -> String {
        let value = &node.value;
        let result = match self {
            DetailMode::Str => value.to_text(),
            DetailMode::Repr => value.repr(),
            DetailMode::Pretty => value.pretty(),
            DetailMode::Doc => Ok(value.doc().unwrap_or_else(|| NO_DOC.to_string())),
            DetailMode::Source => Ok(value.source().unwrap_or_else(|| NO_SOURCE.to_string())),
        };
        result.unwrap_or_else(|err| display_error(&err))
    }
}
