//! Terminal front end for browsing inspectable values
//!
//! Builds on [`obj_tree`]: an [`ObjectBrowser`](browser::ObjectBrowser)
//! keeps the view state of one window (expanded rows, selection, columns,
//! detail mode, auto refresh) and [`render`] turns it into text.

pub mod auto_refresh;
pub mod browser;
pub mod column;
pub mod demo;
pub mod detail;
pub mod render;
pub mod settings;
pub mod watcher;

pub use browser::{ObjectBrowser, Row};
