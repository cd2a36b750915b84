//! The object browser: a tree plus everything a window keeps about it

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::debug;

use obj_tree::enumerate::EnumerateOptions;
use obj_tree::prelude::*;

use crate::auto_refresh::RefreshTimer;
use crate::column::{default_columns, AttributeColumn};
use crate::detail::DetailMode;
use crate::settings::{group_name, ColumnOverride, ModelSettings, SettingsStore, ViewSettings};

/// One line of the flattened, filtered tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Node {
        id: NodeId,
        depth: usize,
        expanded: bool,
        expandable: bool,
    },
    /// Stands in for the children of a node whose enumeration failed
    Error {
        parent: NodeId,
        depth: usize,
        message: String,
    },
}

impl Row {
    pub fn depth(&self) -> usize {
        match self {
            Row::Node { depth, .. } | Row::Error { depth, .. } => *depth,
        }
    }
}

/// Browses one inspected value.
///
/// Expansion and selection live here, keyed by node id, since they are view
/// state; the tree only knows what has been fetched. Filter changes never
/// touch the tree.
pub struct ObjectBrowser<V: Inspect> {
    tree: ObjectTree<V>,
    columns: Vec<AttributeColumn<V>>,
    filter: ViewFilter,
    expanded: HashSet<NodeId>,
    selected: Option<NodeId>,
    detail_mode: DetailMode,
    timer: RefreshTimer,
    instance: u32,
}

impl<V: Inspect> ObjectBrowser<V> {
    /// Browse `value` under `name` with the default columns
    pub fn new(value: V, name: impl Into<String>) -> Self {
        Self::with_options(value, name, EnumerateOptions::default())
    }

    pub fn with_options(value: V, name: impl Into<String>, options: EnumerateOptions) -> Self {
        let tree = ObjectTree::with_options(value, name, options);
        let mut browser = Self {
            tree,
            columns: default_columns(),
            filter: ViewFilter::default(),
            expanded: HashSet::new(),
            selected: None,
            detail_mode: DetailMode::default(),
            timer: RefreshTimer::default(),
            instance: 1,
        };
        browser.selected = browser.first_visible_node();
        browser
    }

    pub fn with_columns(mut self, columns: Vec<AttributeColumn<V>>) -> Self {
        self.columns = columns;
        self
    }

    /// Window instance number used in settings group names
    pub fn with_instance(mut self, instance: u32) -> Self {
        self.instance = instance;
        self
    }

    pub fn tree(&self) -> &ObjectTree<V> {
        &self.tree
    }

    pub fn columns(&self) -> &[AttributeColumn<V>] {
        &self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &AttributeColumn<V>> {
        self.columns.iter().filter(|c| c.visible)
    }

    pub fn filter(&self) -> ViewFilter {
        self.filter
    }

    pub fn set_show_callables(&mut self, show: bool) {
        debug!("show callables: {show}");
        self.filter.show_callables = show;
    }

    pub fn set_show_dunder_attributes(&mut self, show: bool) {
        debug!("show dunder attributes: {show}");
        self.filter.show_dunder_attributes = show;
    }

    pub fn detail_mode(&self) -> DetailMode {
        self.detail_mode
    }

    pub fn set_detail_mode(&mut self, mode: DetailMode) {
        self.detail_mode = mode;
    }

    pub fn timer(&self) -> &RefreshTimer {
        &self.timer
    }

    pub fn set_auto_refresh(&mut self, enabled: bool, now: Instant) {
        self.timer.set_enabled(enabled, now);
    }

    pub fn set_refresh_interval(&mut self, interval: Duration, now: Instant) -> Result<()> {
        self.timer.set_interval(interval, now)
    }

    /// Fetch the children of `id` if needed and show them
    pub fn expand(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.tree.fetch_children(id, &mut ())?;
        self.expanded.insert(id);
        Ok(())
    }

    pub fn collapse(&mut self, id: NodeId) {
        self.expanded.remove(&id);
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Expand every visible node down to `depth` levels below the top rows
    pub fn expand_to_depth(&mut self, depth: usize) -> Result<(), TreeError> {
        let mut frontier = self.top_level_nodes();
        for _ in 0..depth {
            let mut next = Vec::new();
            for id in frontier {
                self.expand(id)?;
                next.extend(
                    self.filter
                        .visible_children(&self.tree, id)
                        .into_iter()
                        .map(|(_, child)| child),
                );
            }
            frontier = next;
        }
        Ok(())
    }

    /// Find the node with accessor `path`, fetching and expanding the nodes
    /// on the way
    pub fn reveal(&mut self, path: &str) -> Result<Option<NodeId>, TreeError> {
        let mut current = self.tree.inspected();
        loop {
            if self.tree.path(current) == Some(path) {
                return Ok(Some(current));
            }
            self.expand(current)?;
            let next = self
                .tree
                .child_ids(current)
                .iter()
                .copied()
                .filter_map(|id| self.tree.path(id).map(|p| (id, p)))
                .filter(|(_, p)| is_path_prefix(p, path))
                .max_by_key(|(_, p)| p.len())
                .map(|(id, _)| id);
            match next {
                Some(id) => current = id,
                None => return Ok(None),
            }
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Select a node; stale ids clear the selection
    pub fn select(&mut self, id: NodeId) {
        self.selected = self.tree.get(id).map(|_| id);
    }

    /// Rerun enumeration for every fetched node and patch the tree
    pub fn refresh(&mut self) -> RefreshStats {
        let stats = self.tree.refresh(&mut ());
        self.prune();
        stats
    }

    /// Refresh if the auto-refresh timer is due at `now`
    pub fn tick(&mut self, now: Instant) -> Option<RefreshStats> {
        let Self { tree, timer, .. } = self;
        let stats = timer.tick(now, || tree.refresh(&mut ()));
        if stats.is_some() {
            self.prune();
        }
        stats
    }

    /// Swap the inspected value; the next refresh diffs against it
    pub fn set_value(&mut self, value: V) {
        self.tree.set_inspected_value(value);
    }

    /// Forget view state of nodes that no longer exist
    fn prune(&mut self) {
        let tree = &self.tree;
        self.expanded.retain(|&id| tree.get(id).is_some());
        if let Some(id) = self.selected {
            if tree.get(id).is_none() {
                self.selected = self.first_visible_node();
            }
        }
    }

    fn top_level_nodes(&self) -> Vec<NodeId> {
        if self.tree.inspected_node_visible() {
            vec![self.tree.inspected()]
        } else {
            self.filter
                .visible_children(&self.tree, self.tree.root())
                .into_iter()
                .map(|(_, id)| id)
                .collect()
        }
    }

    /// The node a fresh view selects
    pub fn first_visible_node(&self) -> Option<NodeId> {
        let rows = self.tree.first_visible_index(&self.filter)?;
        self.tree.node_at(&rows)
    }

    /// The rows a view shows, top to bottom
    pub fn visible_rows(&self) -> Vec<Row> {
        let mut rows = Vec::new();
        for id in self.top_level_nodes() {
            self.push_rows(id, 0, &mut rows);
        }
        rows
    }

    fn push_rows(&self, id: NodeId, depth: usize, rows: &mut Vec<Row>) {
        let expanded = self.is_expanded(id);
        rows.push(Row::Node {
            id,
            depth,
            expanded,
            expandable: self.tree.has_children(id),
        });
        if !expanded {
            return;
        }
        if let Some(message) = self.tree.fetch_error(id) {
            rows.push(Row::Error {
                parent: id,
                depth: depth + 1,
                message: message.to_string(),
            });
            return;
        }
        for (_, child) in self.filter.visible_children(&self.tree, id) {
            self.push_rows(child, depth + 1, rows);
        }
    }

    /// Text of the visible columns for one node
    pub fn cells(&self, id: NodeId) -> Vec<String> {
        match self.tree.get(id) {
            Some(node) => self.visible_columns().map(|c| c.cell_text(node)).collect(),
            None => Vec::new(),
        }
    }

    /// Detail pane text for the selected node
    pub fn details(&self) -> Option<String> {
        let node = self.tree.get(self.selected?)?;
        Some(self.detail_mode.render(node))
    }

    /// Settings group of this window
    pub fn settings_group(&self, postfix: &str) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        group_name(&names, self.instance, postfix)
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            auto_refresh: self.timer.is_enabled(),
            refresh_rate_secs: self.timer.interval().as_secs_f64(),
            filter: self.filter,
        }
    }

    pub fn view_settings(&self) -> ViewSettings {
        ViewSettings {
            detail_mode: self.detail_mode,
            columns: self
                .columns
                .iter()
                .map(|c| {
                    (
                        c.settings_name(),
                        ColumnOverride {
                            visible: Some(c.visible),
                            width: Some(c.width),
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn apply_model_settings(&mut self, settings: &ModelSettings, now: Instant) -> Result<()> {
        self.filter = settings.filter;
        self.timer.set_interval(settings.refresh_interval(), now)?;
        self.timer.set_enabled(settings.auto_refresh, now);
        Ok(())
    }

    pub fn apply_view_settings(&mut self, settings: &ViewSettings) {
        self.detail_mode = settings.detail_mode;
        for column in &mut self.columns {
            if let Some(o) = settings.columns.get(&column.settings_name()) {
                column.visible = o.visible.unwrap_or(column.visible);
                column.width = o.width.unwrap_or(column.width);
            }
        }
    }

    /// Read this window's settings from `store`
    pub fn load_settings(&mut self, store: &SettingsStore, now: Instant) -> Result<()> {
        let model = store.load::<ModelSettings>(&self.settings_group("model"));
        let view = store.load::<ViewSettings>(&self.settings_group("view"));
        self.apply_model_settings(&model, now)?;
        self.apply_view_settings(&view);
        Ok(())
    }

    /// Write this window's settings to `store`
    pub fn save_settings(&self, store: &SettingsStore) -> Result<()> {
        store.save(&self.settings_group("model"), &self.model_settings())?;
        store.save(&self.settings_group("view"), &self.view_settings())
    }

    /// Drop this window's stored settings
    pub fn reset_settings(&self, store: &SettingsStore) -> Result<()> {
        store.reset(&self.settings_group("model"))?;
        store.reset(&self.settings_group("view"))
    }
}

/// Returns true if `prefix` names `path` or one of its ancestors
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    !prefix.is_empty()
        && path.starts_with(prefix)
        && matches!(path[prefix.len()..].chars().next(), None | Some('[' | '.'))
}
