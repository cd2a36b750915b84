//! Persistent browser settings
//!
//! Settings live in one TOML document. Every browser window reads and writes
//! its own groups, named after a hash of its column names, its window
//! instance number and a postfix, so windows with different column layouts
//! never overwrite each other's settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use obj_tree::ViewFilter;

use crate::detail::DetailMode;

pub const DEFAULT_REFRESH_RATE_SECS: f64 = 2.0;
const SETTINGS_FILE: &str = "settings.toml";

/// Settings of the tree contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub auto_refresh: bool,
    pub refresh_rate_secs: f64,
    #[serde(flatten)]
    pub filter: ViewFilter,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            auto_refresh: false,
            refresh_rate_secs: DEFAULT_REFRESH_RATE_SECS,
            filter: ViewFilter::default(),
        }
    }
}

impl ModelSettings {
    /// The refresh interval, falling back to the default for unusable rates
    pub fn refresh_interval(&self) -> Duration {
        match Duration::try_from_secs_f64(self.refresh_rate_secs) {
            Ok(interval) if !interval.is_zero() => interval,
            _ => {
                warn!(
                    "unusable refresh rate {}; using {}",
                    self.refresh_rate_secs, DEFAULT_REFRESH_RATE_SECS
                );
                Duration::from_secs_f64(DEFAULT_REFRESH_RATE_SECS)
            }
        }
    }
}

/// Overrides of one column's defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOverride {
    pub visible: Option<bool>,
    pub width: Option<usize>,
}

/// Settings of the presentation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub detail_mode: DetailMode,
    /// Keyed by the column's settings name
    pub columns: BTreeMap<String, ColumnOverride>,
}

/// Name of the settings group of one window
pub fn group_name<S: AsRef<str>>(column_names: &[S], instance: u32, postfix: &str) -> String {
    let joined = column_names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",");
    let digest = Sha256::digest(joined.as_bytes());
    let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hash}_win{instance}_{postfix}")
}

/// A TOML file holding settings groups
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store in the user's configuration directory
    pub fn in_config_dir() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("objbrowser").join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a group, using defaults for anything missing or unreadable
    pub fn load<T: DeserializeOwned + Default>(&self, group: &str) -> T {
        let document = match self.read_document() {
            Ok(document) => document,
            Err(err) => {
                warn!("ignoring settings file: {err:#}");
                return T::default();
            }
        };
        match document.get(group) {
            Some(value) => value.clone().try_into().unwrap_or_else(|err| {
                warn!("ignoring corrupt settings group {group}: {err}");
                T::default()
            }),
            None => {
                debug!("no settings group {group} in {}", self.path.display());
                T::default()
            }
        }
    }

    /// Write a group, keeping all other groups
    pub fn save<T: Serialize>(&self, group: &str, settings: &T) -> Result<()> {
        let mut document = self.read_document().unwrap_or_else(|err| {
            warn!("overwriting unreadable settings file: {err:#}");
            toml::Table::new()
        });
        let value = toml::Value::try_from(settings)
            .with_context(|| format!("Failed to serialize settings group {group}"))?;
        document.insert(group.to_string(), value);
        self.write_document(&document)?;
        debug!("wrote settings group {group} to {}", self.path.display());
        Ok(())
    }

    /// Drop a group so its defaults apply again
    pub fn reset(&self, group: &str) -> Result<()> {
        let Ok(mut document) = self.read_document() else {
            return Ok(());
        };
        if document.remove(group).is_some() {
            self.write_document(&document)?;
            debug!("reset settings group {group}");
        }
        Ok(())
    }

    fn read_document(&self) -> Result<toml::Table> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        text.parse::<toml::Table>()
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn write_document(&self, document: &toml::Table) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let text = toml::to_string_pretty(document).context("Failed to format settings")?;
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, SettingsStore) {
        let temp = TempDir::new().unwrap();
        let store = SettingsStore::new(temp.path().join("nested").join(SETTINGS_FILE));
        (temp, store)
    }

    #[test]
    fn test_group_name() {
        let a = group_name(&["name", "path"], 1, "model");
        let b = group_name(&["name", "repr"], 1, "model");
        assert!(a.ends_with("_win1_model"));
        assert_eq!(a.len(), 64 + "_win1_model".len());
        assert_ne!(a, b);
        assert_eq!(a, group_name(&["name".to_string(), "path".to_string()], 1, "model"));
        assert_ne!(a, group_name(&["name", "path"], 2, "model"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (_temp, store) = store();
        let model: ModelSettings = store.load("g_model");
        assert_eq!(model, ModelSettings::default());
        assert!(!model.auto_refresh);
        assert_eq!(model.refresh_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_round_trip_keeps_other_groups() {
        let (_temp, store) = store();
        let model = ModelSettings {
            auto_refresh: true,
            refresh_rate_secs: 0.5,
            filter: ViewFilter::default().with_callables(false),
        };
        let mut view = ViewSettings {
            detail_mode: DetailMode::Pretty,
            ..Default::default()
        };
        view.columns.insert(
            "repr".into(),
            ColumnOverride {
                visible: Some(false),
                width: Some(40),
            },
        );

        store.save("g_model", &model).unwrap();
        store.save("g_view", &view).unwrap();

        assert_eq!(store.load::<ModelSettings>("g_model"), model);
        assert_eq!(store.load::<ViewSettings>("g_view"), view);
    }

    #[test]
    fn test_corrupt_data_gives_defaults() {
        let (_temp, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "this is = = not toml").unwrap();
        assert_eq!(store.load::<ViewSettings>("g_view"), ViewSettings::default());

        fs::write(store.path(), "[g_model]\nauto_refresh = \"yes\"\n").unwrap();
        assert_eq!(store.load::<ModelSettings>("g_model"), ModelSettings::default());

        // saving over a corrupt file starts a fresh document
        fs::write(store.path(), "= broken").unwrap();
        store.save("g_model", &ModelSettings::default()).unwrap();
        assert_eq!(store.load::<ModelSettings>("g_model"), ModelSettings::default());
    }

    #[test]
    fn test_partial_group_fills_defaults() {
        let (_temp, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "[g_model]\nshow_callables = false\n").unwrap();
        let model: ModelSettings = store.load("g_model");
        assert!(!model.filter.show_callables);
        assert!(model.filter.show_dunder_attributes);
        assert_eq!(model.refresh_rate_secs, DEFAULT_REFRESH_RATE_SECS);
    }

    #[test]
    fn test_reset() {
        let (_temp, store) = store();
        let view = ViewSettings {
            detail_mode: DetailMode::Source,
            ..Default::default()
        };
        store.save("g_view", &view).unwrap();
        store.reset("g_view").unwrap();
        assert_eq!(store.load::<ViewSettings>("g_view"), ViewSettings::default());
        store.reset("never_written").unwrap();
    }

    #[test]
    fn test_invalid_refresh_rate() {
        let model = ModelSettings {
            refresh_rate_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(model.refresh_interval(), Duration::from_secs(2));

        for rate in [-1.0, f64::NAN, f64::INFINITY, 1e300, 1e-12] {
            let model = ModelSettings {
                refresh_rate_secs: rate,
                ..Default::default()
            };
            assert_eq!(model.refresh_interval(), Duration::from_secs(2), "rate {rate}");
        }

        let model = ModelSettings {
            refresh_rate_secs: 0.25,
            ..Default::default()
        };
        assert_eq!(model.refresh_interval(), Duration::from_millis(250));
    }
}
