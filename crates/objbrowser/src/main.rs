use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use log::{info, warn};

use obj_tree::enumerate::EnumerateOptions;
use obj_tree::Inspect;
use objbrowser::column::columns_by_name;
use objbrowser::demo::demo_value;
use objbrowser::detail::DetailMode;
use objbrowser::render::{render_details, render_table};
use objbrowser::settings::SettingsStore;
use objbrowser::watcher::FileWatcher;
use objbrowser::ObjectBrowser;

#[derive(Parser)]
#[command(name = "objbrowser")]
#[command(about = "Browse the structure of a JSON or TOML document")]
struct Cli {
    /// JSON or TOML file to browse; without one a demo object graph is shown
    file: Option<PathBuf>,

    /// Show the demo object graph
    #[arg(long, conflicts_with = "file")]
    demo: bool,

    /// Name of the inspected value; an empty name shows its children at the top
    #[arg(long, short)]
    name: Option<String>,

    /// Expand this many levels
    #[arg(long, short, default_value = "1")]
    depth: usize,

    /// Comma separated columns to show
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Show at most this many items of a container
    #[arg(long)]
    max_items: Option<usize>,

    #[arg(long)]
    hide_callables: bool,

    #[arg(long)]
    hide_dunder: bool,

    /// What to show for the selected node
    #[arg(long, value_enum)]
    detail: Option<DetailMode>,

    /// Accessor path of the node to select, e.g. "data['items'][0]"
    #[arg(long)]
    select: Option<String>,

    /// Keep running and refresh whenever the file changes
    #[arg(long, requires = "file")]
    watch: bool,

    /// Seconds between refreshes while watching
    #[arg(long)]
    interval: Option<f64>,

    /// Window instance number, settings are kept per instance
    #[arg(long, default_value = "1")]
    instance: u32,

    /// Neither read nor write stored settings
    #[arg(long)]
    no_settings: bool,

    /// Forget the stored settings of this window first
    #[arg(long)]
    reset_settings: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let store = if cli.no_settings {
        None
    } else {
        SettingsStore::in_config_dir()
    };

    match (&cli.file, cli.demo) {
        (Some(path), false) => {
            let value = load_document(path)?;
            let name = cli.name.clone().unwrap_or_else(|| default_name(path));
            let mut browser = open(cli, value, name, store.as_ref())?;
            if cli.watch {
                watch(&mut browser, path)?;
            }
            Ok(())
        }
        _ => {
            let name = cli.name.clone().unwrap_or_else(|| "demo".to_string());
            open(cli, demo_value(), name, store.as_ref()).map(|_| ())
        }
    }
}

/// Parse a JSON or TOML file, going by its extension
fn load_document(path: &Path) -> Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);
    if is_toml {
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    } else {
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string())
}

/// Set up a browser from stored settings and the command line, then print it
fn open<V: Inspect>(
    cli: &Cli,
    value: V,
    name: String,
    store: Option<&SettingsStore>,
) -> Result<ObjectBrowser<V>> {
    let options = EnumerateOptions {
        max_structural_items: cli.max_items,
    };
    let mut browser = ObjectBrowser::with_options(value, name, options).with_instance(cli.instance);
    if !cli.columns.is_empty() {
        let names: Vec<&str> = cli.columns.iter().map(String::as_str).collect();
        browser = browser.with_columns(columns_by_name(&names).map_err(|e| anyhow!(e))?);
    }

    let now = Instant::now();
    if let Some(store) = store {
        if cli.reset_settings {
            browser.reset_settings(store)?;
        }
        browser.load_settings(store, now)?;
    }

    if cli.hide_callables {
        browser.set_show_callables(false);
    }
    if cli.hide_dunder {
        browser.set_show_dunder_attributes(false);
    }
    if let Some(mode) = cli.detail {
        browser.set_detail_mode(mode);
    }
    if let Some(secs) = cli.interval {
        browser.set_refresh_interval(interval_from_secs(secs)?, now)?;
    }

    browser.expand_to_depth(cli.depth)?;
    if let Some(path) = &cli.select {
        match browser.reveal(path)? {
            Some(id) => browser.select(id),
            None => warn!("no node with path {path:?}"),
        }
    }

    print!("{}", render_table(&browser));
    println!();
    print!("{}", render_details(&browser));

    if let Some(store) = store {
        browser.save_settings(store)?;
    }
    Ok(browser)
}

fn interval_from_secs(secs: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(secs) {
        Ok(interval) if !interval.is_zero() => Ok(interval),
        _ => bail!("--interval must be a positive number of seconds, got {secs}"),
    }
}

/// Re-read the file whenever it changes and refresh on every timer tick
fn watch(browser: &mut ObjectBrowser<serde_json::Value>, path: &Path) -> Result<()> {
    let watcher = FileWatcher::new(path)?;
    browser.set_auto_refresh(true, Instant::now());
    info!(
        "watching {} every {:?}",
        path.display(),
        browser.timer().interval()
    );

    loop {
        let now = Instant::now();
        sleep(
            browser
                .timer()
                .time_until_due(now)
                .unwrap_or_else(|| browser.timer().interval()),
        );

        let reloaded = watcher.poll_changed()
            && match load_document(path) {
                Ok(value) => {
                    browser.set_value(value);
                    true
                }
                Err(e) => {
                    warn!("keeping the previous contents: {e:#}");
                    false
                }
            };

        if let Some(stats) = browser.tick(Instant::now()) {
            if reloaded {
                info!("{}: {stats}", path.display());
                println!();
                print!("{}", render_table(browser));
                println!();
                print!("{}", render_details(browser));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_secs() {
        assert_eq!(interval_from_secs(0.5).unwrap(), Duration::from_millis(500));
        for secs in [0.0, -3.0, 1e-12, 1e300, f64::NAN, f64::INFINITY] {
            assert!(interval_from_secs(secs).is_err(), "secs {secs}");
        }
    }
}
