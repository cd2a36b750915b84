//! File watcher for the document being browsed
//!
//! Watches the directory holding the file rather than the file itself, since
//! many editors save by replacing the file.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, trace, warn};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Reports changes to one file
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<Result<Event, notify::Error>>,
    file: PathBuf,
}

impl FileWatcher {
    /// Start watching `file`
    pub fn new(file: &Path) -> Result<Self> {
        let file = file
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", file.display()))?;
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        info!("Watching {} for changes", file.display());

        let (tx, rx) = channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default().with_poll_interval(Duration::from_millis(500)),
        )?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
            file,
        })
    }

    /// Drain pending events; true if any of them touched the file
    pub fn poll_changed(&self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        trace!("Ignoring access event: {:?}", event);
                        continue;
                    }
                    if event.paths.iter().any(|p| self.is_watched_file(p)) {
                        debug!("File event {:?}: {}", event.kind, self.file.display());
                        changed = true;
                    }
                }
                Err(e) => {
                    warn!("File watcher error: {:?}", e);
                }
            }
        }
        changed
    }

    fn is_watched_file(&self, path: &Path) -> bool {
        path == self.file
            || path
                .canonicalize()
                .map(|p| p == self.file)
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread::sleep;
    use std::time::Instant;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(FileWatcher::new(&temp.path().join("absent.json")).is_err());
    }

    #[test]
    fn test_reports_writes() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("data.json");
        fs::write(&file, "[1]").unwrap();
        let watcher = FileWatcher::new(&file).unwrap();

        fs::write(&file, "[1, 2]").unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut changed = false;
        while !changed && Instant::now() < deadline {
            changed = watcher.poll_changed();
            sleep(Duration::from_millis(50));
        }
        assert!(changed);
    }
}
