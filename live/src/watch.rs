use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};

use cardpress::error;
use cardpress::error::Result;
use cardpress::pipeline::Change;

/// Batches file system events that arrive within this window.
pub const DEBOUNCE: Duration = Duration::from_millis(50);

/// Watches a directory tree for as long as it's alive.
pub struct FsWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl FsWatcher {
    /// Starts watching `root` recursively. Each debounced batch of events
    /// arrives on the returned receiver as one [`Change`].
    pub fn new(root: &Path) -> Result<(FsWatcher, mpsc::Receiver<Change>)> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(DEBOUNCE, move |res: Result<Vec<DebouncedEvent>, notify::Error>| {
            match res {
                Ok(events) => {
                    for event in &events {
                        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "file system event");
                    }

                    let change = Change::new(events.into_iter().map(|event| event.path));
                    if tx.send(change).is_err() {
                        tracing::debug!("change receiver dropped");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "file system watch error"),
            }
        }).map_err(|e| error!("failed to create file system watcher", "reason" => e))?;

        debouncer.watcher()
            .watch(root, RecursiveMode::Recursive)
            .map_err(|e| error!("failed to watch asset directory", "path" => root.display(), "reason" => e))?;

        tracing::info!(path = %root.display(), "watching for changes");
        Ok((FsWatcher { _debouncer: debouncer }, rx))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::Duration;

    use super::*;

    #[test]
    fn reports_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let (_watcher, rx) = FsWatcher::new(&root).unwrap();

        let data = root.join("_card.csv");
        fs::write(&data, "name\nA\n").unwrap();

        let change = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(change.paths.contains(&data));
    }

    #[test]
    fn missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsWatcher::new(&dir.path().join("gone")).is_err());
    }
}
