//! Watch mode: debounced re-analysis whenever a PHP file changes.

use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use tracing::debug;

/// Debounced file watcher driving repeated analysis runs.
pub struct FileWatcher {
    debounce: Duration,
}

impl FileWatcher {
    pub fn new() -> Self {
        Self {
            debounce: Duration::from_millis(500),
        }
    }

    /// Watch `path` and invoke `on_change` after each relevant change
    /// batch; the callback returns `false` to stop watching.
    pub fn watch<F>(&self, path: &Path, mut on_change: F) -> notify::Result<()>
    where
        F: FnMut() -> bool,
    {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(self.debounce, move |result: DebounceEventResult| {
            let _ = tx.send(result);
        })?;
        debouncer.watcher().watch(path, RecursiveMode::Recursive)?;

        while let Ok(result) = rx.recv() {
            match result {
                Ok(events) => {
                    let relevant = events.iter().any(|event| {
                        event
                            .path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
                    });
                    if !relevant {
                        continue;
                    }
                    debug!(count = events.len(), "file change batch");
                    if !on_change() {
                        break;
                    }
                }
                Err(error) => {
                    debug!(?error, "watch error; continuing");
                }
            }
        }
        Ok(())
    }
}

impl Default for FileWatcher {
    fn default() -> Self {
        Self::new()
    }
}
