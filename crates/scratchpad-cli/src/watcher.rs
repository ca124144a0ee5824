//! File watcher for scratch files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{DebounceEventResult, new_debouncer, notify::RecursiveMode};
use tokio::sync::mpsc;

/// Change to the watched scratch file.
#[derive(Debug, Clone)]
pub enum FileEvent {
    /// File was written.
    Modified(PathBuf),
    /// File disappeared.
    Removed(PathBuf),
}

/// Watches a single scratch file.
pub struct FileWatcher {
    /// Debouncer handle (kept alive to maintain watcher).
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    rx: mpsc::UnboundedReceiver<FileEvent>,
}

impl FileWatcher {
    /// Watch `path`, debouncing bursts of writes.
    pub fn new(path: &Path, debounce: Duration) -> anyhow::Result<Self> {
        let target = path.to_path_buf();
        let watch_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let (tx, rx) = mpsc::unbounded_channel();

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            let events = match result {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("File watch error: {}", e);
                    return;
                }
            };

            for event in events {
                if event.path != target {
                    continue;
                }

                let file_event = if event.path.exists() {
                    FileEvent::Modified(event.path.clone())
                } else {
                    FileEvent::Removed(event.path.clone())
                };
                let _ = tx.send(file_event);
            }
        })
        .map_err(|e| anyhow::anyhow!("Failed to create file watcher: {}", e))?;

        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow::anyhow!("Failed to watch {}: {}", watch_dir.display(), e))?;

        Ok(Self {
            _debouncer: debouncer,
            rx,
        })
    }

    /// Receive the next file event.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_watcher_creation() {
        let temp = TempDir::new().unwrap();
        let scratch = temp.path().join("scratch.rs");
        fs::write(&scratch, "fn main() {}").unwrap();

        assert!(FileWatcher::new(&scratch, Duration::from_millis(100)).is_ok());
    }
}
