//! File watching for rule cache invalidation
//!
//! Watches rule files and flushes a shared [`RuleCache`] when any of them
//! changes, so the next lookup reloads from disk.

use crate::cache::RuleCache;
use anyhow::{Result, anyhow};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use parking_lot::Mutex;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, channel};
use std::time::Duration;

/// Event emitted after the cache reacted to a file change
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// A watched rule file changed and the cache was flushed
    Flushed(PathBuf),
    /// An error occurred while watching
    Error(String),
}

/// Flushes a rule cache whenever a watched rule file changes
pub struct CacheWatcher {
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    receiver: Receiver<WatchEvent>,
    watched_paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl CacheWatcher {
    /// Create a watcher bound to `cache`
    ///
    /// # Arguments
    ///
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 100)
    pub fn new<K, V>(cache: Arc<RuleCache<K, V>>, debounce_ms: Option<u64>) -> Result<Self>
    where
        K: Eq + Hash + Clone + Send + Sync + 'static,
        V: Send + Sync + 'static,
    {
        let (tx, rx) = channel();
        let watched_paths = Arc::new(Mutex::new(Vec::<PathBuf>::new()));
        let watched = watched_paths.clone();

        let debounce = Duration::from_millis(debounce_ms.unwrap_or(100));

        let debouncer = new_debouncer(
            debounce,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let changed = events
                        .into_iter()
                        .map(|event| event.path)
                        .find(|path| watched.lock().contains(path));

                    if let Some(path) = changed {
                        tracing::info!("Rule file changed: {}", path.display());
                        cache.flush();
                        let _ = tx.send(WatchEvent::Flushed(path));
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchEvent::Error(format!("Watch error: {:?}", e)));
                }
            },
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {:?}", e))?;

        Ok(Self {
            debouncer,
            receiver: rx,
            watched_paths,
        })
    }

    /// Watch a rule file
    pub fn watch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        self.debouncer
            .watcher()
            .watch(&canonical, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {}: {}", canonical.display(), e))?;

        {
            let mut watched = self.watched_paths.lock();
            if !watched.contains(&canonical) {
                watched.push(canonical.clone());
            }
        }

        tracing::info!("Watching: {}", canonical.display());
        Ok(())
    }

    /// Stop watching a rule file
    pub fn unwatch(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        self.watched_paths.lock().retain(|p| p != &canonical);

        self.debouncer
            .watcher()
            .unwatch(&canonical)
            .map_err(|e| anyhow!("Failed to unwatch path {}: {}", canonical.display(), e))?;

        Ok(())
    }

    /// Paths currently watched
    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched_paths.lock().clone()
    }

    /// Try to receive a watch event (non-blocking)
    pub fn try_recv(&self) -> Option<WatchEvent> {
        self.receiver.try_recv().ok()
    }

    /// Receive a watch event with timeout
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WatchEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Get all pending events
    pub fn drain_events(&self) -> Vec<WatchEvent> {
        self.receiver.try_iter().collect()
    }
}
