//! Configuration directory watcher
//!
//! Watches the configuration root for external edits and reloads the
//! manager once a burst of changes has settled. Files the manager wrote
//! itself are ignored; its cache already holds what it saved.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::manager::ConfigManager;

/// Quiet period after the last change before a reload runs
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

enum WatchMessage {
    Changed(Vec<PathBuf>),
    Stop,
}

/// Trailing-edge debouncer: fires once no event arrived for `window`
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_event: None,
        }
    }

    /// Record an event, pushing the deadline back
    pub fn notify(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Time left until the pending event fires, `None` when idle
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.last_event
            .map(|last| self.window.saturating_sub(now.saturating_duration_since(last)))
    }

    /// Consume the pending event if its quiet period has elapsed
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last_event {
            Some(last) if now.saturating_duration_since(last) >= self.window => {
                self.last_event = None;
                true
            }
            _ => false,
        }
    }
}

/// Reloads a [`ConfigManager`] when files under its root change
///
/// The worker thread stops when the watcher is dropped.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    sender: Sender<WatchMessage>,
    worker: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    /// Start watching with the default debounce window
    pub fn spawn(manager: Arc<ConfigManager>) -> ConfigResult<Self> {
        Self::with_debounce(manager, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(manager: Arc<ConfigManager>, debounce: Duration) -> ConfigResult<Self> {
        let root = manager.root().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| ConfigError::load_io(root.clone(), e))?;

        let (sender, receiver) = mpsc::channel();

        let event_sender = sender.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if is_relevant(&event) {
                        let _ = event_sender.send(WatchMessage::Changed(event.paths));
                    }
                }
                Err(e) => error!("File watching error: {}", e),
            },
            notify::Config::default(),
        )
        .map_err(|e| watch_error(&root, e))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| watch_error(&root, e))?;

        let worker = thread::Builder::new()
            .name("itemrender-config-watcher".to_string())
            .spawn(move || {
                let mut debouncer = Debouncer::new(debounce);
                let mut changed: HashSet<PathBuf> = HashSet::new();
                loop {
                    let message = match debouncer.remaining(Instant::now()) {
                        Some(wait) => receiver.recv_timeout(wait),
                        None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
                    };

                    match message {
                        Ok(WatchMessage::Changed(paths)) => {
                            changed.extend(paths.into_iter().filter(|path| is_json(path)));
                            debouncer.notify(Instant::now());
                        }
                        Ok(WatchMessage::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }

                    // Own writes are judged once the burst settles, after the
                    // writer has fingerprinted the file
                    if debouncer.ready(Instant::now()) {
                        let external: Vec<PathBuf> = changed
                            .drain()
                            .filter(|path| !manager.is_own_write(path))
                            .collect();
                        if external.is_empty() {
                            debug!("Only this process changed configuration files");
                            continue;
                        }

                        debug!(paths = ?external, "Configuration files changed; reloading");
                        if let Err(e) = manager.invalidate_and_reload() {
                            warn!(error = %e, "Reload after external change failed");
                        }
                    }
                }
                debug!("Configuration watcher stopped");
            })
            .map_err(|e| ConfigError::load_io(root.clone(), e))?;

        info!(root = %root.display(), "Watching configuration directory");

        Ok(Self {
            _watcher: watcher,
            sender,
            worker: Some(worker),
        })
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        let _ = self.sender.send(WatchMessage::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Only content changes to JSON files count
fn is_relevant(event: &Event) -> bool {
    if event.kind.is_access() {
        return false;
    }
    event.paths.iter().any(|path| is_json(path))
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

fn watch_error(root: &Path, e: notify::Error) -> ConfigError {
    ConfigError::load_io(root.to_path_buf(), io::Error::new(io::ErrorKind::Other, e.to_string()))
}
