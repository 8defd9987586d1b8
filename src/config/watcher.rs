//! Controls file watcher for hot-reload support

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::binding::Binding;
use crate::prefs;
use crate::registry::ActionRegistry;

/// Watches the controls file and delivers freshly parsed binding lists
pub struct ControlsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Vec<Binding>>,
}

impl ControlsWatcher {
    /// Start watching `path`. The containing directory is watched so that
    /// editors that save by rename are picked up too.
    pub fn new(path: impl Into<PathBuf>, registry: Arc<ActionRegistry>) -> Result<Self> {
        let path = path.into();
        let (tx, rx) = mpsc::channel(10);

        // notify callbacks run on their own OS thread, not in Tokio context
        let runtime_handle = tokio::runtime::Handle::current();
        let file_name = path.file_name().map(|n| n.to_os_string());
        let watched = path.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if !touches_file {
                        return;
                    }
                    debug!("Controls file modified: {:?}", event.paths);

                    let path = watched.clone();
                    let registry = registry.clone();
                    let tx = tx.clone();
                    runtime_handle.spawn(async move {
                        // Debounce: wait a bit for file writes to complete
                        tokio::time::sleep(Duration::from_millis(100)).await;

                        match prefs::load_controls(&path, &registry).await {
                            Ok(bindings) => {
                                info!("Controls reloaded ({} bindings)", bindings.len());
                                if let Err(e) = tx.send(bindings).await {
                                    error!("Failed to send controls update: {}", e);
                                }
                            }
                            Err(e) => {
                                warn!("Failed to reload controls (keeping old list): {:#}", e);
                            }
                        }
                    });
                }
                Err(e) => {
                    error!("Watch error: {}", e);
                }
            }
        })?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch controls file: {}", path.display()))?;

        info!("Controls file watcher started for: {}", path.display());

        Ok(Self { _watcher: watcher, rx })
    }

    /// Wait for the next reloaded list.
    /// Returns None if the watcher has been closed
    pub async fn next_bindings(&mut self) -> Option<Vec<Binding>> {
        self.rx.recv().await
    }
}
