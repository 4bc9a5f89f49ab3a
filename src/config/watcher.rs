// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File watcher for hot-reloading a plan file.
//!
//! The parent directory is watched rather than the file itself so that
//! editors which save by renaming a temporary file are picked up too.
//! Changes are debounced, then the file is parsed and validated before a
//! `Reloaded` event is emitted.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::debug;

use super::PlanFile;

/// Events emitted by the config watcher
#[derive(Debug, Clone)]
pub enum ConfigEvent {
    /// Plan file was modified and successfully reloaded
    Reloaded(Box<PlanFile>),
    /// Plan file was modified but failed to load or validate
    Error(String),
    /// Plan file was deleted
    FileDeleted(PathBuf),
}

/// Plan file watcher with debouncing and validation
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    event_receiver: Receiver<ConfigEvent>,
    watched_path: PathBuf,
}

impl ConfigWatcher {
    /// Create a new watcher for the plan file at `path`
    ///
    /// # Arguments
    /// * `path` - Plan file to watch
    /// * `debounce_ms` - Debounce duration in milliseconds (default: 500)
    pub fn new<P: AsRef<Path>>(path: P, debounce_ms: Option<u64>) -> Result<Self> {
        let watched_path = path.as_ref().to_path_buf();
        let debounce_duration = Duration::from_millis(debounce_ms.unwrap_or(500));

        let file_name = watched_path
            .file_name()
            .map(|name| name.to_os_string())
            .ok_or_else(|| anyhow!("Not a file path: {:?}", watched_path))?;
        let directory = match watched_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx): (Sender<ConfigEvent>, Receiver<ConfigEvent>) = mpsc::channel();
        let (notify_tx, notify_rx): (Sender<Event>, Receiver<Event>) = mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default(),
        )
        .map_err(|e| anyhow!("Failed to create file watcher: {}", e))?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(|e| anyhow!("Failed to watch path {:?}: {}", directory, e))?;

        let reload_path = watched_path.clone();

        // Debounce thread
        std::thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;

            loop {
                match notify_rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(event) => {
                        let ours = event
                            .paths
                            .iter()
                            .any(|p| p.file_name() == Some(file_name.as_os_str()));
                        if !ours {
                            continue;
                        }
                        match event.kind {
                            EventKind::Remove(_) if !reload_path.exists() => {
                                let _ = event_tx.send(ConfigEvent::FileDeleted(reload_path.clone()));
                                last_event_time = None;
                            }
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                                last_event_time = Some(Instant::now());
                            }
                            _ => {}
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let settled = last_event_time
                            .is_some_and(|last| last.elapsed() >= debounce_duration);
                        if settled {
                            last_event_time = None;
                            debug!(path = ?reload_path, "plan file changed, reloading");
                            let event = match validate_config(&reload_path) {
                                Ok(plan) => ConfigEvent::Reloaded(Box::new(plan)),
                                Err(e) => ConfigEvent::Error(format!(
                                    "Failed to load {:?}: {:#}",
                                    reload_path, e
                                )),
                            };
                            if event_tx.send(event).is_err() {
                                break;
                            }
                        }
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        // Watcher was dropped, exit thread
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            event_receiver: event_rx,
            watched_path,
        })
    }

    /// Try to receive the next config event (non-blocking)
    pub fn try_recv(&self) -> Option<ConfigEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// Receive all pending config events
    pub fn recv_all(&self) -> Vec<ConfigEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }

    /// Get the path being watched
    pub fn watched_path(&self) -> &Path {
        &self.watched_path
    }
}

/// Load and fully validate a plan file without applying it
pub fn validate_config<P: AsRef<Path>>(path: P) -> Result<PlanFile> {
    let plan = PlanFile::load(path)?;
    plan.validate()?;
    Ok(plan)
}
