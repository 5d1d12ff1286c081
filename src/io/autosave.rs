// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Background autosave.
//!
//! The editor hands project snapshots to a worker thread over a channel.
//! The worker only ever holds clones, keeps the latest one and writes it
//! to disk once per interval. Stopping flushes any pending snapshot.

use super::serialization;
use crate::models::Project;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

enum Message {
    Snapshot(Box<Project>),
    Stop,
}

/// Handle to a running autosave worker. Dropping it stops the worker.
pub struct AutosaveTask {
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl AutosaveTask {
    pub fn spawn(path: PathBuf, interval: Duration) -> Self {
        log::info!(
            "Autosave every {}s to {}",
            interval.as_secs_f64(),
            path.display()
        );
        let (sender, receiver) = channel::<Message>();

        let handle = std::thread::spawn(move || {
            let mut pending: Option<Box<Project>> = None;
            let mut deadline = Instant::now() + interval;
            loop {
                let wait = deadline.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(wait) {
                    Ok(Message::Snapshot(project)) => pending = Some(project),
                    Ok(Message::Stop) | Err(RecvTimeoutError::Disconnected) => {
                        if let Some(project) = pending.take() {
                            write(&project, &path);
                        }
                        break;
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if let Some(project) = pending.take() {
                            write(&project, &path);
                        }
                        deadline = Instant::now() + interval;
                    }
                }
            }
            log::debug!("Autosave worker stopped");
        });

        Self {
            sender,
            handle: Some(handle),
        }
    }

    /// Queue the latest project state. Best effort: a stopped worker is
    /// ignored.
    pub fn update(&self, project: &Project) {
        let _ = self.sender.send(Message::Snapshot(Box::new(project.clone())));
    }

    /// Stop the worker, flushing a pending snapshot first.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.sender.send(Message::Stop);
            if handle.join().is_err() {
                log::error!("Autosave worker panicked");
            }
        }
    }
}

impl Drop for AutosaveTask {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn write(project: &Project, path: &Path) {
    match serialization::save_project(project, path) {
        Ok(()) => log::info!("Autosaved '{}' to {}", project.name, path.display()),
        Err(e) => log::warn!("Autosave failed: {:#}", e),
    }
}
