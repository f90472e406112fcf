//! Replacement runs on a background thread.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvError};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::document::Document;
use crate::replace::{ReplaceResult, SearchReplacePair, TextReplacer};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub pairs: Vec<SearchReplacePair>,
    pub case_sensitive: bool,
}

/// Exactly one event is sent per job.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    Finished(ReplaceResult),
    Failed(String),
}

/// A running job: its thread and the channel its outcome arrives on.
#[derive(Debug)]
pub struct WorkerHandle {
    thread: JoinHandle<()>,
    events: Receiver<WorkerEvent>,
}

impl WorkerHandle {
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Block until the job reports, then reap the thread.
    pub fn wait(self) -> std::result::Result<WorkerEvent, RecvError> {
        let event = self.events.recv();
        if self.thread.join().is_err() {
            log::error!("[Worker] replace thread panicked");
        }
        event
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReplaceWorker {
    config: EditorConfig,
}

impl ReplaceWorker {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    /// Open `job.input` with `D::load` and run the job on a new thread.
    pub fn spawn<D: Document + 'static>(&self, job: ReplaceJob) -> WorkerHandle {
        self.spawn_with(job, |path: &Path| D::load(path))
    }

    /// Like [`spawn`](Self::spawn) with a custom loader.
    ///
    /// The document is created, used and dropped on the worker thread.
    pub fn spawn_with<D, F>(&self, job: ReplaceJob, loader: F) -> WorkerHandle
    where
        D: Document + 'static,
        F: FnOnce(&Path) -> Result<D> + Send + 'static,
    {
        let (tx, events) = mpsc::channel();
        let replacer = TextReplacer::new(&self.config);

        let thread = thread::spawn(move || {
            log::info!("[Worker] replacing {} pair(s) in {}", job.pairs.len(), job.input.display());
            let outcome = loader(&job.input).and_then(|mut doc| {
                replacer.replace_text(&mut doc, &job.pairs, &job.output, job.case_sensitive)
            });
            let event = match outcome {
                Ok(result) => WorkerEvent::Finished(result),
                Err(e) => {
                    log::error!("[Worker] job for {} failed: {}", job.input.display(), e);
                    WorkerEvent::Failed(e.to_string())
                }
            };
            if tx.send(event).is_err() {
                log::warn!("[Worker] receiver dropped before the job reported");
            }
        });

        WorkerHandle { thread, events }
    }
}
