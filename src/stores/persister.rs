//! Background writer that applies store snapshots to key-value storage.
//!
//! Callers hand over a serialized snapshot and move on. The worker applies
//! writes in the order they were queued; a failed write is logged and the
//! previous value stays in storage.

use std::{
    sync::{mpsc, Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
};

use anyhow::{Context, Result};

use crate::storage::KeyValueStore;
use crate::{log_error, log_warn};

const ENABLE_LOGS: bool = true;

enum PersistCommand {
    Write { key: String, payload: String },
    Flush(mpsc::Sender<()>),
    Shutdown,
}

struct PersisterInner {
    sender: mpsc::Sender<PersistCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for PersisterInner {
    fn drop(&mut self) {
        let mut guard = self.worker.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(PersistCommand::Shutdown) {
                log_error!("Failed to send shutdown to persistence thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                log_error!("Failed to join persistence thread: {join_err:?}");
            }
        }
    }
}

#[derive(Clone)]
pub struct Persister {
    inner: Arc<PersisterInner>,
}

impl Persister {
    pub fn spawn(name: &str, storage: Arc<dyn KeyValueStore>) -> Result<Self> {
        let (command_tx, command_rx) = mpsc::channel::<PersistCommand>();

        let worker = thread::Builder::new()
            .name(format!("recipegen-persist-{name}"))
            .spawn(move || {
                while let Ok(command) = command_rx.recv() {
                    match command {
                        PersistCommand::Write { key, payload } => {
                            if let Err(err) = storage.set_item(&key, &payload) {
                                log_error!("Failed to persist {key}: {err:#}");
                            }
                        }
                        PersistCommand::Flush(reply) => {
                            let _ = reply.send(());
                        }
                        PersistCommand::Shutdown => break,
                    }
                }
            })
            .context("failed to spawn persistence worker thread")?;

        Ok(Self {
            inner: Arc::new(PersisterInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Queues `payload` as the new value for `key`.
    pub fn write(&self, key: &str, payload: String) {
        self.send(PersistCommand::Write {
            key: key.to_string(),
            payload,
        });
    }

    /// Blocks until every write queued before this call has been applied.
    pub fn flush(&self) {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.send(PersistCommand::Flush(reply_tx));
        if reply_rx.recv().is_err() {
            log_warn!("Persistence thread exited before flushing");
        }
    }

    fn send(&self, command: PersistCommand) {
        if self.inner.sender.send(command).is_err() {
            log_error!("Persistence thread is gone; dropping write");
        }
    }
}
