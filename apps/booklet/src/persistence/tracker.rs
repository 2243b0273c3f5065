//! Observable state of fire-and-forget saves.
//!
//! Every save runs as its own task. The tracker exposes one status per session:
//! `pending` while the newest save is in flight, then `saved` or `failed`. A save that
//! finishes after a newer one has started is logged but never overwrites the status.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::persistence::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Pending { what: String },
    Saved { what: String, at: DateTime<Utc> },
    Failed { what: String, message: String, at: DateTime<Utc> },
}

#[derive(Clone)]
pub struct SaveTracker {
    latest: Arc<AtomicU64>,
    status: Arc<watch::Sender<SaveStatus>>,
}

impl Default for SaveTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SaveStatus::Idle);
        Self {
            latest: Arc::new(AtomicU64::new(0)),
            status: Arc::new(tx),
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    /// Starts `save` on the runtime and marks it as the newest save.
    pub fn spawn<F>(&self, what: &str, save: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let what = what.to_string();
        self.status.send_replace(SaveStatus::Pending { what: what.clone() });

        let tracker = self.clone();
        tokio::spawn(async move {
            let result = save.await;
            tracker.finish(seq, what, result);
        })
    }

    fn finish(&self, seq: u64, what: String, result: Result<(), StoreError>) {
        let next = match result {
            Ok(()) => {
                info!("Saved {what}");
                SaveStatus::Saved {
                    what,
                    at: Utc::now(),
                }
            }
            Err(e) => {
                warn!("Saving {what} failed: {e}");
                SaveStatus::Failed {
                    what,
                    message: e.to_string(),
                    at: Utc::now(),
                }
            }
        };

        if self.latest.load(Ordering::SeqCst) != seq {
            debug!(seq, "Save superseded by a newer one; status left unchanged");
            return;
        }
        self.status.send_replace(next);
    }
}
