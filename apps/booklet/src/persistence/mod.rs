//! Order persistence: the only place that talks to the backend that stores booklet order.
//!
//! The backend accepts two payloads, both a plain ordered id list:
//! - question order of a test: `POST {base}/api/gat-tests/{test_id}/save-order/`
//! - option order of a question: `POST {base}/api/bank-questions/{question_id}/save-option-order/`
//!
//! Saves are optimistic. The in-memory order is already updated when a save starts, and a
//! failed save is reported through `SaveTracker` without rolling anything back.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{BlockId, OptionId};

pub mod tracker;

pub use tracker::{SaveStatus, SaveTracker};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected save (status {status}): {message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Unavailable(String),
}

/// Backend that stores the authoritative order between sessions.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn save_question_order(&self, test_id: i64, order: &[BlockId]) -> Result<(), StoreError>;

    async fn save_option_order(
        &self,
        question_id: BlockId,
        order: &[OptionId],
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize)]
struct OrderPayload<'a, T> {
    order: &'a [T],
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP backend
// ────────────────────────────────────────────────────────────────────────────

/// Store backed by the school portal's JSON endpoints.
#[derive(Clone)]
pub struct HttpOrderStore {
    client: Client,
    base_url: String,
}

impl HttpOrderStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn question_order_url(&self, test_id: i64) -> String {
        format!("{}/api/gat-tests/{}/save-order/", self.base_url, test_id)
    }

    fn option_order_url(&self, question_id: BlockId) -> String {
        format!(
            "{}/api/bank-questions/{}/save-option-order/",
            self.base_url, question_id
        )
    }

    async fn post_order<T: Serialize + Sync>(&self, url: &str, order: &[T]) -> Result<(), StoreError> {
        let response = self
            .client
            .post(url)
            .json(&OrderPayload { order })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Saved order of {} ids to {url}", order.len());
        Ok(())
    }
}

#[async_trait]
impl OrderStore for HttpOrderStore {
    async fn save_question_order(&self, test_id: i64, order: &[BlockId]) -> Result<(), StoreError> {
        self.post_order(&self.question_order_url(test_id), order).await
    }

    async fn save_option_order(
        &self,
        question_id: BlockId,
        order: &[OptionId],
    ) -> Result<(), StoreError> {
        self.post_order(&self.option_order_url(question_id), order)
            .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory backend
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store, used when no backend is configured.
#[derive(Default)]
pub struct InMemoryOrderStore {
    questions: Mutex<HashMap<i64, Vec<BlockId>>>,
    options: Mutex<HashMap<BlockId, Vec<OptionId>>>,
    outage: Mutex<Option<String>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following save fail with `reason` until cleared with `None`.
    #[cfg(test)]
    pub async fn set_outage(&self, reason: Option<&str>) {
        *self.outage.lock().await = reason.map(str::to_string);
    }

    #[cfg(test)]
    pub async fn question_order(&self, test_id: i64) -> Option<Vec<BlockId>> {
        self.questions.lock().await.get(&test_id).cloned()
    }

    #[cfg(test)]
    pub async fn option_order(&self, question_id: BlockId) -> Option<Vec<OptionId>> {
        self.options.lock().await.get(&question_id).cloned()
    }

    async fn check_available(&self) -> Result<(), StoreError> {
        match self.outage.lock().await.as_ref() {
            Some(reason) => Err(StoreError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn save_question_order(&self, test_id: i64, order: &[BlockId]) -> Result<(), StoreError> {
        self.check_available().await?;
        self.questions.lock().await.insert(test_id, order.to_vec());
        Ok(())
    }

    async fn save_option_order(
        &self,
        question_id: BlockId,
        order: &[OptionId],
    ) -> Result<(), StoreError> {
        self.check_available().await?;
        self.options.lock().await.insert(question_id, order.to_vec());
        Ok(())
    }
}
