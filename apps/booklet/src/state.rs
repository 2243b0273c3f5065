use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::booklet::BookletSession;
use crate::config::Config;
use crate::layout::SheetConfig;
use crate::persistence::OrderStore;

/// One open booklet. Each has its own lock so edits to different booklets never wait on
/// each other.
pub type SharedSession = Arc<Mutex<BookletSession>>;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Where question and option order is saved. HTTP backend or in-memory fallback.
    pub store: Arc<dyn OrderStore>,
    /// Open booklets, keyed by session id.
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
    pub sheet_config: SheetConfig,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn OrderStore>) -> Self {
        Self {
            store,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            sheet_config: config.sheet_config(),
        }
    }

    pub async fn insert_session(&self, session: BookletSession) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn session(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    /// Drops every session idle for at least `max_idle`. Sessions locked by a request in
    /// flight are in use and stay. Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) => session.idle_for() < max_idle,
            Err(_) => true,
        });
        before - sessions.len()
    }
}

/// Periodically evicts idle sessions for the lifetime of the process.
pub fn spawn_session_sweeper(state: AppState, max_idle: Duration) -> JoinHandle<()> {
    let every = max_idle.min(Duration::from_secs(60)).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = state.evict_idle(max_idle).await;
            if evicted > 0 {
                info!(evicted, "Evicted idle booklet sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DocumentOrder, SheetBuilder, SheetHeader};
    use crate::persistence::InMemoryOrderStore;

    fn make_state() -> AppState {
        AppState::new(&Config::default(), Arc::new(InMemoryOrderStore::new()))
    }

    fn make_session() -> BookletSession {
        let builder = SheetBuilder::new(Config::default().sheet_config(), SheetHeader::default());
        BookletSession::open(1, DocumentOrder::default(), builder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_keeps_recently_touched_sessions() {
        let state = make_state();
        let stale = state.insert_session(make_session()).await;
        let fresh = state.insert_session(make_session()).await;

        tokio::time::advance(Duration::from_secs(120)).await;
        if let Some(session) = state.session(fresh).await {
            session.lock().await.touch();
        }

        assert_eq!(state.evict_idle(Duration::from_secs(60)).await, 1);
        assert!(state.session(stale).await.is_none());
        assert!(state.session(fresh).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_evict_idle_skips_sessions_in_use() {
        let state = make_state();
        let id = state.insert_session(make_session()).await;
        tokio::time::advance(Duration::from_secs(120)).await;

        let session = state.session(id).await.unwrap();
        let _guard = session.lock().await;
        assert_eq!(state.evict_idle(Duration::from_secs(60)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let state = make_state();
        let id = state.insert_session(make_session()).await;
        let sweeper = spawn_session_sweeper(state.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(state.session(id).await.is_none());
        sweeper.abort();
    }

    #[tokio::test]
    async fn test_remove_session() {
        let state = make_state();
        let id = state.insert_session(make_session()).await;
        assert!(state.remove_session(id).await);
        assert!(!state.remove_session(id).await);
    }
}
