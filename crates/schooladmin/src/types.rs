//! Shared application state.

use crate::api::{ApiClient, ApiError, SessionKey};
use crate::config::DashboardConfig;
use crate::timetable::EditSession;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// An editing session and the last time a request touched it.
pub struct SessionEntry {
    session: Arc<Mutex<EditSession>>,
    last_used: Instant,
}

impl SessionEntry {
    fn new(session: EditSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_used: Instant::now(),
        }
    }

    /// Idle sessions are kept while a request still holds them.
    fn is_live(&self, max_idle: Duration) -> bool {
        self.last_used.elapsed() < max_idle || Arc::strong_count(&self.session) > 1
    }
}

/// State handed to every request handler.
pub struct AppState {
    pub config: DashboardConfig,
    pub api: ApiClient,
    /// One editing session per bearer credential
    pub sessions: DashMap<SessionKey, SessionEntry>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(config.api.clone())?;
        Ok(Self {
            config,
            api,
            sessions: DashMap::new(),
        })
    }

    /// Gets or creates the editing session for `key` and marks it as used.
    pub fn session(&self, key: &SessionKey) -> Arc<Mutex<EditSession>> {
        let mut entry = self
            .sessions
            .entry(key.clone())
            .or_insert_with(|| SessionEntry::new(EditSession::new(self.config.timetable.clone())));
        entry.last_used = Instant::now();
        entry.session.clone()
    }

    /// Drops the editing session for `key`, if any.
    pub fn end_session(&self, key: &SessionKey) -> bool {
        self.sessions.remove(key).is_some()
    }

    /// Drops sessions idle for at least `max_idle` and evicts expired
    /// directory cache entries. Returns how many sessions were dropped.
    pub fn sweep(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.is_live(max_idle));
        self.api.cleanup_cache();
        before.saturating_sub(self.sessions.len())
    }

    /// Runs [`sweep`](Self::sweep) every `server.sweep_interval_secs`.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let max_idle = Duration::from_secs(state.config.server.session_idle_secs);
        let period = Duration::from_secs(state.config.server.sweep_interval_secs.max(1));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let dropped = state.sweep(max_idle);
                if dropped > 0 {
                    debug!(dropped, remaining = state.sessions.len(), "Dropped idle sessions");
                }
            }
        })
    }
}
