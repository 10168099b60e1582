//! Session store for independent conversations keyed by session id.
//!
//! Each session sits behind its own mutex, so turns for one session are
//! serialized while different sessions proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversation::{self, ConversationPhase, INITIAL_GREETING, SessionState, TurnReply};
use crate::feature::{Collected, FeatureKind, FieldPath};

/// Session used when a caller does not name one.
pub const DEFAULT_SESSION: &str = "default";

struct SessionEntry {
    state: SessionState,
    last_active: DateTime<Utc>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            state: SessionState::new(),
            last_active: Utc::now(),
        }
    }
}

/// Snapshot of one session for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: String,
    pub phase: ConversationPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_type: Option<FeatureKind>,
    pub remaining_fields: Vec<FieldPath>,
    pub collected: Collected,
    pub last_active: DateTime<Utc>,
}

/// In-memory conversations, one [`SessionState`] per session id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionEntry>>>>,
}

impl SessionStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
        })
    }

    /// Normalize a caller-supplied id; blank or missing means the default session.
    pub fn resolve_id(session_id: Option<&str>) -> String {
        match session_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => DEFAULT_SESSION.to_string(),
        }
    }

    async fn entry(&self, session_id: &str) -> Arc<Mutex<SessionEntry>> {
        if let Some(entry) = self.sessions.read().await.get(session_id) {
            return Arc::clone(entry);
        }
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(session_id.to_string()).or_insert_with(|| {
            debug!(session_id, "Session created");
            Arc::new(Mutex::new(SessionEntry::new()))
        });
        Arc::clone(entry)
    }

    /// Start a brand-new session under a fresh id.
    pub async fn create(&self) -> (String, &'static str) {
        let session_id = Uuid::new_v4().to_string();
        self.entry(&session_id).await;
        info!(session_id = %session_id, "New session started");
        (session_id, INITIAL_GREETING)
    }

    /// Run one conversation turn for `session_id`, creating the session if needed.
    pub async fn advance(&self, session_id: &str, text: &str) -> TurnReply {
        let entry = self.entry(session_id).await;
        let mut entry = entry.lock().await;
        let reply = conversation::advance(text, &mut entry.state);
        entry.last_active = Utc::now();
        debug!(
            session_id,
            phase = %entry.state.phase(),
            finalized = reply.yaml.is_some(),
            "Turn processed"
        );
        reply
    }

    /// Start `session_id` over from type selection.
    pub async fn reset(&self, session_id: &str) -> TurnReply {
        let entry = self.entry(session_id).await;
        let mut entry = entry.lock().await;
        entry.last_active = Utc::now();
        info!(session_id, "Session reset");
        conversation::reset(&mut entry.state)
    }

    pub async fn status(&self, session_id: &str) -> Option<SessionStatus> {
        let entry = Arc::clone(self.sessions.read().await.get(session_id)?);
        let entry = entry.lock().await;
        Some(SessionStatus {
            session_id: session_id.to_string(),
            phase: entry.state.phase(),
            feature_type: entry.state.active_variant,
            remaining_fields: entry.state.pending_fields.iter().copied().collect(),
            collected: entry.state.collected.clone(),
            last_active: entry.last_active,
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        self.prune_idle_at(Utc::now(), max_idle).await
    }

    async fn prune_idle_at(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| match entry.try_lock() {
            Ok(entry) => (now - entry.last_active).to_std().unwrap_or_default() <= max_idle,
            // Mid-turn, so not idle.
            Err(_) => true,
        });
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Pruned idle sessions");
        }
        removed
    }
}

/// Spawn a background task that periodically prunes idle sessions.
pub fn spawn_sweep_task(
    store: Arc<SessionStore>,
    interval: Duration,
    max_idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            store.prune_idle(max_idle).await;
        }
    })
}
