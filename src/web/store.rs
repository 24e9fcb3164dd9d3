use flyercal::Session;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

/// Idle time after which a session is dropped
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
struct Entry {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_seen) >= ttl
    }
}

/// In-memory sessions keyed by the session cookie.
///
/// Each session sits behind its own mutex so one user's slow extraction only
/// blocks that user's later requests. Sessions idle for longer than the ttl
/// are pruned whenever a new one is created.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_ttl(SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up a live session without creating one
    pub async fn get(&self, id: Option<Uuid>) -> Option<Arc<Mutex<Session>>> {
        let id = id?;
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        if entry.is_expired(now, self.ttl) {
            return None;
        }
        entry.last_seen = now;
        Some(entry.session.clone())
    }

    /// Look up a session, creating a fresh one for unknown, expired or missing ids
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, Arc<Mutex<Session>>) {
        if let Some(id) = id {
            if let Some(session) = self.get(Some(id)).await {
                return (id, session);
            }
        }

        let now = Instant::now();
        let ttl = self.ttl;
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now, ttl));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!(pruned, "Dropped idle sessions");
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new()));
        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        debug!(session = %id, "Created session");
        (id, session)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
