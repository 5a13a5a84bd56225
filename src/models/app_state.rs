use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use crate::gateway::CommandGateway;
use crate::services::{random_session_id, CredentialDirectory, ServerRegistry};

/// A logged-in browser, known by the random id in its cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Lowercase username
    pub username: String,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Session {
            username: username.into(),
            issued_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialDirectory>,
    pub sessions: Arc<Mutex<HashMap<String, Session>>>,
    pub flash_store: Arc<Mutex<HashMap<String, Vec<String>>>>,
    pub gateway: Arc<dyn CommandGateway>,
    pub registry: Arc<ServerRegistry>,
    pub app_name: String,
    pub session_ttl_hours: i64,
}

impl AppState {
    pub fn new(
        credentials: Arc<dyn CredentialDirectory>,
        gateway: Arc<dyn CommandGateway>,
        registry: Arc<ServerRegistry>,
        app_name: String,
        session_ttl_hours: i64,
    ) -> Self {
        AppState {
            credentials,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            flash_store: Arc::new(Mutex::new(HashMap::new())),
            gateway,
            registry,
            app_name,
            session_ttl_hours,
        }
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.issued_at >= Duration::hours(self.session_ttl_hours)
    }

    /// Issues a new session id for `username`. Expired sessions and their
    /// flashes are dropped on the way.
    pub fn start_session(&self, username: &str) -> String {
        let now = Utc::now();
        let sid = random_session_id();
        let mut sessions = self.sessions.lock();
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| self.is_expired(s, now))
            .map(|(id, _)| id.clone())
            .collect();
        if !expired.is_empty() {
            let mut flashes = self.flash_store.lock();
            for id in &expired {
                sessions.remove(id);
                flashes.remove(id);
            }
            tracing::debug!(count = expired.len(), "Pruned expired sessions");
        }
        sessions.insert(sid.clone(), Session::new(username));
        sid
    }

    /// Username behind a session id, or `None` when the id is unknown or
    /// older than the session TTL. Expired ids are forgotten.
    pub fn session_user(&self, session_id: &str) -> Option<String> {
        let mut sessions = self.sessions.lock();
        let session = sessions.get(session_id)?;
        if self.is_expired(session, Utc::now()) {
            sessions.remove(session_id);
            self.flash_store.lock().remove(session_id);
            return None;
        }
        Some(session.username.clone())
    }

    pub fn end_session(&self, session_id: &str) {
        self.sessions.lock().remove(session_id);
        self.flash_store.lock().remove(session_id);
    }

    pub fn push_flash(&self, session_id: &str, message: impl Into<String>) {
        self.flash_store
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::services::JsonCredentialStore;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Unused;

    #[async_trait]
    impl CommandGateway for Unused {
        async fn execute(&self, _verb: &str, _args: &[String]) -> Result<Value, GatewayError> {
            Err(GatewayError::Closed)
        }
    }

    fn state(ttl_hours: i64) -> AppState {
        let gateway: Arc<dyn CommandGateway> = Arc::new(Unused);
        let registry = Arc::new(ServerRegistry::new(gateway.clone()));
        AppState::new(
            Arc::new(JsonCredentialStore::in_memory()),
            gateway,
            registry,
            "test".into(),
            ttl_hours,
        )
    }

    fn backdate(state: &AppState, sid: &str, hours: i64) {
        if let Some(session) = state.sessions.lock().get_mut(sid) {
            session.issued_at = Utc::now() - Duration::hours(hours);
        }
    }

    #[test]
    fn fresh_session_resolves_to_its_user() {
        let state = state(12);
        let sid = state.start_session("admin");
        assert_eq!(state.session_user(&sid).as_deref(), Some("admin"));
        state.end_session(&sid);
        assert_eq!(state.session_user(&sid), None);
    }

    #[test]
    fn expired_session_is_dropped_with_its_flashes() {
        let state = state(1);
        let sid = state.start_session("admin");
        state.push_flash(&sid, "hello");
        backdate(&state, &sid, 2);

        assert_eq!(state.session_user(&sid), None);
        assert!(state.sessions.lock().is_empty());
        assert!(state.flash_store.lock().is_empty());
    }

    #[test]
    fn login_prunes_expired_sessions() {
        let state = state(1);
        let old = state.start_session("a");
        state.push_flash(&old, "left behind");
        backdate(&state, &old, 5);

        let new = state.start_session("b");
        let sessions = state.sessions.lock();
        assert_eq!(sessions.len(), 1);
        assert!(sessions.contains_key(&new));
        assert!(!state.flash_store.lock().contains_key(&old));
    }
}
