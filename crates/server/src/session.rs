//! Session management
//!
//! One session per live connection. The agent sits behind an async mutex so
//! turns for one session are strictly sequential (single-writer discipline
//! on history and entities); the playback coordinator is the one other
//! per-session object with its own lock, because barge-in signals race with
//! synthesis completions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{watch, Mutex};

use sales_agent_agent::SalesAgent;
use sales_agent_tts::PlaybackCoordinator;

use crate::ServerError;

/// Session state
pub struct Session {
    /// Session ID (the connection id)
    pub id: String,
    /// Conversational agent; lock scope is one full turn
    pub agent: Mutex<SalesAgent>,
    /// Audio stream interruption coordinator
    pub playback: Arc<PlaybackCoordinator>,
    /// Creation time
    pub created_at: Instant,
    /// Last activity
    pub last_activity: RwLock<Instant>,
    /// Is active
    pub active: RwLock<bool>,
}

impl Session {
    /// Create a new session around an agent
    pub fn new(agent: SalesAgent) -> Self {
        Self {
            id: agent.session_id().to_string(),
            agent: Mutex::new(agent),
            playback: Arc::new(PlaybackCoordinator::new()),
            created_at: Instant::now(),
            last_activity: RwLock::new(Instant::now()),
            active: RwLock::new(true),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    /// Close session
    pub fn close(&self) {
        *self.active.write() = false;
    }

    /// Is session active
    pub fn is_active(&self) -> bool {
        *self.active.read()
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(300),
        }
    }

    /// Create a session manager with custom timeout and cleanup interval
    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    /// Start a background task that periodically removes expired sessions.
    ///
    /// Returns a shutdown sender used to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let before = manager.count();
                        manager.cleanup_expired();
                        let after = manager.count();
                        if before != after {
                            tracing::info!(
                                removed = before - after,
                                remaining = after,
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Register a new session for `agent`
    pub fn create(&self, agent: SalesAgent) -> Result<Arc<Session>, ServerError> {
        let mut sessions = self.sessions.write();

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);

            if sessions.len() >= self.max_sessions {
                return Err(ServerError::Session("Max sessions reached".to_string()));
            }
        }

        let session = Arc::new(Session::new(agent));
        sessions.insert(session.id.clone(), session.clone());

        tracing::info!(session = %session.id, "Created session");

        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Remove a session
    pub fn remove(&self, id: &str) {
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.remove(id) {
            session.close();
            tracing::info!(session = %id, "Removed session");
        }
    }

    /// Get active session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Reset every live session to a new sales prompt.
    ///
    /// Waits for each session's in-flight turn (if any) before resetting, so
    /// no turn ever observes a half-replaced history.
    pub async fn reset_all_prompts(&self, version: u64, text: &str) {
        let sessions: Vec<Arc<Session>> = self.sessions.read().values().cloned().collect();

        for session in sessions {
            let mut agent = session.agent.lock().await;
            agent.reset_prompt(version, text);
        }
    }

    /// Cleanup expired sessions
    pub fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions);
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            if let Some(session) = sessions.remove(&id) {
                session.close();
                tracing::info!(session = %id, "Expired session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use sales_agent_agent::AgentServices;
    use sales_agent_config::AgentConfig;
    use sales_agent_core::Message;
    use sales_agent_integrations::{StubCalendarIntegration, StubCrmIntegration};
    use sales_agent_llm::{CompletionBackend, LlmError};
    use sales_agent_rag::{HashEmbedder, Retriever};
    use sales_agent_tts::{SynthesisBackend, TtsError};

    use super::*;

    struct NoopCompletion;

    #[async_trait]
    impl CompletionBackend for NoopCompletion {
        async fn complete(&self, _history: &[Message]) -> Result<String, LlmError> {
            Ok("ok".to_string())
        }
    }

    struct NoopSynthesis;

    #[async_trait]
    impl SynthesisBackend for NoopSynthesis {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, TtsError> {
            Ok(Vec::new())
        }
    }

    fn test_agent(id: &str) -> SalesAgent {
        let services = Arc::new(AgentServices {
            retriever: Arc::new(Retriever::new(Arc::new(HashEmbedder::default()), 300, 3)),
            completion: Arc::new(NoopCompletion),
            synthesis: Arc::new(NoopSynthesis),
            crm: Arc::new(StubCrmIntegration::new()),
            calendar: Arc::new(StubCalendarIntegration::new()),
        });
        SalesAgent::new(id, AgentConfig::default(), 1, "prompt", services)
    }

    #[tokio::test]
    async fn test_session_create_and_get() {
        let manager = SessionManager::new(10);
        let session = manager.create(test_agent("s-1")).unwrap();

        assert!(session.is_active());
        assert!(manager.get("s-1").is_some());
        assert_eq!(manager.count(), 1);
    }

    #[tokio::test]
    async fn test_session_remove() {
        let manager = SessionManager::new(10);
        manager.create(test_agent("s-1")).unwrap();

        manager.remove("s-1");
        assert!(manager.get("s-1").is_none());
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let manager = SessionManager::new(1);
        manager.create(test_agent("s-1")).unwrap();

        assert!(manager.create(test_agent("s-2")).is_err());
    }

    #[tokio::test]
    async fn test_reset_all_prompts() {
        let manager = SessionManager::new(10);
        manager.create(test_agent("s-1")).unwrap();
        manager.create(test_agent("s-2")).unwrap();

        manager.reset_all_prompts(7, "new prompt").await;

        for id in ["s-1", "s-2"] {
            let session = manager.get(id).unwrap();
            let agent = session.agent.lock().await;
            assert_eq!(agent.prompt_version(), 7);
            assert_eq!(agent.history()[0].content, "new prompt");
        }
    }
}
