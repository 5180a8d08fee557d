//! Application state
//!
//! Shared state across all handlers: configuration, the session manager,
//! the agent's external collaborators, the versioned sales prompt, and the
//! knowledge ingestion pipeline.

use std::sync::Arc;
use std::time::Duration;

use sales_agent_agent::{AgentServices, SalesAgent};
use sales_agent_config::Settings;
use sales_agent_integrations::{StubCalendarIntegration, StubCrmIntegration};
use sales_agent_knowledge::{default_sales_prompt, IngestOutcome, IngestPipeline};
use sales_agent_llm::OpenAiBackend;
use sales_agent_rag::{HashEmbedder, Retriever};
use sales_agent_tts::HttpSynthesizer;

use crate::prompt::PromptManager;
use crate::session::{Session, SessionManager};
use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Session manager
    pub sessions: Arc<SessionManager>,
    /// External collaborators shared by all sessions
    pub services: Arc<AgentServices>,
    /// Versioned sales prompt
    pub prompts: Arc<PromptManager>,
    /// Knowledge ingestion pipeline
    pub ingest: Arc<IngestPipeline>,
}

impl AppState {
    /// Create application state from settings
    pub fn new(config: Settings) -> Result<Self, ServerError> {
        let completion = Arc::new(
            OpenAiBackend::new(config.llm.clone())
                .map_err(|e| ServerError::Startup(e.to_string()))?,
        );
        let synthesis = Arc::new(
            HttpSynthesizer::new(config.synthesis.clone())
                .map_err(|e| ServerError::Startup(e.to_string()))?,
        );
        let retriever = Arc::new(Retriever::new(
            Arc::new(HashEmbedder::new(config.rag.embedding_dim)),
            config.rag.chunk_size,
            config.rag.top_k,
        ));

        let services = Arc::new(AgentServices {
            retriever,
            completion: completion.clone(),
            synthesis,
            crm: Arc::new(StubCrmIntegration::new()),
            calendar: Arc::new(StubCalendarIntegration::new()),
        });

        let sessions = Arc::new(SessionManager::with_config(
            config.server.max_sessions,
            Duration::from_secs(config.server.session_timeout_seconds),
            Duration::from_secs(config.server.cleanup_interval_seconds),
        ));

        Ok(Self {
            config: Arc::new(config),
            sessions,
            services,
            prompts: Arc::new(PromptManager::new(default_sales_prompt())),
            ingest: Arc::new(IngestPipeline::new(completion)),
        })
    }

    /// Create a new session bound to the current sales prompt
    pub fn create_session(&self) -> Result<Arc<Session>, ServerError> {
        let prompt = self.prompts.current();
        let id = uuid::Uuid::new_v4().to_string();

        let agent = SalesAgent::new(
            &id,
            self.config.agent.clone(),
            prompt.version,
            &prompt.text,
            self.services.clone(),
        );

        self.sessions.create(agent)
    }

    /// Apply a successful document ingestion: rebuild the knowledge store,
    /// publish the new sales prompt, and reset every live session.
    ///
    /// The store rebuild runs first; if it fails the previous prompt and
    /// corpus both stay in place, so the update is all-or-nothing.
    pub async fn apply_ingest(
        &self,
        outcome: IngestOutcome,
        source_id: &str,
    ) -> Result<(), ServerError> {
        let chunks = self
            .services
            .retriever
            .rebuild(&outcome.text, source_id, 1)
            .map_err(|e| ServerError::Ingest(e.to_string()))?;

        let prompt = self.prompts.update(outcome.sales_prompt);
        self.sessions
            .reset_all_prompts(prompt.version, &prompt.text)
            .await;

        tracing::info!(
            company = %outcome.company_info.company_name,
            chunks,
            version = prompt.version,
            "Applied knowledge update to all live sessions"
        );

        Ok(())
    }
}
