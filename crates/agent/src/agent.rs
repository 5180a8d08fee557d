//! Turn controller
//!
//! Orchestrates one conversational exchange: call-state evaluation,
//! retrieval, prompt assembly, completion, response parsing, entity merge,
//! synthesis, and history bookkeeping. One `SalesAgent` per session; the
//! transport adapter must never run two turns concurrently for the same
//! session.

use std::sync::Arc;

use sales_agent_config::AgentConfig;
use sales_agent_core::{EntityRecord, Message};
use sales_agent_integrations::{CalendarIntegration, CrmIntegration};
use sales_agent_llm::{augment_user_message, parse_agent_response, CompletionBackend};
use sales_agent_rag::Retriever;
use sales_agent_tts::SynthesisBackend;

use crate::state::{CallDecision, CallState, CallStateMachine};
use crate::AgentError;

/// Result of one processed turn
#[derive(Debug)]
pub struct TurnOutcome {
    /// Spoken reply text
    pub text: String,
    /// Synthesized audio, absent when synthesis failed or was skipped
    pub audio: Option<Vec<u8>>,
    /// True when the transport should close the channel after delivery
    pub end_call: bool,
}

/// External collaborators shared by all sessions
pub struct AgentServices {
    pub retriever: Arc<Retriever>,
    pub completion: Arc<dyn CompletionBackend>,
    pub synthesis: Arc<dyn SynthesisBackend>,
    pub crm: Arc<dyn CrmIntegration>,
    pub calendar: Arc<dyn CalendarIntegration>,
}

/// Per-session conversational agent
pub struct SalesAgent {
    session_id: String,
    config: AgentConfig,
    services: Arc<AgentServices>,
    state_machine: CallStateMachine,
    history: Vec<Message>,
    entities: EntityRecord,
    prompt_version: u64,
}

impl SalesAgent {
    /// Create an agent bound to a session and the current sales prompt
    pub fn new(
        session_id: impl Into<String>,
        config: AgentConfig,
        prompt_version: u64,
        sales_prompt: &str,
        services: Arc<AgentServices>,
    ) -> Self {
        let state_machine = CallStateMachine::new(config.end_call_phrases.clone());

        Self {
            session_id: session_id.into(),
            config,
            services,
            state_machine,
            history: vec![Message::system(sales_prompt)],
            entities: EntityRecord::new(),
            prompt_version,
        }
    }

    /// Session id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current call state
    pub fn call_state(&self) -> CallState {
        self.state_machine.state()
    }

    /// Sales prompt version this session currently runs on
    pub fn prompt_version(&self) -> u64 {
        self.prompt_version
    }

    /// Conversation history, system turn first
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Accumulated entity record
    pub fn entities(&self) -> &EntityRecord {
        &self.entities
    }

    /// Replace the system turn with a new sales prompt, discarding all
    /// conversation turns. Called when the global prompt is updated.
    pub fn reset_prompt(&mut self, version: u64, sales_prompt: &str) {
        tracing::info!(
            session = %self.session_id,
            from = self.prompt_version,
            to = version,
            "Resetting session to new sales prompt"
        );
        self.history = vec![Message::system(sales_prompt)];
        self.prompt_version = version;
    }

    /// Deliver the fixed greeting and record it as the first assistant turn
    pub async fn start_recording(&mut self) -> TurnOutcome {
        let greeting = self.config.greeting.clone();
        let audio = self.synthesize_or_none(&greeting).await;
        self.history.push(Message::assistant(greeting.clone()));

        TurnOutcome {
            text: greeting,
            audio,
            end_call: false,
        }
    }

    /// Process one user utterance.
    ///
    /// The call-state machine is consulted first; end-call handling is
    /// resolved from fixed texts without touching the completion service.
    pub async fn handle_utterance(&mut self, utterance: &str) -> Result<TurnOutcome, AgentError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(AgentError::EmptyUtterance);
        }

        match self.state_machine.evaluate(utterance) {
            CallDecision::Rejected => Err(AgentError::CallEnded),

            CallDecision::EndConfirmed => Ok(self.finalize_call().await),

            CallDecision::EndDeclined => {
                let text = self.config.continuation.clone();
                let audio = self.synthesize_or_none(&text).await;
                Ok(TurnOutcome {
                    text,
                    audio,
                    end_call: false,
                })
            }

            CallDecision::ConfirmEnd | CallDecision::RepeatConfirmation => {
                let text = self.config.end_confirmation.clone();
                let audio = self.synthesize_or_none(&text).await;
                Ok(TurnOutcome {
                    text,
                    audio,
                    end_call: false,
                })
            }

            CallDecision::Proceed => Ok(self.run_turn(utterance).await),
        }
    }

    /// Full turn pipeline, state = Normal only
    async fn run_turn(&mut self, utterance: &str) -> TurnOutcome {
        // Retrieval failure degrades to an un-augmented turn; the
        // conversation continues.
        let retrieval = match self.services.retriever.retrieve(utterance) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "Retrieval failed");
                Default::default()
            }
        };

        let augmented =
            augment_user_message(utterance, &retrieval.chunks, &self.entities.snapshot());
        self.history.push(Message::user(augmented));

        let raw = match self.services.completion.complete(&self.history).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "Completion failed");
                return TurnOutcome {
                    text: self.config.apology.clone(),
                    audio: None,
                    end_call: false,
                };
            }
        };

        let parsed = parse_agent_response(&raw);
        if let Some(update) = parsed.entities {
            self.entities.apply(update);
            tracing::debug!(session = %self.session_id, "Merged entity update");
        }

        let audio = self.synthesize_or_none(&parsed.spoken).await;
        self.history.push(Message::assistant(parsed.spoken.clone()));

        TurnOutcome {
            text: parsed.spoken,
            audio,
            end_call: false,
        }
    }

    /// Farewell turn: spawn finalization side effects and close out
    async fn finalize_call(&mut self) -> TurnOutcome {
        let entities = self.entities.clone();
        let crm = self.services.crm.clone();
        let calendar = self.services.calendar.clone();
        let session_id = self.session_id.clone();

        // Best-effort side effects; failure is logged, never retried, and
        // never delays the farewell.
        tokio::spawn(async move {
            match crm.create_lead(&entities).await {
                Ok(true) => tracing::info!(session = %session_id, "CRM lead created"),
                Ok(false) => tracing::warn!(session = %session_id, "CRM rejected lead"),
                Err(e) => tracing::warn!(session = %session_id, error = %e, "CRM lead failed"),
            }

            if entities.has_meeting() {
                let outcome = calendar.create_event(&entities).await;
                if outcome.success {
                    tracing::info!(
                        session = %session_id,
                        link = outcome.event_link.as_deref().unwrap_or(""),
                        "Calendar event created"
                    );
                } else {
                    tracing::warn!(
                        session = %session_id,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "Calendar event failed"
                    );
                }
            }
        });

        let farewell = self.config.farewell.clone();
        let audio = self.synthesize_or_none(&farewell).await;

        TurnOutcome {
            text: farewell,
            audio,
            end_call: true,
        }
    }

    /// Synthesize audio, downgrading failure to text-only delivery
    async fn synthesize_or_none(&self, text: &str) -> Option<Vec<u8>> {
        match self.services.synthesis.synthesize(text).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(session = %self.session_id, error = %e, "Synthesis failed");
                None
            }
        }
    }
}
