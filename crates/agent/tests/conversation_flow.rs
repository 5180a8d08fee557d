//! End-to-end conversation scenarios over stub backends

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use sales_agent_agent::{AgentError, AgentServices, CallState, SalesAgent};
use sales_agent_config::AgentConfig;
use sales_agent_core::{Message, Role};
use sales_agent_integrations::{StubCalendarIntegration, StubCrmIntegration};
use sales_agent_llm::{CompletionBackend, LlmError};
use sales_agent_rag::{HashEmbedder, Retriever};
use sales_agent_tts::{SynthesisBackend, TtsError};

/// Completion stub that plays back scripted responses and counts calls
struct ScriptedCompletion {
    responses: Mutex<VecDeque<String>>,
    calls: AtomicUsize,
    fail: bool,
}

impl ScriptedCompletion {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, _history: &[Message]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::EmptyResponse);
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(LlmError::EmptyResponse)
    }
}

/// Synthesis stub; optionally failing to exercise text-only delivery
struct FixedSynthesis {
    fail: bool,
}

#[async_trait]
impl SynthesisBackend for FixedSynthesis {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, TtsError> {
        if self.fail {
            return Err(TtsError::Api {
                status: 500,
                message: "stub failure".to_string(),
            });
        }
        Ok(text.as_bytes().to_vec())
    }
}

struct Harness {
    agent: SalesAgent,
    completion: Arc<ScriptedCompletion>,
    crm: Arc<StubCrmIntegration>,
    calendar: Arc<StubCalendarIntegration>,
}

fn harness_with(completion: ScriptedCompletion, synthesis_fails: bool) -> Harness {
    let completion = Arc::new(completion);
    let crm = Arc::new(StubCrmIntegration::new());
    let calendar = Arc::new(StubCalendarIntegration::new());

    let services = Arc::new(AgentServices {
        retriever: Arc::new(Retriever::new(Arc::new(HashEmbedder::default()), 300, 3)),
        completion: completion.clone(),
        synthesis: Arc::new(FixedSynthesis {
            fail: synthesis_fails,
        }),
        crm: crm.clone(),
        calendar: calendar.clone(),
    });

    let agent = SalesAgent::new(
        "test-session",
        AgentConfig::default(),
        1,
        "You are a sales agent for Acme.",
        services,
    );

    Harness {
        agent,
        completion,
        crm,
        calendar,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met within one second");
}

#[tokio::test]
async fn full_turn_merges_entities_and_appends_history() {
    let mut h = harness_with(
        ScriptedCompletion::new(&[
            "Glad to help! [[ENTITIES]]\n{\"entities\": {\"name\": \"Alice\", \"email\": null}}",
        ]),
        false,
    );

    let outcome = h.agent.handle_utterance("Hi, I'm Alice").await.unwrap();

    assert_eq!(outcome.text, "Glad to help!");
    assert!(!outcome.end_call);
    assert_eq!(outcome.audio.as_deref(), Some("Glad to help!".as_bytes()));

    assert_eq!(h.agent.entities().name.as_deref(), Some("Alice"));
    assert!(h.agent.entities().email.is_none());

    // system + augmented user + assistant
    let history = h.agent.history();
    assert_eq!(history.len(), 3);
    assert_eq!(history[1].role, Role::User);
    assert!(history[1].content.contains("User Input: Hi, I'm Alice"));
    assert_eq!(history[2].content, "Glad to help!");
    assert_eq!(h.completion.call_count(), 1);
}

#[tokio::test]
async fn end_phrase_confirms_without_completion_call() {
    let mut h = harness_with(ScriptedCompletion::new(&[]), false);

    let outcome = h.agent.handle_utterance("I want to end call").await.unwrap();

    assert_eq!(outcome.text, "Would you like to end our conversation?");
    assert!(!outcome.end_call);
    assert_eq!(h.agent.call_state(), CallState::EndPending);
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn confirmed_end_creates_lead_without_calendar() {
    let mut h = harness_with(ScriptedCompletion::new(&[]), false);

    h.agent.handle_utterance("goodbye").await.unwrap();
    let outcome = h.agent.handle_utterance("yes please").await.unwrap();

    assert!(outcome.end_call);
    assert_eq!(h.agent.call_state(), CallState::Ended);
    assert_eq!(h.completion.call_count(), 0);

    let crm = h.crm.clone();
    wait_until(move || crm.lead_history().len() == 1).await;
    // No meeting fields were gathered, so no calendar event.
    assert!(h.calendar.scheduled_events().is_empty());
}

#[tokio::test]
async fn confirmed_end_schedules_meeting_when_fields_present() {
    let mut h = harness_with(
        ScriptedCompletion::new(&[
            "Booked! [[ENTITIES]] {\"entities\": {\"name\": \"Bo Lee\", \"meeting_date\": \"30-01-2025\", \"meeting_time\": \"11:00 AM\"}}",
        ]),
        false,
    );

    h.agent.handle_utterance("Book me for the 30th").await.unwrap();
    assert!(h.agent.entities().has_meeting());

    h.agent.handle_utterance("goodbye").await.unwrap();
    h.agent.handle_utterance("yes").await.unwrap();

    let crm = h.crm.clone();
    let calendar = h.calendar.clone();
    wait_until(move || crm.lead_history().len() == 1 && calendar.scheduled_events().len() == 1)
        .await;

    let leads = h.crm.lead_history();
    assert_eq!(leads[0].first_name, "Bo");
    assert_eq!(leads[0].last_name, "Lee");
    assert_eq!(
        h.calendar.scheduled_events()[0].summary,
        "Sales Consultation - Potential Client"
    );
}

#[tokio::test]
async fn ended_session_rejects_further_turns() {
    let mut h = harness_with(ScriptedCompletion::new(&[]), false);

    h.agent.handle_utterance("goodbye").await.unwrap();
    h.agent.handle_utterance("yes").await.unwrap();

    let err = h.agent.handle_utterance("hello again?").await.unwrap_err();
    assert!(matches!(err, AgentError::CallEnded));
}

#[tokio::test]
async fn declined_end_resumes_conversation() {
    let mut h = harness_with(
        ScriptedCompletion::new(&["Of course, happy to continue."]),
        false,
    );

    h.agent.handle_utterance("goodbye").await.unwrap();
    let outcome = h.agent.handle_utterance("no, continue").await.unwrap();

    assert_eq!(
        outcome.text,
        "I understand you'd like to continue. What else can I help you with?"
    );
    assert_eq!(h.agent.call_state(), CallState::Normal);
    assert_eq!(h.completion.call_count(), 0);

    let next = h.agent.handle_utterance("tell me about pricing").await.unwrap();
    assert_eq!(next.text, "Of course, happy to continue.");
    assert_eq!(h.completion.call_count(), 1);
}

#[tokio::test]
async fn ambiguous_confirmation_repeats_question() {
    let mut h = harness_with(ScriptedCompletion::new(&[]), false);

    h.agent.handle_utterance("goodbye").await.unwrap();
    let outcome = h.agent.handle_utterance("what was that?").await.unwrap();

    assert_eq!(outcome.text, "Would you like to end our conversation?");
    assert_eq!(h.agent.call_state(), CallState::EndPending);
    assert_eq!(h.completion.call_count(), 0);
}

#[tokio::test]
async fn completion_failure_yields_apology_without_audio() {
    let mut h = harness_with(ScriptedCompletion::failing(), false);

    let outcome = h.agent.handle_utterance("hello there").await.unwrap();

    assert!(outcome.text.contains("I apologize"));
    assert!(outcome.audio.is_none());
    assert!(!outcome.end_call);

    // The user turn stays; the apology is not recorded as a model turn.
    let history = h.agent.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::User);
}

#[tokio::test]
async fn synthesis_failure_degrades_to_text_only() {
    let mut h = harness_with(ScriptedCompletion::new(&["Here's our pitch."]), true);

    let outcome = h.agent.handle_utterance("pitch me").await.unwrap();

    assert_eq!(outcome.text, "Here's our pitch.");
    assert!(outcome.audio.is_none());
}

#[tokio::test]
async fn greeting_is_first_assistant_turn() {
    let mut h = harness_with(ScriptedCompletion::new(&[]), false);

    let outcome = h.agent.start_recording().await;

    assert!(outcome.text.contains("Toshal Infotech"));
    let history = h.agent.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
}

#[tokio::test]
async fn prompt_reset_discards_conversation() {
    let mut h = harness_with(ScriptedCompletion::new(&["Reply one."]), false);

    h.agent.handle_utterance("hello").await.unwrap();
    assert!(h.agent.history().len() > 1);

    h.agent.reset_prompt(2, "You now sell for NewCo.");

    assert_eq!(h.agent.prompt_version(), 2);
    let history = h.agent.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::System);
    assert_eq!(history[0].content, "You now sell for NewCo.");
}

#[tokio::test]
async fn empty_utterance_is_rejected_and_session_stays_open() {
    let mut h = harness_with(ScriptedCompletion::new(&["Still here."]), false);

    let err = h.agent.handle_utterance("   ").await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyUtterance));

    // The session remains usable.
    let outcome = h.agent.handle_utterance("are you there?").await.unwrap();
    assert_eq!(outcome.text, "Still here.");
}
