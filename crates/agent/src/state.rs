//! Call-state machine
//!
//! Governs end-of-call detection and confirmation. Every incoming utterance
//! is evaluated here first; only a `Proceed` decision reaches the full turn
//! pipeline, so end-call handling never costs a completion call.

/// Call lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Normal conversation
    Normal,
    /// An end-call phrase was detected; awaiting confirmation
    EndPending,
    /// Call ended; no further turns are processed
    Ended,
}

/// What the turn controller should do with an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDecision {
    /// Client confirmed the end: say farewell and finalize
    EndConfirmed,
    /// Client declined the end: resume the conversation
    EndDeclined,
    /// Ask whether the call should end
    ConfirmEnd,
    /// Ambiguous reply while confirmation is pending: ask again
    RepeatConfirmation,
    /// Run the full turn pipeline
    Proceed,
    /// The call already ended; reject the utterance
    Rejected,
}

/// Words that confirm an end-call request (substring match)
const AFFIRMATIVE_TOKENS: [&str; 5] = ["yes", "okay", "sure", "correct", "yeah"];

/// Words that decline an end-call request (substring match)
const NEGATION_TOKENS: [&str; 3] = ["no", "continue", "not yet"];

/// Per-session call-state machine
#[derive(Debug)]
pub struct CallStateMachine {
    state: CallState,
    end_call_phrases: Vec<String>,
}

impl CallStateMachine {
    /// Create a machine in the `Normal` state
    pub fn new(end_call_phrases: Vec<String>) -> Self {
        Self {
            state: CallState::Normal,
            end_call_phrases: end_call_phrases
                .into_iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Current state
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Evaluate one utterance, transitioning state as needed.
    ///
    /// Checks run in strict priority order: confirmation answers first
    /// (affirmative before negation), then end-call phrases, then the
    /// pipeline. An ambiguous reply while confirmation is pending keeps the
    /// machine in `EndPending` and repeats the question.
    pub fn evaluate(&mut self, utterance: &str) -> CallDecision {
        let lower = utterance.to_lowercase();

        match self.state {
            CallState::Ended => CallDecision::Rejected,

            CallState::EndPending => {
                if contains_any(&lower, &AFFIRMATIVE_TOKENS) {
                    self.state = CallState::Ended;
                    tracing::info!("Client confirmed call end");
                    CallDecision::EndConfirmed
                } else if contains_any(&lower, &NEGATION_TOKENS) {
                    self.state = CallState::Normal;
                    tracing::info!("Client declined call end");
                    CallDecision::EndDeclined
                } else if self.contains_end_phrase(&lower) {
                    CallDecision::ConfirmEnd
                } else {
                    CallDecision::RepeatConfirmation
                }
            }

            CallState::Normal => {
                if self.contains_end_phrase(&lower) {
                    self.state = CallState::EndPending;
                    tracing::info!("End-call phrase detected");
                    CallDecision::ConfirmEnd
                } else {
                    CallDecision::Proceed
                }
            }
        }
    }

    fn contains_end_phrase(&self, lower: &str) -> bool {
        self.end_call_phrases.iter().any(|p| lower.contains(p))
    }
}

fn contains_any(haystack: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| haystack.contains(t))
}
