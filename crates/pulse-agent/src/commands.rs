//! Free-text instruction handling
//!
//! The user's text is logged first, then either run locally through the
//! intent parser or forwarded to the [`InstructionProvider`] with the recent
//! conversation. Provider answers are merged with the same rules as feed
//! events; a failed provider call only adds a system message.

use crate::narration::voice_snippet;
use crate::source::{InstructionProvider, SpeechSink};
use chrono::Utc;
use pulse_core::{parse_intent, Command, CopilotStore, Intent, Outcome};
use pulse_model::{ConversationMessage, InstructionRequest, Role};
use std::sync::Arc;

const UNAVAILABLE: &str = "Agent is unavailable. Try again shortly.";

/// What became of one instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// Blank input
    Empty,
    /// Run by the local intent parser
    Local(Intent),
    /// Answered by the provider
    Delegated { narration: usize, actions: usize },
    /// Provider missing or failed
    Unavailable,
    /// Session changed while the provider was answering
    Stale,
}

/// Routes user instructions
pub struct CommandHandler {
    store: Arc<CopilotStore>,
    provider: Option<Arc<dyn InstructionProvider>>,
    speech: Option<Arc<dyn SpeechSink>>,
}

impl CommandHandler {
    /// Handler with local intents only
    #[must_use]
    pub fn new(store: Arc<CopilotStore>) -> Self {
        Self {
            store,
            provider: None,
            speech: None,
        }
    }

    /// With a provider for delegated instructions
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn InstructionProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// With a sink for the reply snippet
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechSink>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Handle one line of user input
    pub async fn handle_instruction(&self, text: &str) -> Handled {
        let input = text.trim();
        if input.is_empty() {
            return Handled::Empty;
        }
        self.store.dispatch(Command::AppendMessage(ConversationMessage::new(
            Role::User,
            input,
            Utc::now(),
        )));

        let intent = parse_intent(input);
        if intent.is_local() {
            tracing::debug!(?intent, "Running local intent");
            self.store.dispatch(Command::RunIntent(intent));
            return Handled::Local(intent);
        }
        self.delegate(input).await
    }

    async fn delegate(&self, instruction: &str) -> Handled {
        let Some(guard) = self.store.current_guard() else {
            tracing::warn!("No open session for instruction");
            self.system_message(UNAVAILABLE);
            return Handled::Unavailable;
        };
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("No instruction provider configured");
            self.system_message(UNAVAILABLE);
            return Handled::Unavailable;
        };

        let history = self.store.config().instruction_history;
        let request = InstructionRequest {
            store_id: guard.store_id().to_string(),
            instruction: instruction.to_string(),
            conversation: self.store.read(|s| s.conversation().snippets(history)),
        };
        tracing::info!(store = guard.store_id(), "Delegating instruction");

        let response = match provider.instruct(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "Instruction provider failed");
                if self.store.is_current(&guard) {
                    self.system_message(UNAVAILABLE);
                }
                return Handled::Unavailable;
            }
        };

        let snippet = voice_snippet(&response);
        let narration = response.narration.len();
        let actions = response.actions.len();

        if self
            .store
            .dispatch_for(&guard, Command::IngestNarration(response.narration))
            == Outcome::Stale
        {
            return Handled::Stale;
        }
        for action in response.actions {
            if self.store.dispatch_for(&guard, Command::IngestAction(action)) == Outcome::Stale {
                return Handled::Stale;
            }
        }

        if let (Some(speech), Some(text)) = (self.speech.clone(), snippet) {
            let store_id = guard.store_id().to_string();
            tokio::spawn(async move {
                if let Err(err) = speech.speak(&store_id, &text).await {
                    tracing::warn!(store = %store_id, error = %err, "Reply narration failed");
                }
            });
        }

        Handled::Delegated { narration, actions }
    }

    fn system_message(&self, text: &str) {
        self.store.dispatch(Command::AppendMessage(ConversationMessage::new(
            Role::System,
            text,
            Utc::now(),
        )));
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("provider", &self.provider.is_some())
            .field("speech", &self.speech.is_some())
            .finish_non_exhaustive()
    }
}
