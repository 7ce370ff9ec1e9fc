//! Voice query dispatcher: central coordinator for spoken queries.
//!
//! Normalizes input, applies mute control, answers from local analytics
//! when an intent route matches, otherwise asks the remote model, and
//! speaks the result.

use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use rally_core::config::VoiceConfig;
use rally_core::{now_millis, ConversationMessage, SharedStatStore};

use crate::answers;
use crate::intent::IntentRouter;
use crate::mute::{MuteControl, MuteState};
use crate::remote::RemoteModel;
use crate::speech::{SpeechSynthesizer, Utterance};

/// Outcome of [`VoiceQueryDispatcher::accept`].
#[derive(Debug)]
pub enum Accepted {
    /// Empty input, or the assistant is muted.
    Dropped,
    /// The activation keyword unmuted the assistant; the confirmation was spoken.
    Activated,
    /// A query whose user turn is recorded and whose answer is still owed.
    Pending(PendingQuery),
}

/// A query accepted into the conversation, waiting for its answer.
#[derive(Debug, Clone)]
pub struct PendingQuery {
    text: String,
    history: Vec<ConversationMessage>,
}

impl PendingQuery {
    /// Normalized query text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Conversation as of this query, ending with its own user turn.
    pub fn history(&self) -> &[ConversationMessage] {
        &self.history
    }
}

/// Turns free-text queries into spoken answers.
///
/// Overlapping calls to [`handle_query`](Self::handle_query) are not
/// serialized: each appends its user turn immediately and its assistant
/// turn when its answer resolves.
pub struct VoiceQueryDispatcher {
    id: Uuid,
    router: IntentRouter,
    stats: SharedStatStore,
    remote: Arc<dyn RemoteModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    mute: MuteControl,
    history: Mutex<Vec<ConversationMessage>>,
    activation_keyword: String,
    locale: String,
}

impl VoiceQueryDispatcher {
    pub fn new(
        config: &VoiceConfig,
        stats: SharedStatStore,
        remote: Arc<dyn RemoteModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            router: IntentRouter::new(),
            stats,
            remote,
            synthesizer,
            mute: MuteControl::new(),
            history: Mutex::new(Vec::new()),
            activation_keyword: config.activation_keyword.trim().to_lowercase(),
            locale: config.locale.clone(),
        }
    }

    /// Replace the intent routes.
    pub fn with_router(mut self, router: IntentRouter) -> Self {
        self.router = router;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Handle one query from speech recognition or manual entry.
    ///
    /// Returns what was spoken, or `None` when the query was dropped
    /// (empty input, or the assistant is muted).
    pub async fn handle_query(&self, text: &str) -> Option<String> {
        match self.accept(text) {
            Accepted::Dropped => None,
            Accepted::Activated => Some(answers::MIC_ACTIVATED.to_string()),
            Accepted::Pending(query) => Some(self.finish(query).await),
        }
    }

    /// Synchronous half of [`handle_query`](Self::handle_query).
    ///
    /// Normalizes the text and applies the keyword and mute rules. An
    /// accepted query has its user turn appended before this returns, so
    /// callers that accept transcripts in arrival order get history in
    /// arrival order even when the answers resolve concurrently.
    pub fn accept(&self, text: &str) -> Accepted {
        let cleaned = text.trim().to_lowercase();
        if cleaned.is_empty() {
            return Accepted::Dropped;
        }

        if !self.activation_keyword.is_empty() && cleaned.contains(&self.activation_keyword) {
            let previous = self.mute.activate();
            tracing::info!(dispatcher = %self.id, previous = %previous, "Assistant activated");
            self.speak(answers::MIC_ACTIVATED);
            return Accepted::Activated;
        }

        if self.mute.is_muted() {
            tracing::debug!(dispatcher = %self.id, "Query dropped while muted");
            return Accepted::Dropped;
        }

        let history = {
            let mut history = self.history();
            history.push(ConversationMessage::user(cleaned.clone()));
            history.clone()
        };

        Accepted::Pending(PendingQuery {
            text: cleaned,
            history,
        })
    }

    /// Resolve an accepted query, append the assistant turn and speak it.
    pub async fn finish(&self, query: PendingQuery) -> String {
        let answer = self.resolve_answer(&query.text, &query.history).await;

        self.history().push(ConversationMessage::assistant(answer.clone()));
        self.speak(&answer);
        answer
    }

    async fn resolve_answer(&self, text: &str, history: &[ConversationMessage]) -> String {
        if let Some(route) = self.router.route(text) {
            tracing::debug!(dispatcher = %self.id, intent = ?route.intent, "Answering locally");
            let stats = self.stats.lock();
            return (route.answer)(&stats, now_millis());
        }

        tracing::debug!(dispatcher = %self.id, turns = history.len(), "Forwarding to model proxy");
        answers::from_remote(self.remote.ask(text, history).await)
    }

    fn speak(&self, text: &str) {
        self.synthesizer.speak(Utterance::new(text, self.locale.clone()));
    }

    fn history(&self) -> MutexGuard<'_, Vec<ConversationMessage>> {
        self.history.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Flip mute on or off, independent of voice input. Returns the new state.
    pub fn toggle_mute(&self) -> MuteState {
        let state = self.mute.toggle();
        tracing::info!(dispatcher = %self.id, state = %state, "Mute toggled");
        state
    }

    pub fn mute_state(&self) -> MuteState {
        self.mute.current()
    }

    pub fn is_muted(&self) -> bool {
        self.mute.is_muted()
    }

    /// Snapshot of the conversation so far.
    pub fn conversation(&self) -> Vec<ConversationMessage> {
        self.history().clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
