//! Speech capability interface.
//!
//! Platform speech engines are external collaborators. The dispatcher only
//! sees these traits: a recognizer that begins listening and yields
//! transcripts, and a synthesizer that speaks fire-and-forget.

use std::io::Write;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::error::VoiceError;

/// Text to be spoken in a given locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub locale: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
        }
    }
}

/// One recognition event. Engines may split a phrase into several results;
/// they are joined in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    pub results: Vec<String>,
}

impl Transcript {
    pub fn text(&self) -> String {
        self.results.concat()
    }
}

impl From<String> for Transcript {
    fn from(text: String) -> Self {
        Self {
            results: vec![text],
        }
    }
}

impl From<&str> for Transcript {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

/// Speech-to-text source.
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Start a recognition session.
    async fn begin_listening(&mut self) -> Result<(), VoiceError>;

    /// Wait for the next transcript. `None` once the session has ended.
    async fn next_transcript(&mut self) -> Option<Transcript>;

    /// End the recognition session.
    fn stop_listening(&mut self);
}

/// Text-to-speech sink. Speaking is fire-and-forget.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, utterance: Utterance);
}

// =============================================================================
// LineRecognizer
// =============================================================================

/// Treats each line of a text stream as one recognition result.
pub struct LineRecognizer<R> {
    lines: Lines<R>,
    listening: bool,
}

impl LineRecognizer<BufReader<Stdin>> {
    /// Recognizer reading typed transcripts from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineRecognizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            listening: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> SpeechRecognizer for LineRecognizer<R> {
    async fn begin_listening(&mut self) -> Result<(), VoiceError> {
        if self.listening {
            return Err(VoiceError::Speech("recognizer is already listening".to_string()));
        }
        self.listening = true;
        tracing::debug!("Line recognizer listening");
        Ok(())
    }

    async fn next_transcript(&mut self) -> Option<Transcript> {
        if !self.listening {
            return None;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(Transcript::from(line)),
            Ok(None) => {
                tracing::debug!("Line recognizer input closed");
                self.listening = false;
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Line recognizer read failed");
                self.listening = false;
                None
            }
        }
    }

    fn stop_listening(&mut self) {
        self.listening = false;
    }
}

// =============================================================================
// Synthesizers
// =============================================================================

/// Prints utterances to standard output.
#[derive(Debug, Clone)]
pub struct ConsoleSynthesizer {
    prefix: String,
}

impl Default for ConsoleSynthesizer {
    fn default() -> Self {
        Self::new("asistente")
    }
}

impl ConsoleSynthesizer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn render(&self, utterance: &Utterance) -> String {
        format!("[{}] {}> {}", utterance.locale, self.prefix, utterance.text)
    }
}

impl SpeechSynthesizer for ConsoleSynthesizer {
    fn speak(&self, utterance: Utterance) {
        let line = self.render(&utterance);
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{line}") {
            tracing::debug!(error = %e, "Console synthesizer write failed");
        }
    }
}

/// Logs utterances instead of speaking them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSynthesizer;

impl SpeechSynthesizer for TracingSynthesizer {
    fn speak(&self, utterance: Utterance) {
        tracing::info!(locale = %utterance.locale, text = %utterance.text, "Speaking");
    }
}

// =============================================================================
// Tests
// =============================================================================
