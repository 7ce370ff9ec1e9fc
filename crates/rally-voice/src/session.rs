//! Binds a speech recognizer to the dispatcher.
//!
//! Transcripts are accepted in arrival order on the listening loop, so mute
//! changes and user turns follow the order things were said. Only the
//! answer is resolved on its own task, so a slow model call never holds up
//! recognition of the next phrase.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::dispatcher::{Accepted, VoiceQueryDispatcher};
use crate::error::VoiceError;
use crate::speech::SpeechRecognizer;

/// A listening session feeding one dispatcher.
pub struct VoiceSession<R> {
    recognizer: R,
    dispatcher: Arc<VoiceQueryDispatcher>,
}

impl<R: SpeechRecognizer> VoiceSession<R> {
    pub fn new(recognizer: R, dispatcher: Arc<VoiceQueryDispatcher>) -> Self {
        Self {
            recognizer,
            dispatcher,
        }
    }

    /// Listen until the recognizer runs dry.
    pub async fn run(self) -> Result<usize, VoiceError> {
        self.run_until(std::future::pending()).await
    }

    /// Listen until the recognizer runs dry or `shutdown` resolves.
    ///
    /// Returns the number of transcripts received. Queries already in flight
    /// are allowed to finish before returning.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<usize, VoiceError>
    where
        F: Future<Output = ()>,
    {
        self.recognizer.begin_listening().await?;
        tracing::info!(dispatcher = %self.dispatcher.id(), "Voice session listening");

        let mut in_flight = JoinSet::new();
        let mut received = 0usize;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Voice session stopping");
                    break;
                }
                transcript = self.recognizer.next_transcript() => {
                    let Some(transcript) = transcript else {
                        tracing::info!("Speech recognizer ended");
                        break;
                    };
                    received += 1;
                    if let Accepted::Pending(query) = self.dispatcher.accept(&transcript.text()) {
                        let dispatcher = Arc::clone(&self.dispatcher);
                        in_flight.spawn(async move {
                            dispatcher.finish(query).await;
                        });
                    }
                }
            }
        }

        self.recognizer.stop_listening();

        while let Some(result) = in_flight.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Voice query task failed");
            }
        }

        Ok(received)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use rally_core::config::VoiceConfig;
    use rally_core::{ConversationMessage, Role, SharedStatStore};

    use crate::answers;
    use crate::remote::RemoteModel;
    use crate::speech::{LineRecognizer, SpeechSynthesizer, Transcript, Utterance};

    #[derive(Default)]
    struct RecordingSynth {
        spoken: Mutex<Vec<String>>,
    }

    impl SpeechSynthesizer for RecordingSynth {
        fn speak(&self, utterance: Utterance) {
            self.spoken.lock().unwrap().push(utterance.text);
        }
    }

    struct FixedModel;

    #[async_trait]
    impl RemoteModel for FixedModel {
        async fn ask(
            &self,
            _prompt: &str,
            _history: &[ConversationMessage],
        ) -> Result<Option<String>, VoiceError> {
            Ok(Some("respuesta".to_string()))
        }
    }

    /// Recognizer that refuses to start.
    struct BrokenRecognizer;

    #[async_trait]
    impl SpeechRecognizer for BrokenRecognizer {
        async fn begin_listening(&mut self) -> Result<(), VoiceError> {
            Err(VoiceError::RecognizerUnavailable("no microphone".to_string()))
        }

        async fn next_transcript(&mut self) -> Option<Transcript> {
            None
        }

        fn stop_listening(&mut self) {}
    }

    /// Recognizer that never yields anything.
    struct SilentRecognizer {
        stopped: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl SpeechRecognizer for SilentRecognizer {
        async fn begin_listening(&mut self) -> Result<(), VoiceError> {
            Ok(())
        }

        async fn next_transcript(&mut self) -> Option<Transcript> {
            std::future::pending().await
        }

        fn stop_listening(&mut self) {
            *self.stopped.lock().unwrap() = true;
        }
    }

    fn dispatcher(synth: Arc<RecordingSynth>) -> Arc<VoiceQueryDispatcher> {
        let stats = SharedStatStore::new();
        stats.lock().record_serve(175.0);
        Arc::new(VoiceQueryDispatcher::new(
            &VoiceConfig::default(),
            stats,
            Arc::new(FixedModel),
            synth,
        ))
    }

    #[tokio::test]
    async fn test_session_dispatches_every_line() {
        let synth = Arc::new(RecordingSynth::default());
        let dispatcher = dispatcher(synth.clone());
        let input: &[u8] = b"velocidad del saque\n\nhola\nactivar\n";

        let session = VoiceSession::new(LineRecognizer::new(input), Arc::clone(&dispatcher));
        let received = session.run().await.unwrap();

        // The blank line is still a transcript; the dispatcher drops it.
        assert_eq!(received, 4);

        let mut spoken = synth.spoken.lock().unwrap().clone();
        spoken.sort();
        let mut expected = vec![
            answers::MIC_ACTIVATED.to_string(),
            "La velocidad máxima de saque registrada es 175 km/h.".to_string(),
            "respuesta".to_string(),
        ];
        expected.sort();
        assert_eq!(spoken, expected);

        // Two conversational turns, each a user/assistant pair.
        assert_eq!(dispatcher.conversation().len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_session_keeps_arrival_order_across_workers() {
        for _ in 0..200 {
            let synth = Arc::new(RecordingSynth::default());
            let dispatcher = dispatcher(synth.clone());
            dispatcher.toggle_mute();
            let input: &[u8] = b"activar\nduracion del punto\nvelocidad del saque\n";

            let session = VoiceSession::new(LineRecognizer::new(input), Arc::clone(&dispatcher));
            assert_eq!(session.run().await.unwrap(), 3);

            let users: Vec<String> = dispatcher
                .conversation()
                .into_iter()
                .filter(|m| m.role == Role::User)
                .map(|m| m.content)
                .collect();
            assert_eq!(users, vec!["duracion del punto", "velocidad del saque"]);
            assert_eq!(dispatcher.conversation().len(), 4);
            assert_eq!(synth.spoken.lock().unwrap()[0], answers::MIC_ACTIVATED);
        }
    }

    #[tokio::test]
    async fn test_session_propagates_begin_failure() {
        let synth = Arc::new(RecordingSynth::default());
        let session = VoiceSession::new(BrokenRecognizer, dispatcher(synth));
        let err = session.run().await.unwrap_err();
        assert!(matches!(err, VoiceError::RecognizerUnavailable(_)));
    }

    #[tokio::test]
    async fn test_session_stops_on_shutdown() {
        let synth = Arc::new(RecordingSynth::default());
        let stopped = Arc::new(Mutex::new(false));
        let recognizer = SilentRecognizer {
            stopped: Arc::clone(&stopped),
        };
        let session = VoiceSession::new(recognizer, dispatcher(synth));

        let received = session.run_until(async {}).await.unwrap();
        assert_eq!(received, 0);
        assert!(*stopped.lock().unwrap());
    }
}
