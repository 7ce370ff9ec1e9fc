//! Voice assistant for Rally.
//!
//! Routes recognized speech either to local match analytics or to the
//! text-generation proxy, keeps the conversation history, and speaks
//! answers back through a pluggable synthesizer.

pub mod answers;
pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod mute;
pub mod remote;
pub mod session;
pub mod speech;

pub use dispatcher::{Accepted, PendingQuery, VoiceQueryDispatcher};
pub use error::VoiceError;
pub use intent::{Intent, IntentRouter};
pub use mute::{MuteControl, MuteState};
pub use remote::{ProxyClient, RemoteModel};
pub use session::VoiceSession;
pub use speech::{
    ConsoleSynthesizer, LineRecognizer, SpeechRecognizer, SpeechSynthesizer, Transcript,
    TracingSynthesizer, Utterance,
};
