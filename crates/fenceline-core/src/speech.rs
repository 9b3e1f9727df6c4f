//! Speech capability traits
//!
//! Platform adapters implement these; the assistant only talks to the traits.
//! Callbacks become events: the adapter hands [`RecognitionEvent`]s and
//! [`SynthesisEvent`]s to its host, which forwards them to the assistant.
//!
//! A platform without a capability simply passes `None`; the assistant then
//! hides the matching affordance and every related call is a no-op.

use std::sync::Arc;

use anyhow::Result;

/// How a recognition session is set up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// Keep listening after the first utterance
    pub continuous: bool,
    /// Deliver partial transcripts
    pub interim_results: bool,
    pub max_alternatives: u32,
    pub locale: String,
}

impl RecognitionConfig {
    /// One utterance, final results only
    pub fn single_utterance(locale: impl Into<String>) -> Self {
        Self {
            continuous: false,
            interim_results: false,
            max_alternatives: 1,
            locale: locale.into(),
        }
    }
}

/// One recognized result with its alternatives, best first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub alternatives: Vec<String>,
}

/// What a recognizer reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    Result(Vec<RecognitionResult>),
    /// Platform error code, e.g. `network`, `no-speech`, `not-allowed`
    Error(String),
    /// Recognition finished (after a result, an error, or silence)
    End,
}

impl RecognitionEvent {
    /// Top alternative of the first result, as the utterance
    pub fn transcript(results: &[RecognitionResult]) -> Option<&str> {
        results
            .first()
            .and_then(|r| r.alternatives.first())
            .map(String::as_str)
    }
}

/// What a synthesizer reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisEvent {
    Started,
    Finished,
}

/// Speech-to-text
pub trait SpeechRecognizer: Send {
    /// Begin a session. An error here means the platform refused (usually
    /// microphone permission).
    fn start(&mut self, config: &RecognitionConfig) -> Result<()>;

    /// Finish the session, delivering any pending result
    fn stop(&mut self);

    /// Drop the session and release the microphone without a result
    fn abort(&mut self);
}

/// Text-to-speech
pub trait SpeechSynthesizer: Send + Sync {
    /// Queue an utterance
    fn speak(&self, text: &str) -> Result<()>;

    /// Stop the current utterance and clear the queue
    fn cancel(&self);
}

/// Whatever speech support the platform has
#[derive(Default)]
pub struct SpeechCapabilities {
    pub recognizer: Option<Box<dyn SpeechRecognizer>>,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl SpeechCapabilities {
    pub fn none() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_is_top_alternative_of_first_result() {
        let results = vec![
            RecognitionResult {
                alternatives: vec!["show my quotes".to_string(), "show my coats".to_string()],
            },
            RecognitionResult {
                alternatives: vec!["ignored".to_string()],
            },
        ];
        assert_eq!(RecognitionEvent::transcript(&results), Some("show my quotes"));
        assert_eq!(RecognitionEvent::transcript(&[]), None);
    }

    #[test]
    fn test_single_utterance_config_is_final_only() {
        let config = RecognitionConfig::single_utterance("en-US");
        assert!(!config.continuous);
        assert!(!config.interim_results);
        assert_eq!(config.locale, "en-US");
    }
}
