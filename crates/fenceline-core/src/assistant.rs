//! The assistant interaction loop.
//!
//! One turn runs `Idle → Capturing → AwaitingModel → Interpreting →
//! Dispatching → Idle`. The model call is the only suspend point: it runs as a
//! spawned task, and the host completes the turn with
//! [`Assistant::finish_turn`] once [`Assistant::turn_ready`] says so (or just
//! awaits it). Until then further submissions are rejected.
//!
//! Every failure past submission ends up as an assistant message in the
//! transcript; nothing is returned to the host as an error once a turn starts.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::ai::ModelClient;
use crate::business::SnapshotSource;
use crate::config::AssistantSettings;
use crate::effects::{Navigator, PendingEffects};
use crate::error::{AssistantError, Result};
use crate::highlight::{HandoffSlot, HighlightBus};
use crate::prompt::{build_prompt, finalize_utterance};
use crate::response::{HighlightEffect, Interpretation};
use crate::speech::{
    RecognitionConfig, RecognitionEvent, SpeechCapabilities, SpeechRecognizer, SpeechSynthesizer,
    SynthesisEvent,
};
use crate::state::{ChatMessage, InteractionState, Transcript, TurnPhase};

pub const NOT_CONFIGURED_MESSAGE: &str = "The AI assistant is not configured. Set GEMINI_API_KEY in your environment or add an API key to the config file.";

pub const PROCESSING_ERROR_MESSAGE: &str = "I'm having trouble processing your request right now. Please try again or navigate manually using the number keys.";

pub const MICROPHONE_PERMISSION_MESSAGE: &str = "I couldn't access the microphone. Please check that microphone access is allowed and try again.";

fn greeting(model: &str) -> String {
    format!(
        "Hi! I'm your AI assistant, powered by {}. How can I help you today?",
        model
    )
}

fn recognition_error_message(code: &str) -> String {
    format!(
        "Sorry, I couldn't catch that (speech recognition error: {}). Please try again.",
        code
    )
}

/// The views and services the assistant drives
pub struct Collaborators {
    pub data: Arc<dyn SnapshotSource>,
    pub navigator: Arc<dyn Navigator>,
    pub handoff: HandoffSlot,
    pub highlights: HighlightBus,
    pub speech: SpeechCapabilities,
}

pub struct Assistant {
    client: Option<Arc<dyn ModelClient>>,
    data: Arc<dyn SnapshotSource>,
    navigator: Arc<dyn Navigator>,
    handoff: HandoffSlot,
    highlights: HighlightBus,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    settings: AssistantSettings,

    state: InteractionState,
    phase: TurnPhase,
    transcript: Transcript,
    in_flight: Option<JoinHandle<anyhow::Result<String>>>,
    pending: PendingEffects,
}

impl Assistant {
    /// Create an assistant. `client` is `None` when no credential was found;
    /// the assistant then explains that and refuses submissions.
    pub fn new(
        client: Option<Arc<dyn ModelClient>>,
        collaborators: Collaborators,
        settings: AssistantSettings,
    ) -> Self {
        let Collaborators {
            data,
            navigator,
            handoff,
            highlights,
            speech,
        } = collaborators;

        let mut transcript = Transcript::new();
        transcript.push(match &client {
            Some(client) => ChatMessage::assistant(greeting(client.model())),
            None => ChatMessage::assistant(NOT_CONFIGURED_MESSAGE),
        });

        info!(
            configured = client.is_some(),
            voice_input = speech.recognizer.is_some(),
            voice_output = speech.synthesizer.is_some(),
            "assistant ready"
        );

        Self {
            client,
            data,
            navigator,
            handoff,
            highlights,
            recognizer: speech.recognizer,
            synthesizer: speech.synthesizer,
            settings,
            state: InteractionState::default(),
            phase: TurnPhase::Idle,
            transcript,
            in_flight: None,
            pending: PendingEffects::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn model_name(&self) -> Option<&str> {
        self.client.as_deref().map(|c| c.model())
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.transcript.messages()
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    /// A microphone affordance should be shown
    pub fn can_listen(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Speaker affordances should be shown
    pub fn can_speak(&self) -> bool {
        self.synthesizer.is_some()
    }

    pub fn is_awaiting_model(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The send affordance is enabled
    pub fn can_submit(&self) -> bool {
        self.is_configured()
            && !self.state.loading
            && !self.state.listening
            && finalize_utterance(&self.state.input).is_some()
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.pending.has_pending_navigation()
    }

    // ------------------------------------------------------------------
    // Panel
    // ------------------------------------------------------------------

    pub fn open(&mut self) {
        self.state.open = true;
    }

    /// Hide the panel. The transcript and any in-flight turn are kept.
    pub fn close(&mut self) {
        self.state.open = false;
    }

    pub fn toggle_open(&mut self) {
        self.state.open = !self.state.open;
    }

    pub fn toggle_minimized(&mut self) {
        self.state.minimized = !self.state.minimized;
    }

    pub fn set_speak_responses(&mut self, enabled: bool) {
        self.settings.speak_responses = enabled;
        if !enabled {
            self.stop_speaking();
        }
    }

    /// Swap the model client, e.g. after the provider changed in settings
    pub fn set_model_client(&mut self, client: Option<Arc<dyn ModelClient>>) {
        let note = match &client {
            Some(client) => format!("Switched to {}.", client.model()),
            None => NOT_CONFIGURED_MESSAGE.to_string(),
        };
        info!(configured = client.is_some(), "assistant model client replaced");
        self.client = client;
        self.transcript.push(ChatMessage::assistant(note));
    }

    // ------------------------------------------------------------------
    // Text capture
    // ------------------------------------------------------------------

    pub fn input(&self) -> &str {
        &self.state.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.state.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    /// Enter submits; Shift+Enter inserts a newline
    pub fn handle_enter(&mut self, shift: bool) -> Result<()> {
        if shift {
            self.state.input.push('\n');
            return Ok(());
        }
        self.submit()
    }

    /// Submit the input buffer as an utterance. The buffer is cleared only
    /// when the turn actually starts.
    pub fn submit(&mut self) -> Result<()> {
        let input = self.state.input.clone();
        self.submit_utterance(&input)?;
        self.state.input.clear();
        Ok(())
    }

    /// Start a turn for `raw`.
    ///
    /// Appends the user message and spawns the model call. Rejections leave
    /// the transcript untouched.
    pub fn submit_utterance(&mut self, raw: &str) -> Result<()> {
        if self.in_flight.is_some() {
            debug!("submission rejected, a turn is in flight");
            return Err(AssistantError::TurnInFlight);
        }
        let Some(client) = self.client.clone() else {
            return Err(AssistantError::NotConfigured);
        };
        let Some(utterance) = finalize_utterance(raw) else {
            return Err(AssistantError::EmptyUtterance);
        };

        // A new turn owns the effects from here on
        self.pending.cancel_all();

        self.phase = TurnPhase::Capturing;
        self.transcript.push(ChatMessage::user(utterance));

        let request = build_prompt(utterance, &self.data.snapshot());
        info!(
            chars = utterance.len(),
            prompt_chars = request.prompt.len(),
            model = client.model(),
            "assistant turn started"
        );

        self.state.loading = true;
        self.phase = TurnPhase::AwaitingModel;
        self.in_flight = Some(tokio::spawn(async move {
            client.generate(&request).await
        }));
        Ok(())
    }

    /// The model call has finished and the turn can be completed without
    /// waiting
    pub fn turn_ready(&self) -> bool {
        self.in_flight.as_ref().is_some_and(|h| h.is_finished())
    }

    /// Wait for the in-flight model call and apply its effects.
    ///
    /// Returns `false` if no turn was in flight.
    pub async fn finish_turn(&mut self) -> bool {
        let Some(handle) = self.in_flight.take() else {
            return false;
        };

        let outcome = handle.await;
        self.phase = TurnPhase::Interpreting;

        let interpretation = match outcome {
            Ok(Ok(raw)) => {
                debug!(reply_chars = raw.len(), "model replied");
                Interpretation::from_raw(&raw)
            }
            Ok(Err(e)) => {
                error!("assistant turn failed: {}", AssistantError::Model(e));
                Self::error_interpretation()
            }
            Err(e) => {
                error!("assistant model task failed: {}", AssistantError::from(e));
                Self::error_interpretation()
            }
        };

        self.dispatch(interpretation);
        true
    }

    /// Submit and complete one turn
    pub async fn run_turn(&mut self, raw: &str) -> Result<()> {
        self.submit_utterance(raw)?;
        self.finish_turn().await;
        Ok(())
    }

    fn error_interpretation() -> Interpretation {
        Interpretation {
            display_text: PROCESSING_ERROR_MESSAGE.to_string(),
            spoken_text: PROCESSING_ERROR_MESSAGE.to_string(),
            navigation: None,
            highlight: None,
        }
    }

    fn dispatch(&mut self, interpretation: Interpretation) {
        self.phase = TurnPhase::Dispatching;

        let Interpretation {
            display_text,
            spoken_text,
            navigation,
            highlight,
        } = interpretation;

        self.transcript.push(ChatMessage::assistant(display_text));

        let handoff_id = match highlight {
            Some(HighlightEffect::Broadcast(id)) => {
                if !self.data.snapshot().contains_id(&id) {
                    warn!(%id, "model asked to highlight an unknown id");
                }
                self.highlights.publish(id);
                None
            }
            Some(HighlightEffect::Handoff(id)) => Some(id),
            None => None,
        };

        if let Some(path) = navigation {
            self.pending.schedule_navigation(
                Arc::clone(&self.navigator),
                self.handoff.clone(),
                path,
                handoff_id,
                self.settings.navigation_delay,
            );
        }

        if self.settings.speak_responses {
            if let Some(synthesizer) = &self.synthesizer {
                self.pending.schedule_speech(
                    Arc::clone(synthesizer),
                    spoken_text,
                    self.settings.speech_delay,
                );
            }
        }

        self.state.loading = false;
        self.phase = TurnPhase::Idle;
        debug!("assistant turn complete");
    }

    // ------------------------------------------------------------------
    // Voice capture
    // ------------------------------------------------------------------

    /// Begin a recognition session. No-op without a recognizer, while
    /// already listening, or while a turn is in flight.
    pub fn start_listening(&mut self) {
        if self.state.listening || self.in_flight.is_some() {
            return;
        }
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };

        let config = RecognitionConfig::single_utterance(self.settings.locale.clone());
        match recognizer.start(&config) {
            Ok(()) => {
                info!(locale = %config.locale, "listening");
                self.state.listening = true;
                self.phase = TurnPhase::Capturing;
            }
            Err(e) => {
                warn!("{}", AssistantError::RecognitionStart(e.to_string()));
                self.state.listening = false;
                self.transcript
                    .push(ChatMessage::assistant(MICROPHONE_PERMISSION_MESSAGE));
            }
        }
    }

    /// Ask the recognizer to finish. `listening` clears when it reports back.
    pub fn stop_listening(&mut self) {
        if !self.state.listening {
            return;
        }
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.stop();
        }
    }

    pub fn toggle_listening(&mut self) {
        if self.state.listening {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    /// Feed a recognizer callback into the loop.
    ///
    /// A result is shown in the input and becomes due for submission after
    /// the voice submit delay. The host then calls [`Assistant::submit_voice`],
    /// which takes the same path as typed text.
    pub fn handle_recognition_event(&mut self, event: RecognitionEvent) {
        match event {
            RecognitionEvent::Result(results) => {
                self.state.listening = false;
                let Some(text) = RecognitionEvent::transcript(&results).map(str::to_string) else {
                    self.phase = TurnPhase::Idle;
                    return;
                };
                debug!(chars = text.len(), "voice result");
                self.state.input = text;
                self.pending
                    .schedule_voice_submit(self.settings.voice_submit_delay);
            }
            RecognitionEvent::Error(code) => {
                warn!(%code, "speech recognition error");
                self.state.listening = false;
                self.phase = TurnPhase::Idle;
                self.transcript
                    .push(ChatMessage::assistant(recognition_error_message(&code)));
            }
            RecognitionEvent::End => {
                if self.state.listening {
                    debug!("recognition ended without a result");
                }
                self.state.listening = false;
                if self.phase == TurnPhase::Capturing {
                    self.phase = TurnPhase::Idle;
                }
            }
        }
    }

    /// A recognized utterance is waiting to be submitted and its pause has
    /// elapsed
    pub fn voice_submit_ready(&self) -> bool {
        self.pending.voice_submit_due()
    }

    pub fn has_pending_voice_submit(&self) -> bool {
        self.pending.has_pending_voice_submit()
    }

    /// Wait out the voice submit pause, then submit the input.
    ///
    /// Returns `false` if nothing was pending, the pause was cancelled, or the
    /// submission was rejected.
    pub async fn submit_voice(&mut self) -> bool {
        let Some(pause) = self.pending.take_voice_submit() else {
            return false;
        };
        if pause.await.is_err() {
            return false;
        }
        match self.submit() {
            Ok(()) => true,
            Err(e) => {
                debug!("voice submission not sent: {}", e);
                self.phase = TurnPhase::Idle;
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Voice output
    // ------------------------------------------------------------------

    pub fn handle_synthesis_event(&mut self, event: SynthesisEvent) {
        self.state.speaking = matches!(event, SynthesisEvent::Started);
    }

    /// Cut off the current utterance and drop any that is still scheduled
    pub fn stop_speaking(&mut self) {
        self.pending.cancel_speech();
        if let Some(synthesizer) = &self.synthesizer {
            synthesizer.cancel();
        }
        self.state.speaking = false;
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Release everything the assistant started: recognition, speech,
    /// scheduled effects and the in-flight model call. Idempotent.
    pub fn shutdown(&mut self) {
        if self.state.listening {
            if let Some(recognizer) = self.recognizer.as_mut() {
                info!("aborting speech recognition");
                recognizer.abort();
            }
        }
        // An utterance handed to the synthesizer may not have reported
        // `Started` yet, so cancel whenever there is a synthesizer at all
        if let Some(synthesizer) = &self.synthesizer {
            synthesizer.cancel();
        }
        self.pending.cancel_all();
        if let Some(handle) = self.in_flight.take() {
            debug!("dropping in-flight model call");
            handle.abort();
        }

        self.state.listening = false;
        self.state.speaking = false;
        self.state.loading = false;
        self.phase = TurnPhase::Idle;
    }
}

impl Drop for Assistant {
    fn drop(&mut self) {
        self.shutdown();
    }
}
