//! Deferred side effects: the delayed navigation and the delayed speech of a
//! turn, and the pause before a recognized utterance is submitted. Each is a
//! task owned by whoever scheduled it, so a new turn or teardown can cancel
//! whatever is still waiting.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::highlight::HandoffSlot;
use crate::speech::SpeechSynthesizer;

/// Client-side router the assistant drives. Fire-and-forget.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

#[derive(Default)]
pub struct PendingEffects {
    navigation: Option<JoinHandle<()>>,
    speech: Option<JoinHandle<()>>,
    voice_submit: Option<JoinHandle<()>>,
}

impl PendingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigate to `path` after `delay`, handing `highlight` to the target first
    pub fn schedule_navigation(
        &mut self,
        navigator: Arc<dyn Navigator>,
        handoff: HandoffSlot,
        path: String,
        highlight: Option<String>,
        delay: Duration,
    ) {
        if let Some(previous) = self.navigation.take() {
            previous.abort();
        }
        debug!(%path, delay_ms = delay.as_millis() as u64, "navigation scheduled");

        self.navigation = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(id) = highlight {
                handoff.set(id);
            }
            info!(%path, "assistant navigating");
            navigator.navigate(&path);
        }));
    }

    /// Speak `text` after `delay`, cutting off anything already playing
    pub fn schedule_speech(
        &mut self,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        text: String,
        delay: Duration,
    ) {
        self.cancel_speech();
        self.speech = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            synthesizer.cancel();
            if let Err(e) = synthesizer.speak(&text) {
                warn!("speech synthesis failed: {}", e);
            }
        }));
    }

    /// Start the pause before a voice result is submitted. Only the timer
    /// runs here; the owner submits once it has elapsed.
    pub fn schedule_voice_submit(&mut self, delay: Duration) {
        self.cancel_voice_submit();
        self.voice_submit = Some(tokio::spawn(tokio::time::sleep(delay)));
    }

    /// The voice submit pause has elapsed
    pub fn voice_submit_due(&self) -> bool {
        self.voice_submit.as_ref().is_some_and(|h| h.is_finished())
    }

    pub fn has_pending_voice_submit(&self) -> bool {
        self.voice_submit.is_some()
    }

    pub fn take_voice_submit(&mut self) -> Option<JoinHandle<()>> {
        self.voice_submit.take()
    }

    pub fn cancel_voice_submit(&mut self) {
        if let Some(task) = self.voice_submit.take() {
            debug!("cancelling pending voice submission");
            task.abort();
        }
    }

    pub fn has_pending_navigation(&self) -> bool {
        self.navigation.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn cancel_speech(&mut self) {
        if let Some(task) = self.speech.take() {
            task.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        if let Some(task) = self.navigation.take() {
            if !task.is_finished() {
                debug!("cancelling pending navigation");
            }
            task.abort();
        }
        self.cancel_speech();
        self.cancel_voice_submit();
    }
}

impl Drop for PendingEffects {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
