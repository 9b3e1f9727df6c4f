// Test doubles for the assistant's collaborators.
//
// Each double records what the assistant asked of it so tests can assert on
// calls without a network, a microphone, or a speaker.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::Notify;

use fenceline_core::speech::RecognitionConfig;
use fenceline_core::{
    Assistant, AssistantSettings, BusinessDataSnapshot, Collaborators, HandoffSlot, HighlightBus,
    ModelClient, ModelRequest, Navigator, SnapshotSource, SpeechCapabilities, SpeechRecognizer,
    SpeechSynthesizer,
};

/// Model that answers from a queue of canned replies
pub struct ScriptedModel {
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedModel {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(anyhow!(message.to_string()))])),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        })
    }

    /// Replies only after `gate` is notified
    pub fn gated(reply: &str, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Ok(reply.to_string())])),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: Some(gate),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, request: &ModelRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Ok("{}".to_string()))
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// Navigator that records each visit together with what the handoff slot held
/// at that moment
pub struct RecordingNavigator {
    handoff: HandoffSlot,
    visits: Mutex<Vec<(String, Option<String>)>>,
}

impl RecordingNavigator {
    pub fn new(handoff: HandoffSlot) -> Arc<Self> {
        Arc::new(Self {
            handoff,
            visits: Mutex::new(Vec::new()),
        })
    }

    pub fn visits(&self) -> Vec<(String, Option<String>)> {
        self.visits.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.visits().into_iter().map(|(path, _)| path).collect()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visits
            .lock()
            .unwrap()
            .push((path.to_string(), self.handoff.peek()));
    }
}

#[derive(Debug, Default)]
pub struct RecognizerLog {
    pub starts: usize,
    pub stops: usize,
    pub aborts: usize,
    pub last_config: Option<RecognitionConfig>,
}

pub struct FakeRecognizer {
    log: Arc<Mutex<RecognizerLog>>,
    refuse_start: bool,
}

impl FakeRecognizer {
    pub fn new() -> (Box<Self>, Arc<Mutex<RecognizerLog>>) {
        let log = Arc::new(Mutex::new(RecognizerLog::default()));
        let recognizer = Box::new(Self {
            log: Arc::clone(&log),
            refuse_start: false,
        });
        (recognizer, log)
    }

    pub fn refusing() -> (Box<Self>, Arc<Mutex<RecognizerLog>>) {
        let (mut recognizer, log) = Self::new();
        recognizer.refuse_start = true;
        (recognizer, log)
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(&mut self, config: &RecognitionConfig) -> anyhow::Result<()> {
        if self.refuse_start {
            return Err(anyhow!("not-allowed"));
        }
        let mut log = self.log.lock().unwrap();
        log.starts += 1;
        log.last_config = Some(config.clone());
        Ok(())
    }

    fn stop(&mut self) {
        self.log.lock().unwrap().stops += 1;
    }

    fn abort(&mut self) {
        self.log.lock().unwrap().aborts += 1;
    }
}

#[derive(Default)]
pub struct FakeSynthesizer {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn speak(&self, text: &str) -> anyhow::Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// An assistant wired to doubles, plus handles on the doubles
pub struct Harness {
    pub assistant: Assistant,
    pub navigator: Arc<RecordingNavigator>,
    pub handoff: HandoffSlot,
    pub highlights: HighlightBus,
}

pub fn harness(model: Option<Arc<ScriptedModel>>, speech: SpeechCapabilities) -> Harness {
    harness_with_data(
        model,
        speech,
        Arc::new(BusinessDataSnapshot::placeholder()),
    )
}

pub fn harness_with_data(
    model: Option<Arc<ScriptedModel>>,
    speech: SpeechCapabilities,
    data: Arc<dyn SnapshotSource>,
) -> Harness {
    let handoff = HandoffSlot::new();
    let highlights = HighlightBus::new();
    let navigator = RecordingNavigator::new(handoff.clone());

    let assistant = Assistant::new(
        model.map(|m| m as Arc<dyn ModelClient>),
        Collaborators {
            data,
            navigator: Arc::clone(&navigator) as Arc<dyn Navigator>,
            handoff: handoff.clone(),
            highlights: highlights.clone(),
            speech,
        },
        AssistantSettings::default(),
    );

    Harness {
        assistant,
        navigator,
        handoff,
        highlights,
    }
}
