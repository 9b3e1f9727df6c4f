use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use fenceline_core::{
    connect, ActiveHighlight, Assistant, AssistantError, ChatMessage, Collaborators, Config,
    DataStore, HandoffSlot, HighlightBus, HighlightEvent, Navigator, NewCustomer, Provider, Route,
    SpeechCapabilities,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    /// Typing a new customer into the footer form
    NewCustomer,
}

/// Parse the new-customer form: `name; email; phone; address; notes`.
///
/// Only the name is required; missing trailing fields are left blank.
pub fn parse_new_customer(line: &str) -> Option<NewCustomer> {
    let mut fields = line.split(';').map(str::trim);
    let name = fields.next().filter(|n| !n.is_empty())?.to_string();
    let mut next = || fields.next().unwrap_or_default().to_string();
    Some(NewCustomer {
        name,
        email: next(),
        phone: next(),
        address: next(),
        notes: next(),
    })
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub route: Route,
    pub input_mode: InputMode,

    // Assistant
    pub assistant: Assistant,
    pub input_cursor: usize, // cursor position in the assistant input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub status: Option<String>,

    // Highlight channels
    pub handoff: HandoffSlot,
    highlight_rx: broadcast::Receiver<HighlightEvent>,
    pub highlight: ActiveHighlight,

    // Business data shown in the views
    pub data: Arc<DataStore>,
    pub form: String,

    // Settings
    pub config: Config,
    pub provider: Provider,
    pub config_path: Option<PathBuf>,
    pub log_path: Option<PathBuf>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(
        config: Config,
        config_path: Option<PathBuf>,
        log_path: Option<PathBuf>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let provider = config.provider();
        let data = Arc::new(DataStore::placeholder());
        let handoff = HandoffSlot::new();
        let highlights = HighlightBus::new();
        let highlight_rx = highlights.subscribe();

        let mut assistant = Assistant::new(
            connect(&config, provider),
            Collaborators {
                data: data.clone(),
                navigator,
                handoff: handoff.clone(),
                highlights,
                // No speech adapters for the terminal
                speech: SpeechCapabilities::none(),
            },
            config.assistant_settings(),
        );
        assistant.open();

        Self {
            should_quit: false,
            route: Route::Dashboard,
            input_mode: InputMode::Normal,

            assistant,
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            status: None,

            handoff,
            highlight_rx,
            highlight: ActiveHighlight::default(),

            data,
            form: String::new(),

            config,
            provider,
            config_path,
            log_path,

            animation_frame: 0,
        }
    }

    /// Show the view for `path`. Unknown paths land on the dashboard.
    ///
    /// The incoming view picks up whatever highlight was handed off for it.
    pub fn navigate_to(&mut self, path: &str) {
        let route = Route::from_path(path).unwrap_or_else(|| {
            warn!(%path, "unknown route, showing dashboard");
            Route::Dashboard
        });
        self.route = route;
        self.highlight.take_from(&self.handoff, Instant::now());
    }

    pub fn switch_to(&mut self, route: Route) {
        self.navigate_to(route.path());
    }

    pub fn is_highlighted(&self, id: &str) -> bool {
        self.highlight.is_highlighted(id, Instant::now())
    }

    /// Periodic housekeeping (called by Tick event)
    pub fn tick(&mut self) {
        if self.assistant.state().loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        let now = Instant::now();
        self.poll_highlights(now);
        self.highlight.expire(now);
    }

    /// Follow highlights broadcast for the view that is showing
    fn poll_highlights(&mut self, now: Instant) {
        loop {
            match self.highlight_rx.try_recv() {
                Ok(event) => self.highlight.show(event.id, now),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "highlight events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    /// Submit a recognized utterance once its pause is over, and complete
    /// the assistant's turn once its model call has returned
    pub async fn poll_assistant(&mut self) {
        if self.assistant.voice_submit_ready() && self.assistant.submit_voice().await {
            self.scroll_chat_to_bottom();
        }
        if self.assistant.turn_ready() {
            self.assistant.finish_turn().await;
            self.scroll_chat_to_bottom();
        }
    }

    /// Submit (or, with Shift, extend) the assistant input
    pub fn press_enter(&mut self, shift: bool) {
        match self.assistant.handle_enter(shift) {
            Ok(()) if shift => {
                self.input_cursor = self.assistant.input().chars().count();
            }
            Ok(()) => {
                self.input_cursor = 0;
                self.input_mode = InputMode::Normal;
                self.status = None;
                self.scroll_chat_to_bottom();
            }
            Err(AssistantError::EmptyUtterance) => {}
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    pub fn begin_new_customer(&mut self) {
        self.form.clear();
        self.input_mode = InputMode::NewCustomer;
    }

    /// Add the customer typed into the form and point at the new row
    pub fn submit_new_customer(&mut self) {
        let Some(customer) = parse_new_customer(&self.form) else {
            self.status = Some("A customer needs a name".to_string());
            return;
        };
        let id = self.data.add_customer(customer);
        self.form.clear();
        self.input_mode = InputMode::Normal;
        self.status = None;
        self.switch_to(Route::Customers);
        self.highlight.show(id, Instant::now());
    }

    /// Move to the next provider, rebuild the model client and remember the
    /// choice
    pub fn cycle_provider(&mut self) {
        let provider = self.provider.next();
        self.provider = provider;
        self.config.provider = Some(provider.as_str().to_string());
        // A model name from one provider means nothing to another
        self.config.default_model = None;

        info!(provider = provider.as_str(), "switching provider");
        self.assistant
            .set_model_client(connect(&self.config, provider));
        self.save_config();
        self.scroll_chat_to_bottom();
    }

    pub fn toggle_speak_responses(&mut self) {
        let enabled = !self.assistant.settings().speak_responses;
        self.assistant.set_speak_responses(enabled);
        self.config.speak_responses = Some(enabled);
        self.save_config();
    }

    fn save_config(&mut self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!("failed to save config: {}", e);
            self.status = Some(format!("Could not save settings: {}", e));
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.assistant.messages()
    }

    pub fn scroll_chat_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_chat_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the latest reply (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 40 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            40
        };

        let mut total_lines: u16 = 0;
        for msg in self.messages() {
            // Role line ("You:" or "AI:") and the blank line after the message
            total_lines = total_lines.saturating_add(2);
            for line in msg.content.lines() {
                let wrapped = line.chars().count() / wrap_width + 1;
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
        }
        if self.assistant.state().loading {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Release the assistant's resources before exit
    pub fn shutdown(&mut self) {
        self.assistant.shutdown();
    }
}
