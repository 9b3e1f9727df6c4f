pub mod ai;
pub mod assistant;
pub mod business;
pub mod config;
pub mod effects;
pub mod error;
pub mod highlight;
pub mod prompt;
pub mod provider;
pub mod response;
pub mod routes;
pub mod speech;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use ai::{connect, GeminiClient, ModelClient, OllamaClient, OpenAIClient};
pub use assistant::{Assistant, Collaborators};
pub use business::{BusinessDataSnapshot, SnapshotSource};
pub use config::{AssistantSettings, Config};
pub use effects::Navigator;
pub use error::{AssistantError, Result};
pub use highlight::{ActiveHighlight, HandoffSlot, HighlightBus, HighlightEvent};
pub use prompt::ModelRequest;
pub use provider::Provider;
pub use response::{AssistantResponse, Interpretation};
pub use routes::Route;
pub use speech::{
    RecognitionEvent, RecognitionResult, SpeechCapabilities, SpeechRecognizer, SpeechSynthesizer,
    SynthesisEvent,
};
pub use state::{ChatMessage, ChatRole, InteractionState, TurnPhase};
pub use store::{DataStore, NewCustomer, NewJob, NewQuote};
