pub mod gemini;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::prompt::ModelRequest;
use crate::provider::Provider;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;

/// A generative text model the assistant can ask for a reply
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one prompt and return the raw reply text
    async fn generate(&self, request: &ModelRequest) -> Result<String>;

    /// Model name, for display and logging
    fn model(&self) -> &str;
}

/// Build the client for `provider` from configuration.
///
/// Returns `None` when the provider needs an API key and none is available;
/// the assistant then runs in its not-configured mode.
pub fn connect(config: &Config, provider: Provider) -> Option<Arc<dyn ModelClient>> {
    let model = config.model_for(provider);
    match provider {
        Provider::Gemini => config
            .api_key_for(provider)
            .map(|key| Arc::new(GeminiClient::new(&key, &model)) as Arc<dyn ModelClient>),
        Provider::OpenAI => config
            .api_key_for(provider)
            .map(|key| Arc::new(OpenAIClient::new(&key, &model)) as Arc<dyn ModelClient>),
        Provider::Ollama => Some(Arc::new(OllamaClient::new(config.ollama_url(), &model))),
    }
}
