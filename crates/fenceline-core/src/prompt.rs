use crate::business::BusinessDataSnapshot;
use crate::routes::Route;

/// One request to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub prompt: String,
    /// Ask the provider to constrain the reply to JSON
    pub json: bool,
}

/// Trim an utterance, rejecting empty input
pub fn finalize_utterance(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Build the single instruction block for one utterance.
///
/// Deterministic: the same utterance and snapshot always give the same prompt.
pub fn build_prompt(utterance: &str, snapshot: &BusinessDataSnapshot) -> ModelRequest {
    let mut prompt = String::new();

    prompt.push_str("You are a helpful assistant for a fencing contractor's business app. ");
    prompt.push_str("You help the user find information about their quotes, customers, ");
    prompt.push_str("schedule and projects, and you can take them to the right page.\n\n");

    prompt.push_str("Current business data:\n");
    prompt.push_str(&snapshot.to_pretty_string());
    prompt.push_str("\n\n");

    prompt.push_str("Available pages:\n");
    for route in Route::ALL {
        prompt.push_str(&format!("- {}: {}\n", route.name(), route.path()));
    }
    prompt.push('\n');

    prompt.push_str("Respond with a single JSON object using these optional keys:\n");
    prompt.push_str("- \"navigation\": the path of the page to open (e.g. \"/quotes\"), only when the user wants to go somewhere\n");
    prompt.push_str("- \"text\": a helpful, complete answer for the user\n");
    prompt.push_str("- \"summary\": a short version of the answer suitable for reading aloud\n");
    prompt.push_str("- \"toHighlight\": the id of one quote, customer, schedule item or project to highlight (e.g. \"C002\")\n");
    prompt.push_str("Always include \"text\" so the user gets an answer. ");
    prompt.push_str("Only use ids and paths that appear above.\n\n");

    prompt.push_str("User question: \"");
    prompt.push_str(utterance);
    prompt.push('"');

    ModelRequest { prompt, json: true }
}
