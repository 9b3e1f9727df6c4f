use serde::Deserialize;
use tracing::debug;

use crate::routes::{display_name, normalize_navigation};

/// Shown when a reply carries neither text nor navigation
pub const UNHELPFUL_REPLY: &str = "I'm not sure how to help with that. Please try again.";

/// The structured reply the model is asked to produce
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AssistantResponse {
    #[serde(default)]
    pub navigation: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default, rename = "toHighlight")]
    pub to_highlight: Option<String>,
}

impl AssistantResponse {
    /// Parse a raw reply, falling back to treating it as plain text
    pub fn parse(raw: &str) -> Self {
        // Only a JSON object counts; serde would happily read `["quotes"]`
        // positionally into the fields.
        let parsed = serde_json::from_str::<serde_json::Value>(strip_code_fence(raw))
            .ok()
            .filter(serde_json::Value::is_object)
            .and_then(|value| serde_json::from_value::<AssistantResponse>(value).ok());

        match parsed {
            Some(parsed) => parsed.without_blanks(),
            None => {
                debug!("reply is not a JSON object, using it as text");
                Self {
                    text: Some(raw.to_string()),
                    summary: Some(raw.to_string()),
                    ..Self::default()
                }
                .without_blanks()
            }
        }
    }

    fn without_blanks(self) -> Self {
        let keep = |field: Option<String>| field.filter(|v| !v.trim().is_empty());
        Self {
            navigation: keep(self.navigation),
            text: keep(self.text),
            summary: keep(self.summary),
            to_highlight: keep(self.to_highlight).map(|id| id.trim().to_string()),
        }
    }
}

/// How a highlight id reaches the views
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightEffect {
    /// Stored for the navigation target to pick up once it renders
    Handoff(String),
    /// Published to whatever view is currently showing
    Broadcast(String),
}

/// What the dispatcher should do with one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    /// Appended to the transcript
    pub display_text: String,
    /// Read aloud, if speech is on
    pub spoken_text: String,
    /// Normalized path to open after the navigation delay
    pub navigation: Option<String>,
    pub highlight: Option<HighlightEffect>,
}

impl Interpretation {
    pub fn from_response(response: AssistantResponse) -> Self {
        let navigation = response.navigation.as_deref().map(normalize_navigation);

        let display_text = match (&response.text, &navigation) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => {
                format!("Sure, taking you to the {} page.", display_name(path))
            }
            (None, None) => response
                .summary
                .clone()
                .unwrap_or_else(|| UNHELPFUL_REPLY.to_string()),
        };
        let spoken_text = response.summary.unwrap_or_else(|| display_text.clone());

        let highlight = response.to_highlight.map(|id| {
            if navigation.is_some() {
                HighlightEffect::Handoff(id)
            } else {
                HighlightEffect::Broadcast(id)
            }
        });

        Self {
            display_text,
            spoken_text,
            navigation,
            highlight,
        }
    }

    /// Parse and interpret a raw model reply. Never fails.
    pub fn from_raw(raw: &str) -> Self {
        Self::from_response(AssistantResponse::parse(raw))
    }
}

/// Local models like to wrap JSON in a markdown fence
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_route_name_is_normalized() {
        let i = Interpretation::from_raw(r#"{"navigation": "quotes", "text": "ok"}"#);
        assert_eq!(i.navigation.as_deref(), Some("/quotes"));
        assert_eq!(i.display_text, "ok");
        assert_eq!(i.spoken_text, "ok");
    }

    #[test]
    fn test_text_only_reply_has_no_navigation() {
        let i = Interpretation::from_raw(r#"{"text": "Here are your stats."}"#);
        assert_eq!(i.navigation, None);
        assert_eq!(i.display_text, "Here are your stats.");
        assert_eq!(i.highlight, None);
    }

    #[test]
    fn test_navigation_without_text_generates_a_message() {
        let i = Interpretation::from_raw(r#"{"navigation": "/schedule"}"#);
        assert_eq!(i.display_text, "Sure, taking you to the schedule page.");
    }

    #[test]
    fn test_highlight_goes_through_handoff_when_navigating() {
        let i = Interpretation::from_raw(r#"{"navigation": "/customers", "toHighlight": "C002"}"#);
        assert_eq!(i.highlight, Some(HighlightEffect::Handoff("C002".to_string())));
    }

    #[test]
    fn test_highlight_is_broadcast_when_staying() {
        let i = Interpretation::from_raw(r#"{"text": "That's Sarah.", "toHighlight": "C002"}"#);
        assert_eq!(i.highlight, Some(HighlightEffect::Broadcast("C002".to_string())));
    }

    #[test]
    fn test_unparseable_reply_is_used_verbatim() {
        let i = Interpretation::from_raw("Sure thing!");
        assert_eq!(i.display_text, "Sure thing!");
        assert_eq!(i.spoken_text, "Sure thing!");
        assert_eq!(i.navigation, None);
    }

    #[test]
    fn test_non_object_json_falls_back_to_text() {
        let i = Interpretation::from_raw(r#"["quotes"]"#);
        assert_eq!(i.display_text, r#"["quotes"]"#);
        assert_eq!(i.navigation, None);
    }

    #[test]
    fn test_summary_is_preferred_for_speech() {
        let i = Interpretation::from_raw(
            r#"{"text": "You have 3 quotes: one pending, one approved, one completed.", "summary": "You have 3 quotes."}"#,
        );
        assert_eq!(i.spoken_text, "You have 3 quotes.");
    }

    #[test]
    fn test_empty_object_gets_the_fallback_message() {
        let i = Interpretation::from_raw("{}");
        assert_eq!(i.display_text, UNHELPFUL_REPLY);
        assert_eq!(i.navigation, None);
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let i = Interpretation::from_raw(r#"{"navigation": "", "text": "Hi", "toHighlight": " "}"#);
        assert_eq!(i.navigation, None);
        assert_eq!(i.highlight, None);
    }

    #[test]
    fn test_fenced_json_is_accepted() {
        let i = Interpretation::from_raw("```json\n{\"navigation\": \"settings\"}\n```");
        assert_eq!(i.navigation.as_deref(), Some("/settings"));
    }
}
