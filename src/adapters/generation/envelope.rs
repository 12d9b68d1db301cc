//! Response envelopes returned by inference endpoints.
//!
//! Known shapes are tried in a fixed order; anything else is kept whole and
//! serialized back to text so the caller can still look for JSON in it.

use serde::Deserialize;
use serde_json::Value;

/// Message body of one choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Generated text
    pub content: String,
}

/// One entry of a `choices` array.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The choice's message
    pub message: ChoiceMessage,
}

/// Envelope variants, in decoding priority order.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GenerationEnvelope {
    /// `{"completion": ...}`
    Completion {
        /// Generated text
        completion: String,
    },
    /// OpenAI-style `{"choices": [{"message": {"content": ...}}]}`
    Choices {
        /// Only the first choice is used
        choices: Vec<Choice>,
    },
    /// `{"output": ...}`
    Output {
        /// Generated text
        output: String,
    },
    /// `{"generated_text": ...}`
    GeneratedText {
        /// Generated text
        generated_text: String,
    },
    /// Any other JSON; surfaced as malformed
    Unrecognized(Value),
}

impl GenerationEnvelope {
    /// Parse a raw response body.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// The generated text. An empty `choices` list, or an unrecognized shape,
    /// falls back to the serialized body.
    pub fn into_text(self) -> String {
        match self {
            Self::Completion { completion } => completion,
            Self::Output { output } => output,
            Self::GeneratedText { generated_text } => generated_text,
            Self::Choices { choices } => match choices.into_iter().next() {
                Some(choice) => choice.message.content,
                None => "{\"choices\":[]}".to_string(),
            },
            Self::Unrecognized(Value::String(s)) => s,
            Self::Unrecognized(value) => value.to_string(),
        }
    }
}
