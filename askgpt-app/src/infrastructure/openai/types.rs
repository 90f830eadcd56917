use crate::domain::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
}

/// Only the fields the client reads; the rest of the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: MessageContent,
}

#[derive(Debug, Deserialize)]
pub struct MessageContent {
    pub content: String,
}

impl ChatCompletionRequest {
    pub fn new(model: &str, messages: Vec<Message>, temperature: f32) -> Self {
        Self {
            model: model.to_string(),
            messages,
            temperature,
        }
    }
}

impl ChatCompletionResponse {
    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}
