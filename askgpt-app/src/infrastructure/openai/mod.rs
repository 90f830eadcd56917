mod client;
mod prompt;
mod types;

pub use client::OpenAiClient;
pub use prompt::{build_messages, SYSTEM_PROMPT, TEMPERATURE};
pub use types::{ChatCompletionRequest, ChatCompletionResponse, Choice, MessageContent};
