use askgpt_errors::ChatError;
use async_trait::async_trait;

/// Sends one question to a chat model and returns the assistant's reply.
///
/// Each call stands alone: implementations must not carry messages from one
/// call into the next.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, ChatError>;
}
