use crate::application::{ChatClient, ChatRepl};
use crate::config::ChatConfig;
use crate::infrastructure::openai::OpenAiClient;
use askgpt_errors::ChatError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub chat_client: Arc<dyn ChatClient>,
}

impl AppContext {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = OpenAiClient::new(config)?;
        tracing::info!(
            model = client.model(),
            url = %config.api_url,
            timeout_secs = config.timeout.as_secs(),
            max_retries = config.retry.max_retries,
            "Using OpenAI chat completion backend"
        );
        Ok(Self {
            chat_client: Arc::new(client),
        })
    }

    pub fn from_env() -> Result<Self, ChatError> {
        let config = ChatConfig::from_env()?;
        Self::new(&config)
    }

    pub fn repl(&self) -> ChatRepl {
        ChatRepl::new(self.chat_client.clone())
    }
}
