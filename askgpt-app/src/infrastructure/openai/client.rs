use super::prompt::{build_messages, TEMPERATURE};
use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::application::ChatClient;
use crate::config::{ChatConfig, RetryPolicy};
use askgpt_errors::ChatError;
use async_trait::async_trait;
use reqwest::StatusCode;

pub struct OpenAiClient {
    http_client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    retry: RetryPolicy,
}

impl OpenAiClient {
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            retry: config.retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn ask(&self, question: &str) -> Result<String, ChatError> {
        let request =
            ChatCompletionRequest::new(&self.model, build_messages(question), TEMPERATURE);

        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Chat completion failed, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }

    /// Same as [`ask`](Self::ask) but folds errors into their display text.
    pub async fn ask_text(&self, question: &str) -> String {
        self.ask(question).await.unwrap_or_else(|e| e.to_string())
    }

    async fn send_once(&self, request: &ChatCompletionRequest) -> Result<String, ChatError> {
        tracing::debug!(url = %self.api_url, model = %self.model, "Sending chat completion");

        let response = self
            .http_client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport_error)?;

        if status != StatusCode::OK {
            tracing::debug!("Chat completion API error: {} - {}", status, body);
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

        completion
            .into_first_content()
            .ok_or_else(|| ChatError::MalformedResponse("response has no choices".to_string()))
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn ask(&self, question: &str) -> Result<String, ChatError> {
        OpenAiClient::ask(self, question).await
    }
}

fn classify_transport_error(err: reqwest::Error) -> ChatError {
    if err.is_builder() {
        ChatError::InvalidConfig(format!("request could not be built: {err}"))
    } else if err.is_timeout() {
        ChatError::Timeout
    } else if err.is_connect() {
        ChatError::Transport(format!("connection failed: {err}"))
    } else {
        ChatError::Transport(err.to_string())
    }
}
