use askgpt_errors::ChatError;
use std::fmt;
use std::time::Duration;
use url::Url;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const API_URL_VAR: &str = "OPENAI_API_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const TIMEOUT_VAR: &str = "ASKGPT_TIMEOUT_SECS";
pub const MAX_RETRIES_VAR: &str = "ASKGPT_MAX_RETRIES";

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_RETRIES: u32 = 0;
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// One attempt, no resend.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Retry up to `max_retries` times with the default backoff.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero based), never above `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(8),
        }
    }
}

#[derive(Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn from_env() -> Result<Self, ChatError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get(API_KEY_VAR)
            .ok_or_else(|| ChatError::MissingCredential(API_KEY_VAR.to_string()))?;

        let mut config = Self::new(api_key);

        if let Some(api_url) = get(API_URL_VAR) {
            config.api_url = api_url;
        }
        if let Some(model) = get(MODEL_VAR) {
            config.model = model;
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = raw.parse().map_err(|_| {
                ChatError::InvalidConfig(format!(
                    "{TIMEOUT_VAR} must be a whole number, got '{raw}'"
                ))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = get(MAX_RETRIES_VAR) {
            config.retry.max_retries = raw.parse().map_err(|_| {
                ChatError::InvalidConfig(format!(
                    "{MAX_RETRIES_VAR} must be a whole number, got '{raw}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.api_key.trim().is_empty() {
            return Err(ChatError::MissingCredential(API_KEY_VAR.to_string()));
        }
        if self.api_key.chars().any(char::is_control) {
            return Err(ChatError::InvalidConfig(format!(
                "{API_KEY_VAR} contains control characters"
            )));
        }

        let url = Url::parse(&self.api_url)
            .map_err(|e| ChatError::InvalidConfig(format!("{API_URL_VAR}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChatError::InvalidConfig(format!(
                "{API_URL_VAR} must use http or https, got '{}'",
                url.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ChatError::InvalidConfig(format!("{MODEL_VAR} is empty")));
        }
        if self.timeout.is_zero() {
            return Err(ChatError::InvalidConfig(format!(
                "{TIMEOUT_VAR} must be greater than zero"
            )));
        }
        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(ChatError::InvalidConfig(format!(
                "{MAX_RETRIES_VAR} must be at most {MAX_RETRIES_LIMIT}, got {}",
                self.retry.max_retries
            )));
        }

        Ok(())
    }
}

// The key stays out of logs.
impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_api_key() {
        let config = ChatConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk-test")])).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.retry.max_retries, 0);
    }

    #[test]
    fn test_missing_api_key() {
        let err = ChatConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ChatError::MissingCredential(API_KEY_VAR.to_string()));

        let err = ChatConfig::from_lookup(lookup(&[(API_KEY_VAR, "   ")])).unwrap_err();
        assert_eq!(err, ChatError::MissingCredential(API_KEY_VAR.to_string()));
    }

    #[test]
    fn test_overrides() {
        let config = ChatConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (API_URL_VAR, "http://127.0.0.1:8080/v1/chat/completions"),
            (MODEL_VAR, "gpt-4o-mini"),
            (TIMEOUT_VAR, "5"),
            (MAX_RETRIES_VAR, "3"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_blank_optional_values_fall_back() {
        let config = ChatConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk-test"),
            (MODEL_VAR, ""),
            (TIMEOUT_VAR, " "),
        ]))
        .unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            (API_URL_VAR, "not a url"),
            (API_URL_VAR, "ftp://example.com/chat"),
            (TIMEOUT_VAR, "soon"),
            (TIMEOUT_VAR, "0"),
            (MAX_RETRIES_VAR, "-1"),
            (MAX_RETRIES_VAR, "100"),
        ];
        for (key, value) in cases {
            let result =
                ChatConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk-test"), (key, value)]));
            assert!(
                matches!(result, Err(ChatError::InvalidConfig(_))),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ChatConfig::new("sk-very-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_control_characters_in_api_key_rejected() {
        let config = ChatConfig::new("sk-test\nX-Injected: 1");
        assert!(matches!(config.validate(), Err(ChatError::InvalidConfig(_))));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::with_max_retries(3);
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(10), Duration::from_secs(8));
        assert_eq!(RetryPolicy::none().max_retries, 0);
        assert_eq!(RetryPolicy::default(), RetryPolicy::none());
    }

    #[test]
    fn test_backoff_never_overflows() {
        let policy = RetryPolicy::with_max_retries(MAX_RETRIES_LIMIT);
        for attempt in [64, 65, 100, 1_000, i32::MAX as u32, u32::MAX] {
            assert_eq!(policy.delay_for(attempt), policy.max_delay, "attempt {attempt}");
        }

        let huge_multiplier = RetryPolicy {
            backoff_multiplier: f64::MAX,
            ..policy
        };
        assert_eq!(huge_multiplier.delay_for(3), policy.max_delay);
    }
}
