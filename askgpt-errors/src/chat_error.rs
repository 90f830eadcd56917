/// Every failure the chat client and the prompt loop can report.
///
/// `Api` renders as `Error: <status>, <body>`, the same line the assistant
/// prints for a rejected request, so callers that only want text can use
/// `to_string()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Missing API credential: set {0}")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Error: {status}, {body}")]
    Api { status: u16, body: String },

    #[error("Error: request failed: {0}")]
    Transport(String),

    #[error("Error: request timed out")]
    Timeout,

    #[error("Error: malformed response: {0}")]
    MalformedResponse(String),

    #[error("Console I/O error: {0}")]
    Io(String),
}

impl ChatError {
    /// Timeouts, transport failures and 5xx answers may succeed on a resend.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            Self::Transport(_) | Self::Timeout => true,
            _ => false,
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::MissingCredential(_) => "No API key configured. Export it or put it in .env.",
            Self::InvalidConfig(_) => "Check the ASKGPT_* and OPENAI_* environment variables.",
            Self::Api { status, .. } if *status == 401 => "The API key was rejected.",
            Self::Api { status, .. } if *status == 429 => {
                "Rate limited by the API. Try again later."
            }
            Self::Api { .. } => "The API rejected the request.",
            Self::Transport(_) => "Could not reach the API. Check your network.",
            Self::Timeout => "The API took too long to answer.",
            Self::MalformedResponse(_) => "The API answered with something unexpected.",
            Self::Io(_) => "Reading from or writing to the terminal failed.",
        }
    }
}

impl From<std::io::Error> for ChatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
