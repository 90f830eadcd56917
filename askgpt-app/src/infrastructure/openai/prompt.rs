use crate::domain::Message;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const TEMPERATURE: f32 = 0.7;

/// System persona plus the question, untouched. No history is carried over.
pub fn build_messages(question: &str) -> Vec<Message> {
    vec![Message::system(SYSTEM_PROMPT), Message::user(question)]
}
