mod chat_client;
mod chat_repl;

pub use chat_client::ChatClient;
pub use chat_repl::{is_exit_command, ChatRepl, PROMPT, REPLY_LABEL};
