use super::ChatClient;
use askgpt_errors::ChatError;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const PROMPT: &str = "Enter your question (type 'exit' to quit): ";
pub const REPLY_LABEL: &str = "Assistant:";
const EXIT_COMMAND: &str = "exit";

pub fn is_exit_command(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case(EXIT_COMMAND)
}

/// Prompt loop: one question per line until `exit` or end of input.
pub struct ChatRepl {
    client: Arc<dyn ChatClient>,
}

impl ChatRepl {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    /// Runs until the exit keyword or EOF and returns how many questions were sent.
    ///
    /// Failed requests are printed in place of a reply and the loop keeps
    /// going; only console I/O errors end it early.
    pub async fn run<R, W>(&self, mut input: R, mut output: W) -> Result<usize, ChatError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut asked = 0;
        let mut line = String::new();

        loop {
            output.write_all(PROMPT.as_bytes()).await?;
            output.flush().await?;

            line.clear();
            if input.read_line(&mut line).await? == 0 {
                tracing::debug!("End of input, leaving prompt loop");
                output.write_all(b"\n").await?;
                break;
            }

            let question = strip_line_ending(&line);
            if is_exit_command(question) {
                break;
            }

            asked += 1;
            let answer = match self.client.ask(question).await {
                Ok(reply) => reply,
                Err(e) => e.to_string(),
            };

            output
                .write_all(format!("{REPLY_LABEL} {answer}\n").as_bytes())
                .await?;
        }

        output.flush().await?;
        Ok(asked)
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
