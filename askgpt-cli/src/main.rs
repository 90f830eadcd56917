use askgpt_app::AppContext;
use askgpt_errors::ChatError;
use tokio::io::BufReader;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    // Logs go to stderr so the prompt on stdout stays readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let app_context = match AppContext::from_env() {
        Ok(ctx) => ctx,
        Err(e) => exit_with(e),
    };

    let stdin = BufReader::new(tokio::io::stdin());
    match app_context.repl().run(stdin, tokio::io::stdout()).await {
        Ok(asked) => tracing::debug!("Session finished after {} questions", asked),
        Err(e) => exit_with(e),
    }
}

fn exit_with(err: ChatError) -> ! {
    tracing::error!("{} ({})", err, err.user_message());
    std::process::exit(1);
}
