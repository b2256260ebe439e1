use clap::Parser;
use ledger_agents::{
    ChatClient,
    cli::{ChatCli, output::Output},
    client::DEFAULT_HEALTH_TIMEOUT,
    frontend::{ChatFrontend, THINKING_INDICATOR},
    utils::{
        config::LogFormat,
        logging::{LogTarget, init_tracing},
    },
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = ChatCli::parse();
    init_tracing("warn", LogFormat::Pretty, LogTarget::Stderr);

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let client = ChatClient::new(&cli.agents_url)
        .with_timeouts(Duration::from_secs(cli.timeout), DEFAULT_HEALTH_TIMEOUT);
    let chat = ChatFrontend::new(client);

    output.banner("Ledger AI Assistant");
    output.kv("Agents service", &cli.agents_url);
    output.kv("Session", chat.session_id());
    output.assistant(&chat.on_chat_start().await);
    output.hint("Type /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        output.prompt();
        let Some(line) = lines.next_line().await? else {
            output.newline();
            break;
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "/quit" | "/exit") {
            break;
        }

        output.status(THINKING_INDICATOR);
        output.assistant(&chat.on_message(message).await);
    }

    chat.on_chat_end().await;
    output.info("Goodbye!");
    Ok(())
}
