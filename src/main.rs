use anyhow::Context;
use clap::Parser;
use ledger_agents::{
    AgentsConfig, AppState,
    api::create_router,
    cli::{ServerCli, output::Output},
    utils::logging::{LogTarget, init_tracing},
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = ServerCli::parse();

    let mut config = match AgentsConfig::load(Some(cli.config.as_path())) {
        Ok(config) => config,
        Err(e) => {
            Output::new().error(&e.to_string());
            return Err(e).context("Failed to load configuration");
        }
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    init_tracing(&config.log_level, config.log_format, LogTarget::Stdout);

    let output = Output::new();
    output.banner("Ledger Agents");
    output.kv("MCP server", &config.mcp_server_url);
    output.kv("Model", &config.model_name);
    output.kv("LLM endpoint", &config.openai_api_url);
    output.kv("Listening on", &config.bind_address());
    output.newline();

    let addr = config.bind_address();
    let sweep_interval = config.sweep_interval();
    let state = AppState::from_config(config);
    let eviction = state.sessions.start_eviction_task(sweep_interval);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!(%addr, "Agents service listening");

    let served = axum::serve(listener, create_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(task) = eviction {
        task.abort();
    }
    let closed = state.sessions.shutdown().await;
    info!(closed, "Agents service stopped");

    served.context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, shutting down...");
}
