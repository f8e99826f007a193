use knowledge_graph::{
    api::{build_router, AppState},
    config::{Config, LogFormat, LoggingConfig},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.logging);

    let state = AppState::from_config(&config)?;
    let router = build_router(state, config.server.max_body_bytes);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        "Knowledge graph API listening on {} (extraction: {})",
        addr,
        if config.extraction.llm_enabled() { "llm" } else { "rules" }
    );

    axum::serve(listener, router).await?;

    Ok(())
}
