//! recruit-gate - request admission for the recruitment platform

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recruit_gate::config::{Args, LogFormat};
use recruit_gate::server::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("recruit_gate={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let mode = args.mode();
    info!("======================================");
    info!("  recruit-gate");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", mode.as_str().to_uppercase());
    info!("Site origin: {}", args.site_url.as_deref().unwrap_or("<unset>"));
    info!("API prefix: {}", args.api_prefix);
    info!("Session cookie: {}", args.session_cookie);
    info!(
        "Token lookahead: {}s, refresh window: {}s",
        args.token_lookahead_secs, args.session_refresh_window_secs
    );
    info!("======================================");

    let state = Arc::new(AppState::new(args)?);

    if let Err(e) = server::run(state).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }

    Ok(())
}
