// Cafe POS - API Server
// JSON endpoints for New Order, Log Expense, and the Dashboard

use anyhow::{anyhow, Context, Result};
use cafe_pos::api::{router, AppState};
use cafe_pos::{open_store, PointOfSale, PosConfig, VERSION};
use clap::Parser;
use std::path::PathBuf;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// HTTP API for the cafe point of sale
#[derive(Debug, Parser)]
#[command(name = "cafe-server", version, about)]
struct Args {
    /// Extra config file layered over ./cafe-pos.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override server.bind
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = PosConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_env("CAFE_POS_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing subscriber: {e}"))?;

    println!("🌐 {} - API Server v{}", config.shop.name, VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = open_store(&config.store).context("❌ Connection Error")?;
    let pos = PointOfSale::open(store).context("❌ Connection Error")?;
    println!("✓ Stores ready ({} backend)", pos.store().backend_name());

    let app = router(AppState::new(pos, &config)).layer(CorsLayer::permissive());

    let addr = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "server listening");
    println!("\n🚀 Server running on http://{addr}");
    println!("   API: http://{addr}/api/report");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
