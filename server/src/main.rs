use anyhow::Result;
use clap::Parser;
use kb_crawler::CrawlConfig;
use kb_server::{build_app, load_state, spawn_refresh};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Directory of crawled page files (JSON / JSONL)
    #[arg(long, default_value = "./data")]
    data: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Reload the data directory this often; 0 disables periodic reloads
    #[arg(long, default_value_t = 3600)]
    reload_interval_secs: u64,
    /// Re-crawl the default sources into the data directory and reload this often
    /// (2592000 is roughly monthly); 0 disables re-crawling
    #[arg(long, default_value_t = 0)]
    recrawl_interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let state = load_state(&args.data)?;
    if args.reload_interval_secs > 0 {
        spawn_refresh(state.clone(), Duration::from_secs(args.reload_interval_secs), None);
    }
    if args.recrawl_interval_secs > 0 {
        let cfg = CrawlConfig::with_default_sources(&args.data)?;
        spawn_refresh(state.clone(), Duration::from_secs(args.recrawl_interval_secs), Some(cfg));
    }
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, data = %args.data, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
