use anyhow::{anyhow, Result};
use clap::Parser;
use kb_crawler::{crawl, parse_urls, CrawlConfig, DEFAULT_FEEDS, DEFAULT_PAGES, DEFAULT_SPIDER_SITES};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "kb-crawler")]
#[command(about = "Crawl knowledge-base sources into page files, respecting robots.txt")]
struct Cli {
    /// Directory the page files are written to
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// Site to spider from its root, following same-origin links (repeatable)
    #[arg(long = "spider", default_values = DEFAULT_SPIDER_SITES)]
    spider: Vec<String>,
    /// RSS feed whose item links are fetched without following (repeatable)
    #[arg(long = "feed", default_values = DEFAULT_FEEDS)]
    feed: Vec<String>,
    /// Single page fetched without following (repeatable)
    #[arg(long = "page", default_values = DEFAULT_PAGES)]
    page: Vec<String>,
    /// Pause between requests in milliseconds
    #[arg(long, default_value_t = 1500)]
    delay_ms: u64,
    /// Maximum number of pages to visit
    #[arg(long, default_value_t = 5000)]
    max_pages: usize,
    /// Request timeout seconds
    #[arg(long, default_value_t = 12)]
    timeout_secs: u64,
    /// User-Agent string to use for robots.txt and crawling
    #[arg(long, default_value = "kb-crawler/0.1")]
    user_agent: String,
    /// Fetch pages even when robots.txt disallows them
    #[arg(long, default_value_t = false)]
    ignore_robots: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Cli::parse();

    let cfg = CrawlConfig {
        data_dir: args.data_dir,
        spider_sites: parse_urls(&args.spider)?,
        feeds: parse_urls(&args.feed)?,
        extra_pages: parse_urls(&args.page)?,
        delay: Duration::from_millis(args.delay_ms),
        max_pages: args.max_pages,
        timeout: Duration::from_secs(args.timeout_secs),
        user_agent: args.user_agent,
        respect_robots: !args.ignore_robots,
    };
    if cfg.spider_sites.is_empty() && cfg.feeds.is_empty() && cfg.extra_pages.is_empty() {
        return Err(anyhow!("nothing to crawl"));
    }

    let summary = crawl(&cfg).await?;
    println!("done: visited={} saved={} failed={} -> {}", summary.visited, summary.saved, summary.failed, cfg.data_dir.display());
    Ok(())
}
