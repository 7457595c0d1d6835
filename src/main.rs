use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use arxiv_feed::config::Config;
use arxiv_feed::feed::FeedFormat;
use arxiv_feed::service::{FeedRequest, FeedService};
use arxiv_feed::storage::{Database, DatabaseError};

#[derive(Parser, Debug)]
#[command(
    name = "arxiv-feed",
    about = "Print an Atom or RSS feed of newly announced arXiv e-prints"
)]
struct Args {
    /// Archives and categories, e.g. "cs.AI+math"
    specifier: String,

    /// Announcement database (SQLite)
    #[arg(long, value_name = "FILE")]
    db: PathBuf,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "atom")]
    format: FeedFormat,

    /// First announcement day (YYYY-MM-DD), defaults to --to minus --days
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Last announcement day (YYYY-MM-DD), defaults to today
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Days before --to to include when --from is not given
    #[arg(long, value_name = "N", default_value_t = 0)]
    days: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the feed.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Invalid configuration")?,
    };

    let last_day = args.to.unwrap_or_else(|| Utc::now().date_naive());
    let first_day = match args.from {
        Some(day) => day,
        None => last_day
            .checked_sub_days(Days::new(args.days))
            .context("--days reaches before the supported date range")?,
    };

    let db_path = args
        .db
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path).await {
        Ok(db) => db,
        Err(DatabaseError::Locked) => {
            eprintln!("Error: The announcement database is locked by another process.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };

    let service = FeedService::new(db, config);
    let request = FeedRequest::new(args.specifier, args.format, first_day, last_day);
    let feed = service
        .build_feed(&request)
        .await
        .with_context(|| format!("Failed to build feed for '{}'", request.specifier))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(feed.as_bytes())
        .context("Failed to write feed")?;
    stdout.flush().context("Failed to write feed")?;
    Ok(())
}
