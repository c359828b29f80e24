//! # Reel Buzz
//!
//! A content pipeline that discovers buzzing movies and TV shows, writes
//! AI reviews for them, and drafts the results to a Hashnode blog.
//!
//! ## Architecture
//!
//! 1. **Trend analysis**: scrape several public listings (search trends,
//!    community feeds, tracking sites, the IMDb meter charts), extract
//!    candidate titles with pattern heuristics, and merge the weighted
//!    mentions into one ranked buzz list.
//! 2. **Resolution**: turn the winning title into a canonical detail-page
//!    URL, falling through ranked candidates and finally the chart pages.
//! 3. **Review**: scrape the plot plus reference review snippets and ask
//!    an LLM for a 400-600 word review.
//! 4. **Draft**: create a Hashnode draft (or publish after interactive
//!    approval), suppress recent duplicates, and log a video prompt.
//!
//! Everything runs sequentially; a failing source or kind degrades
//! gracefully rather than aborting the run.

use std::error::Error;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cli;
mod config;
mod extract;
mod fetch;
mod filter;
mod hashnode;
mod models;
mod pipeline;
mod resolve;
mod review;
mod scheduler;
mod scrapers;
mod storage;
mod utils;

use aggregate::TrendAnalyst;
use cli::{Cli, Command};
use config::{AppConfig, DomainProfile};
use fetch::PageClient;
use pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("reel_buzz starting up");

    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");
    let config = AppConfig::from_cli(&args);

    match args.command {
        Command::Trends { domain, top_n } => {
            let domain = domain.domain();
            let profile = DomainProfile::load_or_default(domain, config.profile_path.as_deref())?;
            let client = PageClient::new()?;
            let analyst = TrendAnalyst::from_profile(profile, &client);
            let ranked = analyst.analyze_trending(top_n).await;
            println!("{}", serde_json::to_string_pretty(&ranked)?);
        }
        Command::Run { kind, approve } => {
            let pipeline = Pipeline::new(config)?;
            pipeline.run(&kind.domains(), approve).await;
        }
        Command::Schedule {
            cron,
            every_minutes,
            kind,
        } => {
            let pipeline = Pipeline::new(config)?;
            let kinds = kind.domains();
            match (cron, every_minutes) {
                (Some(expression), _) => {
                    scheduler::run_on_cron(&pipeline, &expression, &kinds).await?;
                }
                (None, Some(minutes)) => {
                    scheduler::run_every(&pipeline, minutes, &kinds).await;
                }
                (None, None) => {
                    return Err("schedule requires --cron or --every-minutes".into());
                }
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
