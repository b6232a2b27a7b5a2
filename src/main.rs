use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

mod collector;
mod models;
mod output;
mod realtime;
mod scraper;
mod selectors;
mod session;
mod traits;

use collector::Collector;
use crate::scraper::BrowserScraper;
use realtime::{QueryRequest, RealtimeClient};
use session::SessionConfig;

#[derive(Debug, Parser)]
#[command(
    name = "price-finder",
    about = "Collects Amazon product price listings into CSV files"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a search-result page in a headless browser and extract prices
    Scrape {
        /// The url of the page for which to return product price data
        #[arg(long)]
        url: String,

        #[arg(long, default_value = "amazon_prices.csv")]
        output: PathBuf,

        /// Seconds to wait after navigation for client-side rendering
        #[arg(long, default_value_t = 3)]
        settle_secs: u64,
    },

    /// Query the hosted realtime API for search results
    Search {
        query: String,

        #[arg(long, default_value_t = 1)]
        start_page: u32,

        #[arg(long, default_value = "search.csv")]
        output: PathBuf,
    },

    /// Query the hosted realtime API for a best-sellers category
    Bestsellers {
        category_id: String,

        #[arg(long, default_value_t = 1)]
        start_page: u32,

        #[arg(long, default_value = "best_seller.csv")]
        output: PathBuf,
    },

    /// Query the hosted realtime API for a deals page
    Deals {
        url: String,

        #[arg(long, default_value = "deals.csv")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting price finder");

    // Failures never surface as a non-zero exit code; they are visible in
    // the log stream only.
    if let Err(e) = run(Args::parse()).await {
        error!("Error during price collection setup: {e:#}");
    }
}

async fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Scrape {
            url,
            output,
            settle_secs,
        } => {
            let config = SessionConfig {
                settle: Duration::from_secs(settle_secs),
            };
            let scraper = BrowserScraper::new(url, config)?;
            Collector::new(scraper, output).run().await;
        }
        Command::Search {
            query,
            start_page,
            output,
        } => {
            let client = RealtimeClient::from_env(
                QueryRequest::search(&query, start_page),
                format!("search '{query}'"),
            )?;
            Collector::new(client, output).run().await;
        }
        Command::Bestsellers {
            category_id,
            start_page,
            output,
        } => {
            let client = RealtimeClient::from_env(
                QueryRequest::bestsellers(&category_id, start_page),
                format!("best-sellers category {category_id}"),
            )?;
            Collector::new(client, output).run().await;
        }
        Command::Deals { url, output } => {
            let client =
                RealtimeClient::from_env(QueryRequest::deals(&url), format!("deals page {url}"))?;
            Collector::new(client, output).run().await;
        }
    }

    Ok(())
}
