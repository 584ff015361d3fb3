//! amz-origin - Amazon review scraper with cached "made in China" detection
//!
//! A Rust implementation with browser automation and TLS fingerprint emulation.

use amz_origin::amazon::regions::Region;
use amz_origin::commands::{AnalyzeCommand, ReviewsCommand, SearchCommand, StatusCommand};
use amz_origin::config::{ClassifierKind, Config, FetchMode, OutputFormat};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "amz-origin",
    version,
    about = "Scrape Amazon reviews and flag products made in China",
    long_about = "Scrapes Amazon review listings and product pages, caches them as JSON \
                  and flags products whose description or reviews mention Chinese origin."
)]
struct Cli {
    /// Amazon region (overrides config)
    #[arg(short, long, global = true)]
    region: Option<Region>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "AMZ_PROXY")]
    proxy: Option<String>,

    /// Delay between HTTP requests in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Directory holding cached records and analysis markers
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// How review pages are fetched (browser, http)
    #[arg(short, long, global = true)]
    mode: Option<FetchMode>,

    /// Origin classifier (lexical, model)
    #[arg(long, global = true)]
    classifier: Option<ClassifierKind>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape, classify and record one or more products
    #[command(alias = "a")]
    Analyze {
        /// ASIN(s) to analyze
        #[arg(required = true)]
        asins: Vec<String>,
    },

    /// Show the reviews of a product (scraped on first use)
    #[command(alias = "r")]
    Reviews {
        /// ASIN to list reviews for
        asin: String,
    },

    /// Discover products for a query and analyze them
    #[command(alias = "s")]
    Search {
        /// Search query
        query: String,

        /// Result pages to walk (default from config)
        #[arg(long)]
        max_pages: Option<u32>,

        /// Only list discovered ASINs and their cached status
        #[arg(long)]
        discover_only: bool,
    },

    /// Show cached analysis results
    Status {
        /// ASIN(s) to look up
        #[arg(required = true)]
        asins: Vec<String>,
    },

    /// List supported regions
    Regions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(region) = cli.region {
        config.region = region;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(classifier) = cli.classifier {
        config.classifier = classifier;
    }

    match cli.command {
        Commands::Analyze { asins } => {
            let cmd = AnalyzeCommand::new(config);
            let output = cmd.execute(&asins).await?;
            println!("{}", output);
        }

        Commands::Reviews { asin } => {
            let cmd = ReviewsCommand::new(config);
            let output = cmd.execute(&asin).await?;
            println!("{}", output);
        }

        Commands::Search { query, max_pages, discover_only } => {
            let cmd = SearchCommand::new(config);
            let output = cmd.execute(&query, max_pages, discover_only).await?;
            println!("{}", output);
        }

        Commands::Status { asins } => {
            let cmd = StatusCommand::new(config);
            println!("{}", cmd.execute(&asins)?);
        }

        Commands::Regions => {
            println!("Supported Amazon regions:\n");
            println!("{:<6} {:<20} {:<24}", "Code", "Domain", "Accept-Language");
            println!("{:-<6} {:-<20} {:-<24}", "", "", "");

            for region in Region::all() {
                println!(
                    "{:<6} {:<20} {:<24}",
                    region.to_string(),
                    region.domain(),
                    region.accept_language()
                );
            }
        }
    }

    Ok(())
}
