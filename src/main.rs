mod config;
mod models;
mod scrapers;
mod selectors;
mod storage;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Mode, ScraperConfig};
use scrapers::{BrowserSession, ScrapeOrchestrator};

/// Incremental real-estate dataset scraper for properati.com.co.
#[derive(Parser, Debug)]
#[command(name = "properati-scout", version)]
struct Args {
    /// Listing sections to traverse
    #[arg(long, value_enum, default_value = "both")]
    mode: Mode,

    /// Pages per section
    #[arg(long, default_value_t = 3)]
    max_pages: u32,

    /// Target request rate
    #[arg(long = "rpm", default_value_t = 15)]
    requests_per_minute: u32,

    /// Run Chrome with a visible window
    #[arg(long)]
    headful: bool,

    /// Do not follow project pages into their individual units
    #[arg(long)]
    skip_project_units: bool,

    /// Output directory for the CSV/JSON pair
    #[arg(long, default_value = "realestate_data")]
    data_dir: PathBuf,

    /// Records between incremental saves
    #[arg(long, default_value_t = 12)]
    checkpoint_interval: usize,
}

impl Args {
    fn into_config(self) -> ScraperConfig {
        ScraperConfig {
            mode: self.mode,
            max_pages: self.max_pages,
            requests_per_minute: self.requests_per_minute,
            headless: !self.headful,
            expand_project_units: !self.skip_project_units,
            data_dir: self.data_dir,
            checkpoint_interval: self.checkpoint_interval,
            ..ScraperConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Args::parse().into_config();

    info!("🏠 Properati Scout");
    info!(
        "Sections: {:?} | {} page(s) per section | {} req/min",
        config.mode.sections(),
        config.max_pages,
        config.requests_per_minute
    );

    let session = BrowserSession::launch(config.clone())?;
    let mut orchestrator = ScrapeOrchestrator::new(config, session)?;
    let stats = orchestrator.run().await?;

    info!("📈 {} record(s) collected this run", stats.total_records);
    Ok(())
}
