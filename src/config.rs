use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

/// Which listing sections a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Properties for sale ("venta")
    Sale,
    /// Rental properties ("arriendo")
    Rental,
    /// Both sections, sale first
    Both,
}

impl Mode {
    /// Section slugs in the order they are traversed.
    pub fn sections(self) -> &'static [&'static str] {
        match self {
            Mode::Sale => &["venta"],
            Mode::Rental => &["arriendo"],
            Mode::Both => &["venta", "arriendo"],
        }
    }
}

/// Immutable run configuration, built once in `main` and handed by
/// reference or clone to every component constructor.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub mode: Mode,
    pub max_pages: u32,
    pub requests_per_minute: u32,
    pub headless: bool,
    pub expand_project_units: bool,
    /// Flush the store once this many records accumulate since the last flush.
    pub checkpoint_interval: usize,
    pub page_load_timeout: Duration,
    /// Base + jitter for the short human-like pause after each navigation.
    pub human_pause_base: Duration,
    pub human_pause_jitter: Duration,
    pub scroll_pause: Duration,
    pub max_scrolls: usize,
    /// Hard cap on the free-text description, in characters.
    pub description_max_len: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.properati.com.co".to_string(),
            data_dir: PathBuf::from("realestate_data"),
            mode: Mode::Both,
            max_pages: 3,
            requests_per_minute: 15,
            headless: true,
            expand_project_units: true,
            checkpoint_interval: 12,
            page_load_timeout: Duration::from_secs(15),
            human_pause_base: Duration::from_millis(1500),
            human_pause_jitter: Duration::from_millis(800),
            scroll_pause: Duration::from_millis(1200),
            max_scrolls: 6,
            description_max_len: 500,
        }
    }
}

impl ScraperConfig {
    /// Search-results URL for a section page. Page 1 has no page segment.
    pub fn listing_url(&self, section: &str, page: u32) -> String {
        if page <= 1 {
            format!("{}/s/{}", self.base_url, section)
        } else {
            format!("{}/s/{}/{}", self.base_url, section, page)
        }
    }
}
