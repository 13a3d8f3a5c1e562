use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::Rng;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::scrapers::fields;
use crate::scrapers::traits::{BrowserControl, FetchOutcome, PageFetcher};

/// Chrome flags mirroring the anti-automation-detection setup the site is
/// scraped with; dropping them gets the session flagged much sooner.
const CHROME_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-infobars",
];

/// One headless-Chrome session with a single reused tab.
///
/// The session is the run's only shared mutable resource: the orchestrator
/// owns it and lends it to extractors as a `&dyn PageFetcher`.
pub struct BrowserSession {
    config: ScraperConfig,
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl BrowserSession {
    pub fn launch(config: ScraperConfig) -> Result<Self> {
        let (browser, tab) = Self::launch_browser(&config)?;
        Ok(Self {
            config,
            browser: Some(browser),
            tab: Some(tab),
        })
    }

    fn launch_browser(config: &ScraperConfig) -> Result<(Browser, Arc<Tab>)> {
        info!(
            "🚀 Launching {} Chrome...",
            if config.headless { "headless" } else { "headful" }
        );

        let args: Vec<&OsStr> = CHROME_ARGS.iter().map(|a| OsStr::new(*a)).collect();
        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .window_size(Some((1920, 1080)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        Ok((browser, tab))
    }

    /// Short randomized pause after navigation, so request timing does not
    /// look machine-uniform.
    fn human_pause(&self) {
        let jitter = self
            .config
            .human_pause_jitter
            .mul_f64(rand::thread_rng().gen::<f64>());
        thread::sleep(self.config.human_pause_base + jitter);
    }

    fn page_height(&self, tab: &Tab) -> Result<i64> {
        let result = tab.evaluate("document.body.scrollHeight", false)?;
        result
            .value
            .and_then(|v| v.as_f64())
            .map(|h| h as i64)
            .context("could not read page height")
    }

    /// Bounded lazy-load pass: scroll to the bottom until the page height
    /// stops growing or `max_scrolls` is exhausted.
    fn scroll_to_bottom(&self, tab: &Tab) -> Result<()> {
        let mut last_height = self.page_height(tab)?;
        for pass in 0..self.config.max_scrolls {
            tab.evaluate("window.scrollTo(0, document.body.scrollHeight);", false)?;
            thread::sleep(self.config.scroll_pause);
            let new_height = self.page_height(tab)?;
            if new_height == last_height {
                debug!("Page height settled after {} scroll passes", pass + 1);
                break;
            }
            last_height = new_height;
        }
        Ok(())
    }

    fn fetch_inner(&self, url: &str, scroll: bool) -> Result<String> {
        let tab = self.tab.as_ref().context("browser session is closed")?;

        tab.navigate_to(url).context("navigation failed")?;
        tab.wait_for_element_with_custom_timeout("body", self.config.page_load_timeout)
            .context("timeout waiting for page body")?;
        self.human_pause();

        if scroll {
            self.scroll_to_bottom(tab)?;
        }

        let result = tab.evaluate("document.documentElement.outerHTML", false)?;
        result
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .context("could not read rendered markup")
    }
}

impl PageFetcher for BrowserSession {
    fn fetch(&self, url: &str, scroll: bool) -> FetchOutcome {
        debug!("🌐 Fetching: {}", url);
        match self.fetch_inner(url, scroll) {
            Ok(markup) => {
                let document = Html::parse_document(&markup);
                if fields::is_captcha(&fields::visible_text(&document)) {
                    warn!("🚨 CAPTCHA detected at: {}", url);
                    return FetchOutcome::Blocked;
                }
                FetchOutcome::Page(document)
            }
            Err(e) => {
                warn!("⚠️ Error loading page {}: {:#}", url, e);
                FetchOutcome::Failed(format!("{e:#}"))
            }
        }
    }
}

impl BrowserControl for BrowserSession {
    fn restart(&mut self) -> Result<()> {
        info!("🔄 Restarting browser...");
        self.close();
        thread::sleep(Duration::from_secs(5));
        let (browser, tab) = Self::launch_browser(&self.config)?;
        self.browser = Some(browser);
        self.tab = Some(tab);
        info!("✅ Browser restarted, continuing...");
        Ok(())
    }

    fn close(&mut self) {
        self.tab = None;
        if self.browser.take().is_some() {
            info!("🧹 Browser closed.");
        }
    }
}
