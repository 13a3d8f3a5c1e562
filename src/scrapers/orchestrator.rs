use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tracing::{error, info, warn};

use crate::config::ScraperConfig;
use crate::models::ScrapeStats;
use crate::scrapers::detail::DetailScraper;
use crate::scrapers::listing::ListingScraper;
use crate::scrapers::project::ProjectScraper;
use crate::scrapers::traits::{BrowserControl, FetchOutcome, PageFetcher};
use crate::selectors;
use crate::storage::CheckpointStore;

/// Drives the whole traversal: sections × pages × links, pacing, CAPTCHA
/// recovery and checkpointed persistence.
///
/// Generic over the session so the complete run loop is exercisable with
/// a fake browser in tests. The session is owned here and lent to the
/// extractors per call; only the orchestrator restarts or closes it.
pub struct ScrapeOrchestrator<S: BrowserControl> {
    config: ScraperConfig,
    session: S,
    listing: ListingScraper,
    detail: DetailScraper,
    project: ProjectScraper,
    store: CheckpointStore,
    /// Sticky: one CAPTCHA means the run winds down after the current
    /// page instead of retrying every subsequent block.
    captcha_encountered: bool,
}

impl<S: BrowserControl> ScrapeOrchestrator<S> {
    pub fn new(config: ScraperConfig, session: S) -> Result<Self> {
        let listing = ListingScraper::new(&config)?;
        let detail = DetailScraper::new(&config);
        let project = ProjectScraper::new(&config)?;
        let store = CheckpointStore::new(&config)?;
        Ok(Self {
            config,
            session,
            listing,
            detail,
            project,
            store,
            captcha_encountered: false,
        })
    }

    pub fn interrupted_by_captcha(&self) -> bool {
        self.captcha_encountered
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Run to completion. Whether the traversal finished naturally, wound
    /// down after a CAPTCHA or hit a fault, the accumulated data is
    /// flushed, statistics logged and the browser closed before this
    /// returns. A save failure on the way out is logged and swallowed;
    /// earlier checkpoints are the safety net.
    pub async fn run(&mut self) -> Result<ScrapeStats> {
        let outcome = self.run_sections().await;

        if let Err(e) = &outcome {
            error!("❌ General scraping error: {e:#}");
        }
        match self.store.maybe_flush(true) {
            Ok(_) => self.store.log_stats(),
            Err(e) => error!("❌ Error saving data: {e:#}"),
        }

        if self.captcha_encountered {
            warn!("⚠️ Scraping interrupted due to CAPTCHA. Some data was saved.");
        } else if outcome.is_ok() {
            info!("🎉 Scraping completed successfully!");
        }

        self.session.close();
        info!("🏁 Scraping finished.");

        outcome?;
        Ok(self.store.summarize())
    }

    async fn run_sections(&mut self) -> Result<()> {
        for section in self.config.mode.sections() {
            if self.captcha_encountered {
                warn!("⏸️ Skipping section {} due to previous CAPTCHA", section);
                break;
            }
            info!("🚀 Scraping section: {}", section);
            self.run_section(section).await?;
        }
        Ok(())
    }

    async fn run_section(&mut self, section: &str) -> Result<()> {
        for page in 1..=self.config.max_pages {
            if self.captcha_encountered {
                warn!("⏸️ Skipping remaining pages of {} due to CAPTCHA", section);
                break;
            }
            info!("📄 Processing page {} of {}", page, section);

            let url = self.config.listing_url(section, page);
            let document = match self.session.fetch(&url, true) {
                FetchOutcome::Blocked => {
                    self.captcha_encountered = true;
                    self.captcha_backoff().await?;
                    continue;
                }
                FetchOutcome::Failed(reason) => {
                    warn!("⚠️ Could not load listing page {}: {}", url, reason);
                    break;
                }
                FetchOutcome::Page(document) => document,
            };

            if self.listing.pagination_exhausted(&document) {
                info!("📄 Pagination limit reached at page {}", page);
                break;
            }
            let links = self.listing.extract_links(&document);
            if links.is_empty() {
                info!("⛔ No links found on page {}", page);
                break;
            }

            let page_start = self.store.processed();
            for (i, link) in links.iter().enumerate() {
                if self.captcha_encountered {
                    break;
                }
                self.pacing_delay().await;
                info!("({}/{}) Processing: {}", i + 1, links.len(), link);

                if link.contains(selectors::PROJECT_PATH_MARKER)
                    && self.config.expand_project_units
                {
                    let records = self
                        .project
                        .scrape_project_with_units(&self.session, link);
                    self.store.extend(records);
                } else {
                    let record = self.detail.scrape_property(&self.session, link);
                    if record.error.is_some() {
                        warn!("⚠️ Property with invalid data");
                    }
                    self.store.append(record);
                }
                self.store.maybe_flush(false)?;
            }

            info!(
                "✅ Page {} completed: {} records",
                page,
                self.store.processed() - page_start
            );
            self.store.maybe_flush(true)?;

            if page < self.config.max_pages && !self.captcha_encountered {
                let pause = rand::thread_rng().gen_range(10..=20);
                info!("⏸️ Pause of {} seconds...", pause);
                tokio::time::sleep(Duration::from_secs(pause)).await;
            }
        }
        Ok(())
    }

    /// Rate-derived delay plus jitter, so requests never arrive on a
    /// uniform interval.
    async fn pacing_delay(&self) {
        let base = 60.0 / self.config.requests_per_minute.max(1) as f64;
        let jitter = rand::thread_rng().gen_range(0.5..2.0);
        tokio::time::sleep(Duration::from_secs_f64(base + jitter)).await;
    }

    /// Long randomized backoff to outlast the typical rate-limit window,
    /// then a full browser restart to shed the state that triggered the
    /// block. Called once per run: the sticky flag prevents a second
    /// recovery attempt.
    async fn captcha_backoff(&mut self) -> Result<()> {
        warn!("🚨 CAPTCHA detected! Taking measures...");
        let wait: u64 = rand::thread_rng().gen_range(180..=300);
        info!("⏳ Waiting {} seconds to avoid blocking...", wait);

        let mut remaining = wait;
        while remaining > 0 {
            info!("⏰ Waiting {} more seconds...", remaining);
            let step = remaining.min(30);
            tokio::time::sleep(Duration::from_secs(step)).await;
            remaining -= step;
        }

        self.session.restart()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::scrapers::testutil::FakeFetcher;
    use tempfile::TempDir;

    struct FakeSession {
        fetcher: FakeFetcher,
        restarts: usize,
        closed: bool,
    }

    impl FakeSession {
        fn new(fetcher: FakeFetcher) -> Self {
            Self {
                fetcher,
                restarts: 0,
                closed: false,
            }
        }
    }

    impl PageFetcher for FakeSession {
        fn fetch(&self, url: &str, scroll: bool) -> FetchOutcome {
            self.fetcher.fetch(url, scroll)
        }
    }

    impl BrowserControl for FakeSession {
        fn restart(&mut self) -> Result<()> {
            self.restarts += 1;
            Ok(())
        }

        fn close(&mut self) {
            self.closed = true;
        }
    }

    fn test_config(dir: &TempDir, mode: Mode) -> ScraperConfig {
        let mut config = ScraperConfig::default();
        config.base_url = "https://x.test".to_string();
        config.data_dir = dir.path().to_path_buf();
        config.mode = mode;
        config.max_pages = 2;
        config
    }

    fn listing_page(links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!("<a href='{href}'>link</a>"))
            .collect();
        format!("<html><body>{anchors}</body></html>")
    }

    fn detail_page(title: &str) -> String {
        format!(
            "<html><body><div class='main-title'><h1>{title}</h1></div>\
             <span data-test='listing-price'>$ 100</span></body></html>"
        )
    }

    #[tokio::test(start_paused = true)]
    async fn records_follow_discovery_order_across_pages_and_projects() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new()
            .page(
                "https://x.test/s/venta",
                &listing_page(&["/detalle/a", "/proyecto/p"]),
            )
            .page("https://x.test/detalle/a", &detail_page("Casa A"))
            .page(
                "https://x.test/proyecto/p",
                "<html><body><h1 class='header__text'>Proyecto P</h1>\
                 <a href='/detalle/u1'>unidad</a></body></html>",
            )
            .page("https://x.test/detalle/u1", &detail_page("Unidad 1"))
            .page("https://x.test/s/venta/2", &listing_page(&[]));

        let session = FakeSession::new(fetcher);
        let mut orchestrator =
            ScrapeOrchestrator::new(test_config(&dir, Mode::Sale), session).unwrap();
        let stats = orchestrator.run().await.unwrap();

        let urls: Vec<_> = orchestrator
            .store()
            .records()
            .iter()
            .map(|r| r.url.as_str())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://x.test/detalle/a",
                "https://x.test/proyecto/p",
                "https://x.test/detalle/u1",
            ]
        );
        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.projects, 1);
        assert_eq!(stats.project_units, 1);
        assert!(!orchestrator.interrupted_by_captcha());
        assert!(orchestrator.session.closed);
        // Checkpoint files landed in the data dir.
        assert!(std::fs::read_dir(dir.path()).unwrap().count() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn captcha_triggers_one_restart_and_skips_everything_after() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new().blocked("https://x.test/s/venta");
        let session = FakeSession::new(fetcher);
        let mut orchestrator =
            ScrapeOrchestrator::new(test_config(&dir, Mode::Both), session).unwrap();
        let stats = orchestrator.run().await.unwrap();

        assert!(orchestrator.interrupted_by_captcha());
        assert_eq!(orchestrator.session.restarts, 1);
        assert_eq!(stats.total_records, 0);

        // The rental section was never touched.
        let fetched = orchestrator.session.fetcher.fetched();
        assert!(!fetched.iter().any(|u| u.contains("arriendo")));
        // Page 2 of venta was skipped too.
        assert!(!fetched.iter().any(|u| u.ends_with("/s/venta/2")));
        assert!(orchestrator.session.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_detail_pages_become_stored_error_records() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new()
            .page("https://x.test/s/venta", &listing_page(&["/detalle/a"]))
            .failed("https://x.test/detalle/a")
            .page("https://x.test/s/venta/2", &listing_page(&[]));

        let session = FakeSession::new(fetcher);
        let mut orchestrator =
            ScrapeOrchestrator::new(test_config(&dir, Mode::Sale), session).unwrap();
        let stats = orchestrator.run().await.unwrap();

        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.valid_records, 0);
        let record = &orchestrator.store().records()[0];
        assert!(record.error.as_deref().unwrap().starts_with("load_error:"));
    }

    #[tokio::test(start_paused = true)]
    async fn project_expansion_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new()
            .page("https://x.test/s/venta", &listing_page(&["/proyecto/p"]))
            .page(
                "https://x.test/proyecto/p",
                "<html><body><h1 class='header__text'>Proyecto P</h1>\
                 <a href='/detalle/u1'>unidad</a></body></html>",
            )
            .page("https://x.test/s/venta/2", &listing_page(&[]));

        let mut config = test_config(&dir, Mode::Sale);
        config.expand_project_units = false;
        let mut orchestrator =
            ScrapeOrchestrator::new(config, FakeSession::new(fetcher)).unwrap();
        let stats = orchestrator.run().await.unwrap();

        // The project page becomes a single basic record; its units are
        // never fetched.
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.projects, 1);
        let fetched = orchestrator.session.fetcher.fetched();
        assert!(!fetched.iter().any(|u| u.contains("/detalle/u1")));
    }
}
