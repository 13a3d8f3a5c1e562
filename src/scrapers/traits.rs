use anyhow::Result;
use scraper::Html;

/// Outcome of fetching and rendering one URL.
///
/// `Blocked` and `Failed` are normal, expected outcomes the caller must
/// branch on; neither is retried at this layer. Retry and backoff policy
/// belongs to the orchestrator.
pub enum FetchOutcome {
    /// Rendered document, already past the CAPTCHA check.
    Page(Html),
    /// The site answered with an anti-bot challenge instead of content.
    Blocked,
    /// Navigation, timeout or capture failure; carries a short diagnostic.
    Failed(String),
}

/// Narrow page-rendering capability handed to extractor components.
///
/// Extractors receive this by reference and never own the underlying
/// browser; teardown and restart stay with the orchestrator.
pub trait PageFetcher {
    /// Navigate to `url`, wait for readiness and return the rendered
    /// document. When `scroll` is set, run a bounded lazy-load scroll
    /// pass before capturing markup.
    fn fetch(&self, url: &str, scroll: bool) -> FetchOutcome;
}

/// Full session control, reserved for the orchestrator.
pub trait BrowserControl: PageFetcher {
    /// Tear down the current browser and launch a fresh one, discarding
    /// cookies and fingerprint state.
    fn restart(&mut self) -> Result<()>;

    /// Tear down the browser. Safe to call more than once.
    fn close(&mut self);
}
