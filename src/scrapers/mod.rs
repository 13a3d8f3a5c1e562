pub mod browser;
pub mod detail;
pub mod fields;
pub mod listing;
pub mod orchestrator;
pub mod project;
pub mod traits;

pub use browser::BrowserSession;
pub use orchestrator::ScrapeOrchestrator;

#[cfg(test)]
pub(crate) mod testutil {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use scraper::Html;

    use super::traits::{FetchOutcome, PageFetcher};

    /// Canned page source for extractor and orchestrator tests.
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        blocked: HashSet<String>,
        failed: HashSet<String>,
        fetched: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self {
                pages: HashMap::new(),
                blocked: HashSet::new(),
                failed: HashSet::new(),
                fetched: RefCell::new(Vec::new()),
            }
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }

        pub fn blocked(mut self, url: &str) -> Self {
            self.blocked.insert(url.to_string());
            self
        }

        pub fn failed(mut self, url: &str) -> Self {
            self.failed.insert(url.to_string());
            self
        }

        /// Every URL fetched, in order.
        pub fn fetched(&self) -> Vec<String> {
            self.fetched.borrow().clone()
        }
    }

    impl PageFetcher for FakeFetcher {
        fn fetch(&self, url: &str, _scroll: bool) -> FetchOutcome {
            self.fetched.borrow_mut().push(url.to_string());
            if self.blocked.contains(url) {
                FetchOutcome::Blocked
            } else if self.failed.contains(url) {
                FetchOutcome::Failed("simulated load failure".to_string())
            } else if let Some(html) = self.pages.get(url) {
                FetchOutcome::Page(Html::parse_document(html))
            } else {
                FetchOutcome::Failed(format!("no fixture for {url}"))
            }
        }
    }
}
