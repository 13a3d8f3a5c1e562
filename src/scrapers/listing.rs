use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::config::ScraperConfig;
use crate::selectors;

/// Extracts candidate property/project links from search-result pages and
/// detects the end of pagination.
pub struct ListingScraper {
    base_url: Url,
}

impl ListingScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid base URL: {}", config.base_url))?;
        Ok(Self { base_url })
    }

    /// All detail/project links on the page, resolved against the base
    /// URL and de-duplicated. First-discovery order is preserved so the
    /// output ordering of a run stays reproducible.
    pub fn extract_links(&self, document: &Html) -> Vec<String> {
        let mut links = Vec::new();

        for selector_str in selectors::LINK_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for element in document.select(&selector) {
                let href = element
                    .value()
                    .attr("href")
                    .or_else(|| element.value().attr("data-url"));
                let Some(href) = href else { continue };
                let Ok(resolved) = self.base_url.join(href) else {
                    continue;
                };
                let full_url = resolved.to_string();
                let is_candidate = full_url.contains(selectors::DETAIL_PATH_MARKER)
                    || full_url.contains(selectors::PROJECT_PATH_MARKER);
                if is_candidate && !links.contains(&full_url) {
                    links.push(full_url);
                }
            }
        }

        debug!("🔗 {} links found on listing page", links.len());
        links
    }

    /// True once an explicit no-results marker shows up or the next-page
    /// control is present but disabled. Lets the orchestrator stop a
    /// section before the configured page ceiling.
    pub fn pagination_exhausted(&self, document: &Html) -> bool {
        if let Ok(selector) = Selector::parse(selectors::NO_RESULTS_SELECTORS) {
            if document.select(&selector).next().is_some() {
                return true;
            }
        }

        if let Ok(selector) = Selector::parse(selectors::NEXT_PAGE_SELECTOR) {
            if let Some(next) = document.select(&selector).next() {
                let classes = next.value().attr("class").unwrap_or("");
                if classes.contains("disabled") || next.value().attr("disabled").is_some() {
                    return true;
                }
            }
        }

        false
    }
}
