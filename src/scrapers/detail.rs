use scraper::{Html, Selector};
use tracing::info;

use crate::config::ScraperConfig;
use crate::models::PropertyRecord;
use crate::scrapers::fields;
use crate::scrapers::traits::{FetchOutcome, PageFetcher};
use crate::selectors;

/// Parses individual property pages into records and dispatches a fetched
/// URL to the right parser.
pub struct DetailScraper {
    config: ScraperConfig,
}

impl DetailScraper {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Free-text description: first matching selector, whitespace
    /// collapsed, hard-capped length.
    fn extract_description(&self, document: &Html) -> String {
        let raw = fields::extract_text(document, selectors::DESCRIPTION_SELECTORS, "N/A");
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() > self.config.description_max_len {
            collapsed.chars().take(self.config.description_max_len).collect()
        } else {
            collapsed
        }
    }

    /// Amenities collected across every candidate list section,
    /// de-duplicated in order. An empty harvest normalizes to `["N/A"]`.
    fn extract_features(&self, document: &Html) -> Vec<String> {
        let mut features: Vec<String> = Vec::new();
        for selector_str in selectors::FEATURE_LIST_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for element in document.select(&selector) {
                let text = element
                    .text()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !text.is_empty() && !features.contains(&text) {
                    features.push(text);
                }
            }
        }
        if features.is_empty() {
            features.push("N/A".to_string());
        }
        features
    }

    /// One structured record from a property detail page. Lot/land
    /// classification runs first because it gates room extraction.
    pub fn parse_detail_page(&self, document: &Html, url: &str) -> PropertyRecord {
        let type_text = fields::extract_text(
            document,
            selectors::PROPERTY_TYPE_CLASSIFY_SELECTORS,
            "N/A",
        );
        let is_lot = fields::is_lot_or_land(&type_text);
        let na = "N/A";

        let mut record = PropertyRecord::stub(url);
        record.title = fields::extract_text(document, selectors::TITLE_SELECTORS, na);
        record.neighborhood = fields::extract_text(document, selectors::LOCATION_SELECTORS, na);
        record.price = fields::extract_text(document, selectors::PRICE_SELECTORS, na);
        record.built_area = fields::extract_text(document, selectors::BUILT_AREA_SELECTORS, na);
        record.land_area = fields::extract_text(document, selectors::LAND_AREA_SELECTORS, na);
        record.bedrooms = if is_lot {
            na.to_string()
        } else {
            fields::extract_numeric_near(document, "bedrooms-value", selectors::BEDROOM_KEYWORDS, na)
        };
        record.bathrooms = if is_lot {
            na.to_string()
        } else {
            fields::extract_numeric_near(
                document,
                "full-bathrooms-value",
                selectors::BATHROOM_KEYWORDS,
                na,
            )
        };
        record.half_bathrooms = if is_lot {
            na.to_string()
        } else {
            fields::extract_numeric_near(
                document,
                "half-bathrooms-value",
                selectors::HALF_BATHROOM_KEYWORDS,
                na,
            )
        };
        record.garage = fields::extract_garage(document);
        record.stratum = fields::extract_text(document, selectors::STRATUM_SELECTORS, na);
        record.year_built = fields::extract_text(document, selectors::YEAR_BUILT_SELECTORS, na);
        record.floor_level = fields::extract_text(document, selectors::FLOOR_LEVEL_SELECTORS, na);
        record.administration_fee =
            fields::extract_text(document, selectors::ADMIN_FEE_SELECTORS, na);
        record.property_type =
            fields::extract_text(document, selectors::PROPERTY_TYPE_SELECTORS, na);
        record.business_type = fields::business_type(url, document).as_str().to_string();
        record.status = fields::extract_text(document, selectors::STATUS_SELECTORS, na);
        record.property_category = if is_lot { "Lote/Terreno" } else { "Construcción" }.to_string();
        record.description = self.extract_description(document);

        let features = self.extract_features(document);
        record.features_count = if features == ["N/A"] {
            "0".to_string()
        } else {
            features.len().to_string()
        };
        record.features = features.join(", ");

        record
    }

    /// Basic record for a project page reached as an ordinary link.
    /// Projects describe a development, not a single unit, so every
    /// physical field stays "N/A".
    pub fn parse_project_page(&self, document: &Html, url: &str) -> PropertyRecord {
        let mut record = PropertyRecord::stub(url);
        record.title = fields::extract_text(document, selectors::PROJECT_TITLE_SELECTORS, "N/A");
        record.neighborhood =
            fields::extract_text(document, selectors::PROJECT_LOCATION_SELECTORS, "N/A");
        record.price = fields::extract_text(document, selectors::PROJECT_PRICE_SELECTORS, "N/A");
        record.property_type = "Proyecto".to_string();
        record.business_type = fields::business_type(url, document).as_str().to_string();
        record.is_project = Some("Sí".to_string());
        record
    }

    /// Top-level per-URL entry. Always returns a record; failures become
    /// error-tagged records rather than dropped URLs or propagated faults.
    pub fn scrape_property(&self, fetcher: &dyn PageFetcher, url: &str) -> PropertyRecord {
        info!("🔍 Scraping property: {}", url);
        match fetcher.fetch(url, false) {
            FetchOutcome::Blocked => PropertyRecord::error(url, "CAPTCHA detected"),
            FetchOutcome::Failed(reason) => {
                PropertyRecord::error(url, format!("load_error: {reason}"))
            }
            FetchOutcome::Page(document) => {
                if url.contains(selectors::PROJECT_PATH_MARKER) {
                    self.parse_project_page(&document, url)
                } else if url.contains(selectors::DETAIL_PATH_MARKER) {
                    self.parse_detail_page(&document, url)
                } else {
                    PropertyRecord::error(url, "Unknown URL type")
                }
            }
        }
    }
}
