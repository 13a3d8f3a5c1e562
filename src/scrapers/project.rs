use anyhow::{Context, Result};
use scraper::{Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::config::ScraperConfig;
use crate::models::PropertyRecord;
use crate::scrapers::detail::DetailScraper;
use crate::scrapers::fields;
use crate::scrapers::traits::{FetchOutcome, PageFetcher};
use crate::selectors;

/// Rows harvested from a project's units-summary block.
#[derive(Default)]
struct ProjectDetails {
    units: Option<String>,
    bedrooms: Option<String>,
    bathrooms: Option<String>,
    built_area: Option<String>,
    land_area: Option<String>,
}

/// Scrapes development projects: one summary record plus every
/// discoverable unit as its own detail record.
pub struct ProjectScraper {
    base_url: Url,
    detail: DetailScraper,
}

impl ProjectScraper {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("invalid base URL: {}", config.base_url))?;
        Ok(Self {
            base_url,
            detail: DetailScraper::new(config),
        })
    }

    /// Unit links from an already-fetched project document. The general
    /// selectors run first across the whole page; the scoped
    /// available-units sections are only consulted when the general pass
    /// yields nothing. Order-preserving de-duplication.
    fn unit_links_from(&self, document: &Html) -> Vec<String> {
        let mut unit_links: Vec<String> = Vec::new();

        for selector_str in selectors::UNIT_LINK_SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for element in document.select(&selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if !href.contains(selectors::DETAIL_PATH_MARKER) {
                    continue;
                }
                if let Ok(resolved) = self.base_url.join(href) {
                    let full_url = resolved.to_string();
                    if !unit_links.contains(&full_url) {
                        unit_links.push(full_url);
                    }
                }
            }
        }

        if unit_links.is_empty() {
            for section_selector in selectors::UNIT_SECTION_SELECTORS {
                let Ok(section_sel) = Selector::parse(section_selector) else {
                    continue;
                };
                let Ok(link_sel) = Selector::parse("a[href*='/detalle/']") else {
                    continue;
                };
                for section in document.select(&section_sel) {
                    for element in section.select(&link_sel) {
                        let Some(href) = element.value().attr("href") else {
                            continue;
                        };
                        if let Ok(resolved) = self.base_url.join(href) {
                            let full_url = resolved.to_string();
                            if !unit_links.contains(&full_url) {
                                unit_links.push(full_url);
                            }
                        }
                    }
                }
            }
        }

        unit_links
    }

    /// Fetch a project page and list its unit links in discovery order.
    pub fn extract_unit_links(&self, fetcher: &dyn PageFetcher, project_url: &str) -> Vec<String> {
        info!("🏗️ Extracting units from project: {}", project_url);
        match fetcher.fetch(project_url, false) {
            FetchOutcome::Page(document) => self.unit_links_from(&document),
            FetchOutcome::Blocked | FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    fn harvest_details(&self, document: &Html) -> ProjectDetails {
        let mut details = ProjectDetails::default();
        let Ok(selector) = Selector::parse(selectors::PROJECT_DETAIL_ROW_SELECTOR) else {
            return details;
        };
        for row in document.select(&selector) {
            let text = row
                .text()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let lower = text.to_lowercase();
            if lower.contains("unidades") {
                details.units = Some(text);
            } else if lower.contains("habitaciones") {
                details.bedrooms = Some(text);
            } else if lower.contains("baños") {
                details.bathrooms = Some(text);
            } else if lower.contains("área construida") {
                details.built_area = Some(text);
            } else if lower.contains("área total") {
                details.land_area = Some(text);
            }
        }
        details
    }

    /// The project's own record: header info plus whatever the
    /// units-summary block announces (unit count, room ranges, areas).
    fn project_summary(&self, document: &Html, project_url: &str) -> PropertyRecord {
        let details = self.harvest_details(document);
        let na = "N/A";

        let mut record = PropertyRecord::stub(project_url);
        record.title = fields::extract_text(document, selectors::PROJECT_TITLE_SELECTORS, na);
        record.neighborhood =
            fields::extract_text(document, selectors::PROJECT_LOCATION_SELECTORS, na);
        record.price = fields::extract_text(document, selectors::PROJECT_PRICE_SELECTORS, na);
        record.built_area = details.built_area.unwrap_or_else(|| na.to_string());
        record.land_area = details.land_area.unwrap_or_else(|| na.to_string());
        record.bedrooms = details.bedrooms.unwrap_or_else(|| na.to_string());
        record.bathrooms = details.bathrooms.unwrap_or_else(|| na.to_string());
        record.property_type = "Proyecto".to_string();
        record.business_type = fields::business_type(project_url, document).as_str().to_string();
        record.is_project = Some("Sí".to_string());
        record.has_individual_units =
            Some(if details.units.is_some() { "Sí" } else { "No" }.to_string());
        record.project_units = Some(details.units.unwrap_or_else(|| na.to_string()));
        record.price_label = Some(fields::extract_text(
            document,
            selectors::PROJECT_PRICE_LABEL_SELECTORS,
            "Precio",
        ));
        record
    }

    /// Scrape a project and each of its units. Result ordering is always
    /// `[project record, unit₁, unit₂, …]` in discovery order. A unit
    /// failure is logged and that unit skipped; it never aborts sibling
    /// units or the project record already captured.
    pub fn scrape_project_with_units(
        &self,
        fetcher: &dyn PageFetcher,
        project_url: &str,
    ) -> Vec<PropertyRecord> {
        let document = match fetcher.fetch(project_url, false) {
            FetchOutcome::Blocked => {
                return vec![PropertyRecord::error(project_url, "CAPTCHA detected")];
            }
            FetchOutcome::Failed(reason) => {
                return vec![PropertyRecord::error(
                    project_url,
                    format!("project_error: {reason}"),
                )];
            }
            FetchOutcome::Page(document) => document,
        };

        let summary = self.project_summary(&document, project_url);
        let project_name = summary.title.clone();
        let unit_links = self.unit_links_from(&document);
        info!("📦 Project has {} individual units", unit_links.len());

        let mut records = vec![summary];
        for (i, unit_url) in unit_links.iter().enumerate() {
            info!("   🏠 Scraping unit {}/{}", i + 1, unit_links.len());
            let mut unit = self.detail.scrape_property(fetcher, unit_url);
            if unit.error.is_some() {
                warn!("   ⚠️ Could not scrape unit: {}", unit_url);
                continue;
            }
            unit.project_parent = Some(project_url.to_string());
            unit.project_name = Some(project_name.clone());
            unit.is_project_unit = Some("Sí".to_string());
            records.push(unit);
        }

        info!(
            "✅ Project completed: {} records (1 project + {} units)",
            records.len(),
            records.len() - 1
        );
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testutil::FakeFetcher;

    const PROJECT_URL: &str = "https://www.properati.com.co/proyecto/torre-norte-venta";

    fn scraper() -> ProjectScraper {
        ProjectScraper::new(&ScraperConfig::default()).unwrap()
    }

    fn project_page(unit_slugs: &[&str]) -> String {
        let links: String = unit_slugs
            .iter()
            .map(|slug| format!("<a href='/detalle/{slug}'>unidad</a>"))
            .collect();
        format!(
            "<html><body>\
               <h1 class='header__text'>Torre Norte</h1>\
               <div class='header__location'><span>Suba, Bogotá</span></div>\
               <div class='price-info__value'>$ 310.000.000</div>\
               <div class='price-info__from'>Desde</div>\
               <div class='units-summary'>\
                 <div class='details-item__text'>24 unidades</div>\
                 <div class='details-item__text'>2 a 3 habitaciones</div>\
                 <div class='details-item__text'>2 baños</div>\
                 <div class='details-item__text'>Área construida 58-74 m²</div>\
               </div>\
               {links}\
             </body></html>"
        )
    }

    fn unit_page(title: &str) -> String {
        format!(
            "<html><body>\
               <div class='main-title'><h1>{title}</h1></div>\
               <span data-test='listing-price'>$ 300.000.000</span>\
               <span data-test='property-type-value'>Apartamento</span>\
             </body></html>"
        )
    }

    #[test]
    fn unit_links_resolve_and_deduplicate_in_order() {
        let html = "<html><body>\
             <a href='/detalle/u-2'>dos</a>\
             <a href='/detalle/u-1'>uno</a>\
             <div class='unit-card'><a href='/detalle/u-2'>dos otra vez</a></div>\
             <a href='/proyecto/otro'>no es unidad</a>\
           </body></html>";
        let document = Html::parse_document(html);
        let links = scraper().unit_links_from(&document);
        assert_eq!(
            links,
            vec![
                "https://www.properati.com.co/detalle/u-2",
                "https://www.properati.com.co/detalle/u-1",
            ]
        );
    }

    #[test]
    fn unit_links_inside_scoped_sections_are_still_found() {
        let html = "<html><body>\
             <div class='available-units'>\
               <a href='/detalle/u-9'>unidad</a>\
             </div>\
           </body></html>";
        let document = Html::parse_document(html);
        let links = scraper().unit_links_from(&document);
        assert_eq!(links, vec!["https://www.properati.com.co/detalle/u-9"]);
    }

    #[test]
    fn page_without_detail_links_yields_no_units() {
        let html = "<html><body><a href='/proyecto/otro'>otro proyecto</a></body></html>";
        let document = Html::parse_document(html);
        assert!(scraper().unit_links_from(&document).is_empty());
    }

    #[test]
    fn project_summary_harvests_units_block() {
        let document = Html::parse_document(&project_page(&[]));
        let record = scraper().project_summary(&document, PROJECT_URL);

        assert_eq!(record.title, "Torre Norte");
        assert_eq!(record.neighborhood, "Suba, Bogotá");
        assert_eq!(record.price, "$ 310.000.000");
        assert_eq!(record.property_type, "Proyecto");
        assert_eq!(record.project_units.as_deref(), Some("24 unidades"));
        assert_eq!(record.has_individual_units.as_deref(), Some("Sí"));
        assert_eq!(record.price_label.as_deref(), Some("Desde"));
        assert_eq!(record.bedrooms, "2 a 3 habitaciones");
        assert_eq!(record.built_area, "Área construida 58-74 m²");
        assert_eq!(record.is_project.as_deref(), Some("Sí"));
        // URL carries "venta"
        assert_eq!(record.business_type, "Venta");
    }

    #[test]
    fn summary_without_units_block_reports_no_individual_units() {
        let html = "<html><body><h1 class='header__text'>Mirador</h1></body></html>";
        let document = Html::parse_document(html);
        let record = scraper().project_summary(&document, PROJECT_URL);
        assert_eq!(record.has_individual_units.as_deref(), Some("No"));
        assert_eq!(record.project_units.as_deref(), Some("N/A"));
        assert_eq!(record.price_label.as_deref(), Some("Precio"));
    }

    #[test]
    fn blocked_project_yields_single_error_record() {
        let fetcher = FakeFetcher::new().blocked(PROJECT_URL);
        let records = scraper().scrape_project_with_units(&fetcher, PROJECT_URL);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].error.as_deref(), Some("CAPTCHA detected"));
    }

    #[test]
    fn failed_unit_is_skipped_without_aborting_siblings() {
        let fetcher = FakeFetcher::new()
            .page(PROJECT_URL, &project_page(&["u-1", "u-2", "u-3"]))
            .page("https://www.properati.com.co/detalle/u-1", &unit_page("Apto 101"))
            .failed("https://www.properati.com.co/detalle/u-2")
            .page("https://www.properati.com.co/detalle/u-3", &unit_page("Apto 303"));

        let records = scraper().scrape_project_with_units(&fetcher, PROJECT_URL);

        // 1 project + units 1 and 3; the failed unit is absent entirely.
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].property_type, "Proyecto");
        assert_eq!(records[1].title, "Apto 101");
        assert_eq!(records[2].title, "Apto 303");
        assert!(!records.iter().any(|r| r.url.contains("u-2")));

        for unit in &records[1..] {
            assert_eq!(unit.is_project_unit.as_deref(), Some("Sí"));
            assert_eq!(unit.project_parent.as_deref(), Some(PROJECT_URL));
            assert_eq!(unit.project_name.as_deref(), Some("Torre Norte"));
        }
    }

    #[test]
    fn project_with_three_healthy_units_yields_four_records() {
        let fetcher = FakeFetcher::new()
            .page(PROJECT_URL, &project_page(&["u-1", "u-2", "u-3"]))
            .page("https://www.properati.com.co/detalle/u-1", &unit_page("Apto 101"))
            .page("https://www.properati.com.co/detalle/u-2", &unit_page("Apto 202"))
            .page("https://www.properati.com.co/detalle/u-3", &unit_page("Apto 303"));

        let records = scraper().scrape_project_with_units(&fetcher, PROJECT_URL);
        assert_eq!(records.len(), 4);
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Torre Norte", "Apto 101", "Apto 202", "Apto 303"]);
    }
}
