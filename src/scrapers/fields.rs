//! Generic tiered field extraction against semi-structured markup.
//!
//! Every routine here consumes the declarative selector/keyword tables in
//! `crate::selectors` and falls back from stable machine-readable hooks to
//! loose keyword proximity. Exact-match-first avoids false positives from
//! keyword proximity on pages that still carry the stable markup.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::models::BusinessType;
use crate::selectors;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern"));

/// First run of digits in `text`, as the raw string.
fn first_digit_run(text: &str) -> Option<String> {
    DIGIT_RUN.find(text).map(|m| m.as_str().to_string())
}

/// Normalized text of one element: segments trimmed and joined.
fn element_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full visible text of the document, used by the CAPTCHA detector and
/// page-wide keyword checks.
pub fn visible_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Try selectors in order and return the first element's normalized text.
/// Empty text and a bare dash both count as a miss.
pub fn extract_text(document: &Html, selector_list: &[&str], default: &str) -> String {
    for selector_str in selector_list {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(element);
            if !text.is_empty() && text != "-" {
                return text;
            }
        }
    }
    default.to_string()
}

/// Three-tier numeric extraction: exact `data-test` attribute, then
/// value-role classes with a context keyword, then any text node carrying
/// a keyword. Returns the first digit run found, else `default`.
pub fn extract_numeric_near(
    document: &Html,
    data_test_attr: &str,
    keywords: &[&str],
    default: &str,
) -> String {
    // 1. Machine-readable attribute, the most reliable hook.
    if let Ok(selector) = Selector::parse(&format!("[data-test=\"{data_test_attr}\"]")) {
        for element in document.select(&selector) {
            if let Some(digits) = first_digit_run(&element_text(element)) {
                return digits;
            }
        }
    }

    // 2. Elements in a "value" role whose text mentions a keyword.
    if let Ok(selector) = Selector::parse("[class]") {
        for element in document.select(&selector) {
            let class_attr = element.value().attr("class").unwrap_or("");
            if !class_attr.contains("details-item-value") && !class_attr.contains("value") {
                continue;
            }
            let text = element_text(element).to_lowercase();
            if keywords.iter().any(|k| text.contains(k)) {
                if let Some(digits) = first_digit_run(&text) {
                    return digits;
                }
            }
        }
    }

    // 3. Any text node anywhere mentioning a keyword.
    for node in document.tree.nodes() {
        if let Some(text) = node.value().as_text() {
            let lower = text.to_lowercase();
            if keywords.iter().any(|k| lower.contains(k)) {
                if let Some(digits) = first_digit_run(&lower) {
                    return digits;
                }
            }
        }
    }

    default.to_string()
}

/// Garage count has its own four-tier fallback: the exact attribute, then
/// icon-adjacent feature values, then keyword-bearing text that is not an
/// area figure ("45 m² de parqueadero" is an allocation size, not a
/// count), and finally a keyword mention with no number at all, which the
/// site uses to mean one parking spot.
pub fn extract_garage(document: &Html) -> String {
    if let Ok(selector) = Selector::parse("[data-test=\"parking-lots-value\"]") {
        for element in document.select(&selector) {
            if let Some(digits) = first_digit_run(&element_text(element)) {
                return digits;
            }
        }
    }

    for selector_str in selectors::GARAGE_VALUE_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(digits) = first_digit_run(&element_text(element)) {
                return digits;
            }
        }
    }

    let mut facility_without_count = false;
    for node in document.tree.nodes() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let lower = text.to_lowercase();
        if !selectors::GARAGE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            continue;
        }
        match first_digit_run(&lower) {
            Some(digits) => {
                let is_area = selectors::AREA_UNIT_KEYWORDS.iter().any(|k| lower.contains(k));
                if !is_area {
                    return digits;
                }
            }
            None => facility_without_count = true,
        }
    }

    if facility_without_count {
        return "1".to_string();
    }
    "N/A".to_string()
}

/// Tiered business-type inference: explicit operation-type field, then
/// URL substrings, then page-wide keywords. The page-text tier lets
/// arriendo/renta win even in the presence of "venta"; that asymmetry
/// matches the live site's markup and is kept on purpose.
pub fn business_type(url: &str, document: &Html) -> BusinessType {
    let operation = extract_text(document, selectors::OPERATION_TYPE_SELECTORS, "N/A");
    if operation.contains("Venta") {
        return BusinessType::Venta;
    }
    if operation.contains("Arriendo") || operation.contains("Renta") {
        return BusinessType::Arriendo;
    }

    let url_lower = url.to_lowercase();
    if url_lower.contains("venta") {
        return BusinessType::Venta;
    }
    if url_lower.contains("arriendo") || url_lower.contains("renta") {
        return BusinessType::Arriendo;
    }

    let page_text = visible_text(document).to_lowercase();
    if page_text.contains("venta") && !page_text.contains("arriendo") {
        return BusinessType::Venta;
    }
    if page_text.contains("arriendo") || page_text.contains("renta") {
        return BusinessType::Arriendo;
    }

    BusinessType::Unknown
}

/// Lots and land have no rooms; a positive match forces the room and
/// bathroom fields to "N/A" instead of extracting them.
pub fn is_lot_or_land(property_type: &str) -> bool {
    let lower = property_type.to_lowercase();
    selectors::LOT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Heuristic tripwire for anti-bot challenge pages. The indicator list is
/// not exhaustive; false negatives are expected.
pub fn is_captcha(page_text: &str) -> bool {
    let lower = page_text.to_lowercase();
    selectors::CAPTCHA_INDICATORS.iter().any(|i| lower.contains(i))
}
