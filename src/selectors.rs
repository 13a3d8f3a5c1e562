//! Site-specific selector tables and keyword lists for properati.com.co.
//!
//! These are maintained heuristics tuned against the live site's markup,
//! ordered from the most stable machine-readable hooks (`data-test`
//! attributes) down to presentational class names. They are configuration
//! data consumed by the generic extraction routines in `scrapers::fields`,
//! not logic.

/// Link-bearing selectors tried on search-result pages.
pub const LINK_SELECTORS: &[&str] = &[
    "a[href*='/detalle/']",
    "a[href*='/proyecto/']",
    "article.snippet a",
    ".listing-card a",
    "[data-url]",
];

pub const TITLE_SELECTORS: &[&str] = &[
    ".main-title h1",
    "h1.title",
    "[data-test='listing-title']",
    "h1",
];

pub const PRICE_SELECTORS: &[&str] = &[
    "[data-test='listing-price']",
    ".prices-and-fees__price",
    ".price",
    ".listing-price",
    ".value",
];

pub const LOCATION_SELECTORS: &[&str] = &[
    ".location",
    "[data-test='location']",
    ".property-location",
    ".address",
];

pub const BUILT_AREA_SELECTORS: &[&str] = &[
    "[data-test='floor-area-value']",
    ".floor-area .place-features__values",
    ".built-area",
    "[class*='area']",
];

pub const LAND_AREA_SELECTORS: &[&str] = &[
    "[data-test='plot-area-value']",
    "[data-test='area-value']",
    ".plot-area .place-features__values",
    ".land-area",
    ".area-land",
];

pub const STRATUM_SELECTORS: &[&str] = &[
    "[data-test='stratum-value']",
    ".stratum .place-features__values",
    ".stratum",
    "[class*='stratum']",
];

pub const YEAR_BUILT_SELECTORS: &[&str] = &[
    "[data-test='construction-year-value']",
    ".year .place-features__values",
    ".year-built",
    ".construction-year",
    "[class*='year']",
];

pub const FLOOR_LEVEL_SELECTORS: &[&str] = &[
    "[data-test='floor-value']",
    ".floor .place-features__values",
    ".floor-level",
    "[class*='floor']",
];

pub const ADMIN_FEE_SELECTORS: &[&str] = &[
    "[data-test='community-price']",
    ".administration",
    ".admin-fee",
    "[class*='admin']",
];

pub const PROPERTY_TYPE_SELECTORS: &[&str] = &[
    "[data-test='property-type-value']",
    ".property-type .place-features__values",
    ".property-type",
    "[class*='type']",
];

/// Short variant used for lot/land classification, before the broad
/// `[class*='type']` fallback can pick up unrelated markup.
pub const PROPERTY_TYPE_CLASSIFY_SELECTORS: &[&str] = &[
    "[data-test='property-type-value']",
    ".property-type .place-features__values",
    ".property-type",
];

pub const OPERATION_TYPE_SELECTORS: &[&str] = &[
    "[data-test='operation-type-value']",
    ".operation-type .place-features__values",
];

pub const STATUS_SELECTORS: &[&str] = &[
    "[data-test='status-value']",
    ".status .place-features__values",
];

pub const DESCRIPTION_SELECTORS: &[&str] = &[
    "[data-test='description-content']",
    ".description__content",
    ".listing-description",
    ".description",
];

/// List-like sections harvested for amenities.
pub const FEATURE_LIST_SELECTORS: &[&str] = &[
    "[data-test='amenities'] li",
    ".amenities li",
    ".property-features li",
    ".facilities li",
    ".features-list li",
];

/// Feature-row values adjacent to a parking icon (garage tier two).
pub const GARAGE_VALUE_SELECTORS: &[&str] = &[
    ".icon-parking + .place-features__values",
    ".parking .place-features__values",
    ".garage .place-features__values",
];

// Project pages.
pub const PROJECT_TITLE_SELECTORS: &[&str] = &["h1.header__text", "h1.title", ".project-title", "h1"];
pub const PROJECT_LOCATION_SELECTORS: &[&str] =
    &[".header__location span", ".location", ".project-location", ".address"];
pub const PROJECT_PRICE_SELECTORS: &[&str] =
    &[".price-info__value", ".price", ".project-price", ".value"];
pub const PROJECT_PRICE_LABEL_SELECTORS: &[&str] = &[".price-info__from"];
pub const PROJECT_DETAIL_ROW_SELECTOR: &str = ".units-summary .details-item__text";

/// Unit links searched across the whole project page first.
pub const UNIT_LINK_SELECTORS: &[&str] = &[
    "a[href*='/detalle/']",
    ".similar-snippet a",
    ".unit-card a",
    ".listing-card a",
    "[data-test*='property-card'] a",
];

/// Scoped fallback sections when the general pass finds nothing.
pub const UNIT_SECTION_SELECTORS: &[&str] =
    &[".units-section", ".available-units", ".project-units"];

// Pagination.
pub const NO_RESULTS_SELECTORS: &str = ".no-results, .empty-state, .no-listings";
pub const NEXT_PAGE_SELECTOR: &str = ".pagination .next, .pagination__next";

// Keyword lists (lowercase, matched as substrings).
pub const BEDROOM_KEYWORDS: &[&str] = &[
    "habitacion",
    "habitaciones",
    "dormitorio",
    "dormitorios",
    "room",
    "bedroom",
];
pub const BATHROOM_KEYWORDS: &[&str] = &["baño", "baños", "bath", "bathroom"];
pub const HALF_BATHROOM_KEYWORDS: &[&str] = &["medio baño", "medios baños", "half bath"];
pub const GARAGE_KEYWORDS: &[&str] =
    &["garaje", "estacionamiento", "parqueadero", "parking", "garage"];
pub const LOT_KEYWORDS: &[&str] = &["lote", "terreno", "finca", "parcela", "solar"];

/// Area-unit markers that disqualify a garage keyword match
/// ("45 m² de parqueadero" is an area, not a count).
pub const AREA_UNIT_KEYWORDS: &[&str] = &["m²", "m2", "mt2", "metros", "área", "area"];

/// Substrings of visible page text that flag an anti-bot challenge.
/// Not exhaustive; a miss means the run keeps going on garbage pages.
pub const CAPTCHA_INDICATORS: &[&str] = &[
    "security verification",
    "math problem",
    "to continue, please complete",
    "captcha",
    "challenge",
];

/// Path markers distinguishing the two scrapeable page kinds.
pub const DETAIL_PATH_MARKER: &str = "/detalle/";
pub const PROJECT_PATH_MARKER: &str = "/proyecto/";
