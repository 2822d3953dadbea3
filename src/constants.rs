//! Site and selector defaults for the listing site this scraper targets.
//! Every value here can be overridden through the config file.

// Site layout
pub const DEFAULT_BASE_URL: &str = "https://listado.mercadolibre.com.ar/";
pub const DEFAULT_PATH_SEPARATOR: &str = "-";
pub const DEFAULT_FILE_SUFFIX: &str = "mercadolibre";

/// Placeholder used when a listing card carries a link but no readable name
pub const NAME_NOT_FOUND: &str = "name not found";

// Browser identity
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

// Output locations
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "listing_scraper.toml";

// Selector fallbacks, in priority order

pub const CARD_SELECTORS: &[&str] = &["li.ui-search-layout__item", "div.poly-card__content"];

pub const LINK_SELECTORS: &[&str] = &["a"];

pub const NAME_SELECTORS: &[&str] = &["h2", "h3"];

pub const PRICE_SELECTORS: &[&str] = &[
    "span.price-tag-fraction",
    "span.price-tag-amount",
    "div.poly-price__current",
];

pub const CONSENT_SELECTORS: &[&str] = &[
    "button.cookie-consent-button",
    "button[data-testid='action:understood-button']",
];

pub const NEXT_PAGE_SELECTORS: &[&str] = &["li.andes-pagination__button--next"];

pub const NEXT_PAGE_LINK_SELECTORS: &[&str] = &["a"];
