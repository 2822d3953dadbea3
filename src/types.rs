use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative money amount held as whole minor units (hundredths).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price {
    cents: u64,
}

impl Price {
    pub const ZERO: Price = Price { cents: 0 };

    pub fn from_cents(cents: u64) -> Self {
        Self { cents }
    }

    /// Whole units with no fractional part. Saturates instead of overflowing.
    pub fn from_units(units: u64) -> Self {
        Self {
            cents: units.saturating_mul(100),
        }
    }

    pub fn cents(&self) -> u64 {
        self.cents
    }

    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

/// One scraped listing. The url doubles as the deduplication key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub price: Price,
    pub url: String,
}

impl Record {
    pub fn identifier(&self) -> &str {
        &self.url
    }
}

/// Why a listing card did not produce a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No link inside the card; promotional blocks and banners look like this
    NotAListing,
    /// The link exists but carries no destination
    MissingIdentifier,
    PriceNotFound,
    /// The browser failed mid-extraction, e.g. a stale element reference
    ExtractionFailure(String),
}

impl SkipReason {
    /// Short stable label, used as a metrics dimension
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::NotAListing => "not_a_listing",
            SkipReason::MissingIdentifier => "missing_identifier",
            SkipReason::PriceNotFound => "price_not_found",
            SkipReason::ExtractionFailure(_) => "extraction_failure",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAListing => write!(f, "not a listing (likely an advertisement or banner)"),
            SkipReason::MissingIdentifier => write!(f, "listing link has no destination"),
            SkipReason::PriceNotFound => write!(f, "price not found"),
            SkipReason::ExtractionFailure(cause) => write!(f, "extraction failure: {}", cause),
        }
    }
}

/// Outcome of running the record extractor over one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Record(Record),
    Skip(SkipReason),
}

/// Ordered CSS selector fallbacks.
///
/// Single-element lookups try each selector in turn and the first one that
/// matches wins. Multi-element lookups match the whole set at once and keep
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectorSet(Vec<String>);

impl SelectorSet {
    pub fn new<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(selectors.into_iter().map(Into::into).collect())
    }

    pub fn single(selector: &str) -> Self {
        Self(vec![selector.to_string()])
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The set as one CSS selector group, e.g. `"h2, h3"`
    pub fn css_group(&self) -> String {
        self.0.join(", ")
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|s| s.trim().is_empty())
    }
}

impl From<&[&str]> for SelectorSet {
    fn from(selectors: &[&str]) -> Self {
        Self::new(selectors.iter().copied())
    }
}

impl fmt::Display for SelectorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.css_group())
    }
}

/// Final output of a run: deduplicated records in first-seen order plus counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionResult {
    pub records: Vec<Record>,
    pub pages_visited: u32,
    pub cards_skipped: usize,
    pub duplicates_removed: usize,
}
