use tracing::debug;

use crate::browser::{Browser, Scope};
use crate::config::SelectorConfig;
use crate::constants::NAME_NOT_FOUND;
use crate::error::Result;
use crate::pipeline::processing::normalize::{normalize_name, normalize_price};
use crate::types::{Extraction, Record, SelectorSet, SkipReason};

/// Turns one listing card into a [`Record`], or says why it could not.
///
/// Field lookups, each an ordered fallback list where the first match wins:
/// - link: searched in the card; its absence marks the card as promotional
/// - name: searched in the link; falls back to the link's own text
/// - price: searched in the card
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    link: SelectorSet,
    name: SelectorSet,
    price: SelectorSet,
}

impl RecordExtractor {
    pub fn new(link: SelectorSet, name: SelectorSet, price: SelectorSet) -> Self {
        Self { link, name, price }
    }

    pub fn from_config(selectors: &SelectorConfig) -> Self {
        Self::new(
            selectors.link.clone(),
            selectors.name.clone(),
            selectors.price.clone(),
        )
    }

    /// Never fails: browser errors become [`SkipReason::ExtractionFailure`].
    pub async fn extract<B: Browser + ?Sized>(&self, browser: &B, card: &B::Element) -> Extraction {
        match self.try_extract(browser, card).await {
            Ok(extraction) => extraction,
            Err(e) => {
                debug!("Card extraction failed: {}", e);
                Extraction::Skip(SkipReason::ExtractionFailure(e.to_string()))
            }
        }
    }

    async fn try_extract<B: Browser + ?Sized>(
        &self,
        browser: &B,
        card: &B::Element,
    ) -> Result<Extraction> {
        let link = match browser.find_one(Scope::Within(card), &self.link).await? {
            Some(link) => link,
            None => return Ok(Extraction::Skip(SkipReason::NotAListing)),
        };

        let url = match browser.attribute(&link, "href").await? {
            Some(href) if !href.trim().is_empty() => href.trim().to_string(),
            _ => return Ok(Extraction::Skip(SkipReason::MissingIdentifier)),
        };

        let raw_name = match browser.find_one(Scope::Within(&link), &self.name).await? {
            Some(heading) => browser.text(&heading).await?,
            None => browser.text(&link).await?,
        };
        let name = normalize_name(&raw_name).unwrap_or_else(|| NAME_NOT_FOUND.to_string());

        let price_element = match browser.find_one(Scope::Within(card), &self.price).await? {
            Some(element) => element,
            None => return Ok(Extraction::Skip(SkipReason::PriceNotFound)),
        };
        let price = normalize_price(&browser.text(&price_element).await?);

        Ok(Extraction::Record(Record { name, price, url }))
    }
}
