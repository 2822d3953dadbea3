use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::browser::{wait_until, Browser, Scope, WaitCondition, WaitOutcome};
use crate::config::Config;
use crate::pipeline::extract::RecordExtractor;
use crate::pipeline::pacing::{Pacer, Pause};
use crate::types::{Extraction, Record, SelectorSet, SkipReason};

/// Records from one loaded page, in card order, and the cards that were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHarvest {
    pub records: Vec<Record>,
    pub skips: Vec<SkipReason>,
}

impl PageHarvest {
    pub fn skipped(&self) -> usize {
        self.skips.len()
    }
}

/// A page either yields a harvest or never rendered its listings at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Harvested(PageHarvest),
    Fatal(String),
}

pub struct PageHarvester {
    cards: SelectorSet,
    content_timeout: Duration,
    poll_interval: Duration,
    extractor: RecordExtractor,
    pacer: Pacer,
}

impl PageHarvester {
    pub fn new(
        cards: SelectorSet,
        content_timeout: Duration,
        poll_interval: Duration,
        extractor: RecordExtractor,
        pacer: Pacer,
    ) -> Self {
        Self {
            cards,
            content_timeout,
            poll_interval,
            extractor,
            pacer,
        }
    }

    pub fn from_config(config: &Config, pacer: Pacer) -> Self {
        Self::new(
            config.selectors.cards.clone(),
            config.timeouts.content(),
            config.timeouts.poll_interval(),
            RecordExtractor::from_config(&config.selectors),
            pacer,
        )
    }

    /// Wait for listing cards, then extract every card in document order.
    ///
    /// Only read-only lookups are made against the page.
    #[instrument(skip_all)]
    pub async fn harvest<B: Browser + ?Sized>(&self, browser: &B) -> PageOutcome {
        let waited = wait_until(
            browser,
            WaitCondition::Present(&self.cards),
            self.content_timeout,
            self.poll_interval,
        )
        .await;

        match waited {
            Ok(WaitOutcome::Ready(_)) => debug!("Listing cards present"),
            Ok(WaitOutcome::TimedOut) => {
                warn!(
                    "No listing cards matching {} within {:.1}s",
                    self.cards,
                    self.content_timeout.as_secs_f64()
                );
                return PageOutcome::Fatal(format!(
                    "listing cards did not appear within {:.1}s",
                    self.content_timeout.as_secs_f64()
                ));
            }
            Err(e) => return PageOutcome::Fatal(format!("waiting for listing cards failed: {}", e)),
        }

        let cards = match browser.find_all(Scope::Page, &self.cards).await {
            Ok(cards) => cards,
            Err(e) => return PageOutcome::Fatal(format!("enumerating listing cards failed: {}", e)),
        };
        info!("Found {} candidate cards", cards.len());

        let mut harvest = PageHarvest::default();
        for (index, card) in cards.iter().enumerate() {
            match self.extractor.extract(browser, card).await {
                Extraction::Record(record) => {
                    harvest.records.push(record);
                    self.pacer.pause(Pause::PerCard).await;
                }
                Extraction::Skip(reason) => {
                    debug!("Skipping card {}: {}", index + 1, reason);
                    harvest.skips.push(reason);
                }
            }
        }

        PageOutcome::Harvested(harvest)
    }
}
