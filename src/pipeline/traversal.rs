//! Page-by-page traversal of a search's result listing.
//!
//! ```text
//! Start -> LoadingPage -> ConsentCheck (page 1) -> WaitingForContent -> Harvesting
//!       -> SeekingNextControl -> Advancing -> LoadingPage ...
//!                            \-> Terminated
//! ```
//!
//! A missing next-page control is the normal end of pagination, and so is a
//! control that does not lead to a new, unvisited URL. A page whose
//! listings never render ends the run as fatal. Either way the records
//! collected so far are returned and the browser session is closed.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::browser::{wait_for_navigation, wait_until, Browser, Scope, WaitCondition, WaitOutcome};
use crate::config::{Config, SiteConfig};
use crate::error::Result;
use crate::observability::metrics;
use crate::pipeline::harvest::{PageHarvest, PageHarvester, PageOutcome};
use crate::pipeline::pacing::{Pacer, Pause};
use crate::pipeline::storage::collector::DeduplicatingCollector;
use crate::types::{CollectionResult, SelectorSet};

/// Shared stop request, checked at the top of every traversal state
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why the traversal stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// No next-page control led to a new page
    Completed,
    /// The configured page cap was reached
    PageLimit,
    /// A stop signal arrived
    Cancelled,
    /// A page failed to load or render its listings
    Fatal(String),
}

impl Termination {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Termination::Fatal(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Termination::Completed => "completed",
            Termination::PageLimit => "page_limit",
            Termination::Cancelled => "cancelled",
            Termination::Fatal(_) => "fatal",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Completed => write!(f, "pagination complete"),
            Termination::PageLimit => write!(f, "page limit reached"),
            Termination::Cancelled => write!(f, "stopped on request"),
            Termination::Fatal(reason) => write!(f, "fatal: {}", reason),
        }
    }
}

/// Everything a finished traversal hands back
#[derive(Debug, Clone)]
pub struct TraversalOutcome {
    pub result: CollectionResult,
    pub termination: Termination,
}

/// Page number and, for the first page only, the URL to load.
/// Later pages are reached by clicking, so they carry no target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    pub page: u32,
    pub target: Option<String>,
}

enum State<E> {
    Start,
    LoadingPage,
    ConsentCheck,
    WaitingForContent,
    Harvesting(PageHarvest),
    SeekingNextControl,
    Advancing(E),
    Terminated(Termination),
}

impl<E> State<E> {
    fn name(&self) -> &'static str {
        match self {
            State::Start => "start",
            State::LoadingPage => "loading_page",
            State::ConsentCheck => "consent_check",
            State::WaitingForContent => "waiting_for_content",
            State::Harvesting(_) => "harvesting",
            State::SeekingNextControl => "seeking_next_control",
            State::Advancing(_) => "advancing",
            State::Terminated(_) => "terminated",
        }
    }
}

/// Timeouts and selectors the controller itself uses; the harvester carries
/// its own for the listing cards.
#[derive(Debug, Clone)]
pub struct TraversalSettings {
    pub site: SiteConfig,
    pub consent: SelectorSet,
    pub next_page: SelectorSet,
    pub next_page_link: SelectorSet,
    pub consent_timeout: Duration,
    pub next_page_timeout: Duration,
    pub poll_interval: Duration,
    pub max_pages: Option<u32>,
}

impl TraversalSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            site: config.site.clone(),
            consent: config.selectors.consent.clone(),
            next_page: config.selectors.next_page.clone(),
            next_page_link: config.selectors.next_page_link.clone(),
            consent_timeout: config.timeouts.consent(),
            next_page_timeout: config.timeouts.next_page(),
            poll_interval: config.timeouts.poll_interval(),
            max_pages: config.run.max_pages,
        }
    }
}

/// Owns the browser session for the duration of one run.
pub struct TraversalController<B: Browser> {
    browser: B,
    harvester: PageHarvester,
    settings: TraversalSettings,
    pacer: Pacer,
    stop: StopSignal,
}

impl<B: Browser> TraversalController<B> {
    pub fn new(
        browser: B,
        harvester: PageHarvester,
        settings: TraversalSettings,
        pacer: Pacer,
        stop: StopSignal,
    ) -> Self {
        Self {
            browser,
            harvester,
            settings,
            pacer,
            stop,
        }
    }

    pub fn from_config(browser: B, config: &Config, stop: StopSignal) -> Self {
        let pacer = Pacer::new(config.pacing.clone());
        Self::new(
            browser,
            PageHarvester::from_config(config, pacer.clone()),
            TraversalSettings::from_config(config),
            pacer,
            stop,
        )
    }

    /// Traverse every result page for `search_term`, then close the session.
    #[instrument(skip(self))]
    pub async fn run(self, search_term: &str) -> TraversalOutcome {
        let mut collector = DeduplicatingCollector::new();
        let termination = self.traverse(search_term, &mut collector).await;

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        match &termination {
            Termination::Fatal(reason) => warn!(
                "Traversal aborted after {} page(s): {}",
                collector.pages_visited(),
                reason
            ),
            other => info!("Traversal finished after {} page(s): {}", collector.pages_visited(), other),
        }
        metrics::traversal::duplicates_dropped(collector.duplicates());
        metrics::traversal::run_finished(termination.label());

        TraversalOutcome {
            result: collector.finalize(),
            termination,
        }
    }

    async fn traverse(
        &self,
        search_term: &str,
        collector: &mut DeduplicatingCollector,
    ) -> Termination {
        let mut page = PageState { page: 1, target: None };
        let mut visited: HashSet<String> = HashSet::new();
        let mut state: State<B::Element> = State::Start;

        loop {
            if self.stop.is_triggered() && !matches!(state, State::Terminated(_)) {
                info!("Stop requested during {}; finishing with partial results", state.name());
                state = State::Terminated(Termination::Cancelled);
            }

            state = match state {
                State::Start => {
                    let url = self.settings.site.listing_url(search_term);
                    visited.insert(url.clone());
                    page.target = Some(url);
                    State::LoadingPage
                }
                State::LoadingPage => self.load_page(&mut page, &mut visited).await,
                State::ConsentCheck => {
                    self.dismiss_consent().await;
                    State::WaitingForContent
                }
                State::WaitingForContent => match self.harvester.harvest(&self.browser).await {
                    PageOutcome::Harvested(harvest) => State::Harvesting(harvest),
                    PageOutcome::Fatal(reason) => State::Terminated(Termination::Fatal(format!(
                        "page {}: {}",
                        page.page, reason
                    ))),
                },
                State::Harvesting(harvest) => {
                    Self::collect(&page, harvest, collector);
                    match self.settings.max_pages {
                        Some(max) if page.page >= max => {
                            info!("Reached the page limit of {}", max);
                            State::Terminated(Termination::PageLimit)
                        }
                        _ => State::SeekingNextControl,
                    }
                }
                State::SeekingNextControl => match self.find_next_control().await {
                    Some(control) => State::Advancing(control),
                    None => {
                        info!("No next-page control; pagination complete");
                        State::Terminated(Termination::Completed)
                    }
                },
                State::Advancing(control) => {
                    self.pacer.pause(Pause::BeforeClick).await;
                    match self.advance(&control).await {
                        Ok(Some(url)) if visited.insert(url.clone()) => {
                            page.page += 1;
                            page.target = None;
                            info!("Advancing to page {} ({})", page.page, url);
                            self.pacer.pause(Pause::AfterAdvance).await;
                            State::LoadingPage
                        }
                        Ok(Some(url)) => {
                            info!("Next-page control led back to {}; pagination complete", url);
                            State::Terminated(Termination::Completed)
                        }
                        Ok(None) => {
                            info!("Next-page control did not leave the current page; pagination complete");
                            State::Terminated(Termination::Completed)
                        }
                        Err(e) => {
                            info!("Next-page control could not be activated ({}); pagination complete", e);
                            State::Terminated(Termination::Completed)
                        }
                    }
                }
                State::Terminated(termination) => return termination,
            };
        }
    }

    async fn load_page(
        &self,
        page: &mut PageState,
        visited: &mut HashSet<String>,
    ) -> State<B::Element> {
        self.pacer.pause(Pause::PageStart).await;

        if let Some(url) = page.target.take() {
            info!("Navigating to {}", url);
            if let Err(e) = self.browser.navigate(&url).await {
                return State::Terminated(Termination::Fatal(format!(
                    "navigation to {} failed: {}",
                    url, e
                )));
            }
        }

        match self.browser.current_url().await {
            Ok(url) => {
                info!("Scraping page {} ({})", page.page, url);
                // redirects may land somewhere other than the requested URL
                visited.insert(url);
            }
            Err(e) => debug!("Scraping page {} (current URL unavailable: {})", page.page, e),
        }

        if page.page == 1 {
            State::ConsentCheck
        } else {
            State::WaitingForContent
        }
    }

    /// Best effort; a missing or stubborn banner is not an error.
    async fn dismiss_consent(&self) {
        let waited = wait_until(
            &self.browser,
            WaitCondition::Clickable(&self.settings.consent),
            self.settings.consent_timeout,
            self.settings.poll_interval,
        )
        .await;

        match waited {
            Ok(WaitOutcome::Ready(button)) => match self.browser.click(&button).await {
                Ok(()) => {
                    info!("Cookie banner dismissed");
                    self.pacer.pause(Pause::AfterConsent).await;
                }
                Err(e) => debug!("Cookie banner could not be dismissed: {}", e),
            },
            Ok(WaitOutcome::TimedOut) => debug!("No cookie banner shown"),
            Err(e) => debug!("Cookie banner lookup failed: {}", e),
        }
    }

    /// Click the control and wait for the URL to change. `None` when it never did.
    async fn advance(&self, control: &B::Element) -> Result<Option<String>> {
        let before = self.browser.current_url().await?;
        self.browser.click(control).await?;
        wait_for_navigation(
            &self.browser,
            &before,
            self.settings.next_page_timeout,
            self.settings.poll_interval,
        )
        .await
    }

    fn collect(page: &PageState, harvest: PageHarvest, collector: &mut DeduplicatingCollector) {
        let before = collector.len();
        let skipped = harvest.skipped();
        for reason in &harvest.skips {
            metrics::traversal::card_skipped(reason);
        }
        for record in harvest.records {
            collector.add(record);
        }
        collector.record_page(skipped);

        let added = collector.len() - before;
        metrics::traversal::page_visited();
        metrics::traversal::records_collected(added);
        info!(
            "Page {}: {} new record(s), {} card(s) skipped, {} collected so far",
            page.page,
            added,
            skipped,
            collector.len()
        );
    }

    /// Scroll so lazy pagination renders, then wait for a clickable next-page
    /// control. Returns the element to click: the control's inner link when it
    /// has one, otherwise the control itself.
    async fn find_next_control(&self) -> Option<B::Element> {
        if let Err(e) = self.browser.scroll_to_bottom().await {
            debug!("Scroll to bottom failed: {}", e);
        }
        self.pacer.pause(Pause::AfterScroll).await;

        let waited = wait_until(
            &self.browser,
            WaitCondition::Clickable(&self.settings.next_page),
            self.settings.next_page_timeout,
            self.settings.poll_interval,
        )
        .await;

        let control = match waited {
            Ok(WaitOutcome::Ready(control)) => control,
            Ok(WaitOutcome::TimedOut) => return None,
            Err(e) => {
                debug!("Next-page lookup failed: {}", e);
                return None;
            }
        };

        match self
            .browser
            .find_one(Scope::Within(&control), &self.settings.next_page_link)
            .await
        {
            Ok(Some(link)) => Some(link),
            Ok(None) => Some(control),
            Err(e) => {
                debug!("Next-page link lookup failed: {}", e);
                None
            }
        }
    }
}
