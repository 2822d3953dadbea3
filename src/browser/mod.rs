//! Browser capability consumed by the scraping pipeline.
//!
//! The pipeline never talks to a concrete browser. It locates elements by
//! selector set, reads their text and attributes, clicks them, and waits for
//! conditions with an explicit deadline. [`webdriver::WebDriverBrowser`] drives a
//! real Chrome session; [`snapshot::SnapshotBrowser`] replays saved HTML pages.

pub mod snapshot;
pub mod webdriver;

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;
use crate::types::SelectorSet;

pub use snapshot::SnapshotBrowser;
pub use webdriver::WebDriverBrowser;

/// Attributes whose values are URLs and are returned resolved
pub const URL_ATTRIBUTES: &[&str] = &["href", "src"];

/// Where an element lookup searches: the whole page, or the descendants of
/// one element.
pub enum Scope<'a, E> {
    Page,
    Within(&'a E),
}

impl<E> Clone for Scope<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Scope<'_, E> {}

#[async_trait]
pub trait Browser: Send + Sync {
    /// Opaque handle to an element on the current page
    type Element: Clone + Send + Sync;

    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    /// Every element matching any selector of the set, in document order
    async fn find_all(
        &self,
        scope: Scope<'_, Self::Element>,
        selectors: &SelectorSet,
    ) -> Result<Vec<Self::Element>>;

    /// First match of the highest-priority selector that matches anything
    async fn find_one(
        &self,
        scope: Scope<'_, Self::Element>,
        selectors: &SelectorSet,
    ) -> Result<Option<Self::Element>> {
        for selector in selectors.iter() {
            let found = self.find_all(scope, &SelectorSet::single(selector)).await?;
            if let Some(first) = found.into_iter().next() {
                return Ok(Some(first));
            }
        }
        Ok(None)
    }

    /// Visible and enabled
    async fn is_clickable(&self, element: &Self::Element) -> Result<bool>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    async fn text(&self, element: &Self::Element) -> Result<String>;

    /// Attribute value. URL-valued attributes (`href`, `src`) come back
    /// resolved against the page URL, as the DOM property reports them.
    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Ends the session. Must be safe to call on every exit path.
    async fn close(&self) -> Result<()>;
}

/// Condition polled by [`wait_until`]
#[derive(Debug, Clone, Copy)]
pub enum WaitCondition<'a> {
    /// Some element of the set exists on the page
    Present(&'a SelectorSet),
    /// The highest-priority matching element is visible and enabled
    Clickable(&'a SelectorSet),
}

/// Result of a bounded wait. Timing out is an ordinary outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<E> {
    Ready(E),
    TimedOut,
}


/// Poll `condition` until it holds or `timeout` elapses. The condition is
/// always checked at least once, and once more at the deadline.
pub async fn wait_until<B>(
    browser: &B,
    condition: WaitCondition<'_>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<WaitOutcome<B::Element>>
where
    B: Browser + ?Sized,
{
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(element) = check(browser, condition).await? {
            return Ok(WaitOutcome::Ready(element));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(WaitOutcome::TimedOut);
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Poll the current URL until it differs from `from`. Returns the new URL, or
/// `None` when the page stayed put for the whole timeout.
pub async fn wait_for_navigation<B>(
    browser: &B,
    from: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Option<String>>
where
    B: Browser + ?Sized,
{
    let deadline = Instant::now() + timeout;

    loop {
        let current = browser.current_url().await?;
        if current != from {
            return Ok(Some(current));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(poll_interval.min(deadline - now)).await;
    }
}

/// Disabled through a class name or ARIA state. Pagination widgets are
/// usually list items or links, where WebDriver's "enabled" check always
/// reports true.
pub fn marked_disabled(class: Option<&str>, aria_disabled: Option<&str>) -> bool {
    let aria = aria_disabled.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    let class = class.is_some_and(|c| c.split_whitespace().any(|name| name.contains("disabled")));
    aria || class
}

async fn check<B>(browser: &B, condition: WaitCondition<'_>) -> Result<Option<B::Element>>
where
    B: Browser + ?Sized,
{
    match condition {
        WaitCondition::Present(selectors) => browser.find_one(Scope::Page, selectors).await,
        WaitCondition::Clickable(selectors) => {
            match browser.find_one(Scope::Page, selectors).await? {
                Some(element) if browser.is_clickable(&element).await? => Ok(Some(element)),
                _ => Ok(None),
            }
        }
    }
}
