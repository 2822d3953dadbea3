use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;
use url::Url;

use super::{marked_disabled, Browser, Scope, URL_ATTRIBUTES};
use crate::error::{Result, ScraperError};
use crate::types::SelectorSet;

/// Name of the file mapping URLs to saved pages inside a snapshot directory
pub const SNAPSHOT_INDEX: &str = "index.txt";

/// Element handle: the element's outer HTML, re-parsed for scoped lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotElement {
    html: String,
}

#[derive(Default)]
struct State {
    current: Option<String>,
    history: Vec<String>,
    clicks: Vec<String>,
}

/// A [`Browser`] that serves saved HTML pages from memory.
///
/// Clicking an element with an `href` navigates to that URL, resolved against
/// the current page, so pagination chains can be replayed offline. Clones
/// share the same session state.
#[derive(Clone, Default)]
pub struct SnapshotBrowser {
    pages: Arc<HashMap<String, String>>,
    state: Arc<Mutex<State>>,
    closed: Arc<AtomicBool>,
}

impl SnapshotBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a page. Only valid while building, before the browser is cloned.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), html.to_string());
        self
    }

    /// Load pages listed in `<dir>/index.txt`, one `url<TAB>file` per line.
    /// Blank lines and lines starting with `#` are ignored.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let index_path = dir.join(SNAPSHOT_INDEX);
        let index = fs::read_to_string(&index_path).map_err(|e| {
            ScraperError::Config(format!("Failed to read snapshot index '{}': {}", index_path.display(), e))
        })?;

        let mut browser = Self::new();
        for (line_no, line) in index.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (url, file) = line.split_once('\t').ok_or_else(|| {
                ScraperError::Config(format!(
                    "{}:{}: expected 'url<TAB>file'",
                    index_path.display(),
                    line_no + 1
                ))
            })?;
            let html = fs::read_to_string(dir.join(file.trim()))?;
            browser = browser.with_page(url.trim(), &html);
        }

        debug!("Loaded {} snapshot pages from {}", browser.pages.len(), dir.display());
        Ok(browser)
    }

    /// URLs navigated to so far, in order, including clicks that followed links
    pub fn history(&self) -> Vec<String> {
        self.lock().map(|s| s.history.clone()).unwrap_or_default()
    }

    /// Outer HTML of every clicked element, in click order
    pub fn clicks(&self) -> Vec<String> {
        self.lock().map(|s| s.clicks.clone()).unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| ScraperError::Browser("snapshot session state poisoned".into()))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(ScraperError::Browser("session already closed".into()));
        }
        Ok(())
    }

    fn current_html(&self) -> Result<String> {
        let state = self.lock()?;
        let url = state
            .current
            .as_ref()
            .ok_or_else(|| ScraperError::Browser("no page loaded".into()))?;
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScraperError::Browser(format!("no snapshot for {}", url)))
    }

    /// `value` resolved against the current page URL; unchanged when either
    /// side does not parse
    fn resolve(&self, value: &str) -> Result<String> {
        let state = self.lock()?;
        let resolved = state
            .current
            .as_deref()
            .and_then(|base| Url::parse(base).ok())
            .and_then(|base| base.join(value).ok())
            .map(String::from);
        Ok(resolved.unwrap_or_else(|| value.to_string()))
    }

    fn go(&self, url: &str) -> Result<()> {
        if !self.pages.contains_key(url) {
            return Err(ScraperError::Browser(format!("no snapshot for {}", url)));
        }
        let mut state = self.lock()?;
        state.current = Some(url.to_string());
        state.history.push(url.to_string());
        Ok(())
    }
}

fn parse_selector(group: &str) -> Result<Selector> {
    Selector::parse(group)
        .map_err(|e| ScraperError::Browser(format!("invalid selector '{}': {:?}", group, e)))
}

/// Matches of `group` in a whole document
fn select_in_document(html: &str, group: &str) -> Result<Vec<SnapshotElement>> {
    let selector = parse_selector(group)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(|el| SnapshotElement { html: el.html() })
        .collect())
}

/// Matches of `group` among the descendants of a saved element
fn select_within(scope_html: &str, group: &str) -> Result<Vec<SnapshotElement>> {
    let selector = parse_selector(group)?;
    let fragment = Html::parse_fragment(scope_html);
    let scope_id = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)
        .map(|el| el.id());

    Ok(fragment
        .select(&selector)
        .filter(|el| Some(el.id()) != scope_id)
        .map(|el| SnapshotElement { html: el.html() })
        .collect())
}

/// Runs `f` against the element's own root node
fn with_root<T>(element: &SnapshotElement, f: impl FnOnce(ElementRef<'_>) -> T) -> Result<T> {
    let fragment = Html::parse_fragment(&element.html);
    let root = fragment
        .root_element()
        .children()
        .find_map(ElementRef::wrap)
        .ok_or_else(|| ScraperError::Browser("stale element reference".into()))?;
    Ok(f(root))
}

#[async_trait]
impl Browser for SnapshotBrowser {
    type Element = SnapshotElement;

    async fn navigate(&self, url: &str) -> Result<()> {
        self.ensure_open()?;
        self.go(url)
    }

    async fn current_url(&self) -> Result<String> {
        self.ensure_open()?;
        self.lock()?
            .current
            .clone()
            .ok_or_else(|| ScraperError::Browser("no page loaded".into()))
    }

    async fn find_all(
        &self,
        scope: Scope<'_, Self::Element>,
        selectors: &SelectorSet,
    ) -> Result<Vec<Self::Element>> {
        self.ensure_open()?;
        let group = selectors.css_group();
        match scope {
            Scope::Page => select_in_document(&self.current_html()?, &group),
            Scope::Within(element) => select_within(&element.html, &group),
        }
    }

    async fn is_clickable(&self, element: &Self::Element) -> Result<bool> {
        with_root(element, |root| {
            let el = root.value();
            let disabled = el.attr("disabled").is_some()
                || el.attr("hidden").is_some()
                || marked_disabled(el.attr("class"), el.attr("aria-disabled"));
            !disabled
        })
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        self.ensure_open()?;
        self.lock()?.clicks.push(element.html.clone());
        let href = with_root(element, |root| root.value().attr("href").map(str::to_string))?;
        match href {
            Some(href) => {
                let url = self.resolve(&href)?;
                self.go(&url)
            }
            None => Ok(()),
        }
    }

    async fn text(&self, element: &Self::Element) -> Result<String> {
        with_root(element, |root| root.text().collect::<String>().trim().to_string())
    }

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        let value = with_root(element, |root| root.value().attr(name).map(str::to_string))?;
        match value {
            Some(value) if URL_ATTRIBUTES.contains(&name) && !value.trim().is_empty() => {
                Ok(Some(self.resolve(value.trim())?))
            }
            other => Ok(other),
        }
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
