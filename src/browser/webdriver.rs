use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use super::{marked_disabled, Browser, Scope, URL_ATTRIBUTES};
use crate::config::BrowserConfig;
use crate::error::Result;
use crate::types::SelectorSet;

/// Chrome session driven over WebDriver (chromedriver).
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    /// Connect to the WebDriver server and open a new Chrome session.
    ///
    /// The user-agent override and the automation-signal suppression are
    /// applied here, before the first page is requested.
    pub async fn connect(config: &BrowserConfig) -> Result<Self> {
        info!("Connecting to WebDriver at {}", config.webdriver_url);
        let client = ClientBuilder::native()
            .capabilities(chrome_capabilities(config))
            .connect(&config.webdriver_url)
            .await?;
        info!("WebDriver session started");
        Ok(Self { client })
    }
}

/// Chrome launch arguments for a session that presents as a regular desktop browser
pub fn chrome_arguments(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        format!("--user-agent={}", config.user_agent),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--log-level=3".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        format!("--window-size={},{}", config.window_size.0, config.window_size.1),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args.extend(config.extra_args.iter().cloned());
    args
}

pub fn chrome_capabilities(config: &BrowserConfig) -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": chrome_arguments(config),
            "excludeSwitches": ["enable-automation"],
            "useAutomationExtension": false,
        }),
    );
    caps
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.client.goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn find_all(
        &self,
        scope: Scope<'_, Self::Element>,
        selectors: &SelectorSet,
    ) -> Result<Vec<Self::Element>> {
        let group = selectors.css_group();
        let locator = Locator::Css(&group);
        let found = match scope {
            Scope::Page => self.client.find_all(locator).await?,
            Scope::Within(element) => element.find_all(locator).await?,
        };
        Ok(found)
    }

    async fn is_clickable(&self, element: &Self::Element) -> Result<bool> {
        if !element.is_displayed().await? || !element.is_enabled().await? {
            return Ok(false);
        }
        let class = element.attr("class").await?;
        let aria_disabled = element.attr("aria-disabled").await?;
        Ok(!marked_disabled(class.as_deref(), aria_disabled.as_deref()))
    }

    async fn click(&self, element: &Self::Element) -> Result<()> {
        element.click().await?;
        Ok(())
    }

    async fn text(&self, element: &Self::Element) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>> {
        // the property, unlike the markup attribute, is already absolute
        if URL_ATTRIBUTES.contains(&name) {
            return Ok(element.prop(name).await?);
        }
        Ok(element.attr(name).await?)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        info!("Closing WebDriver session");
        self.client.clone().close().await?;
        Ok(())
    }
}
