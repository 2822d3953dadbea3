#![allow(dead_code)]

use listing_scraper::config::{Config, PacingConfig};

pub const BASE_URL: &str = "https://listado.test/";

/// One listing card: name, link, price text. An empty link renders an ad
/// banner without any anchor.
pub type Card<'a> = (&'a str, &'a str, &'a str);

/// Config with no pacing and short waits so runs finish in milliseconds
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.pacing = PacingConfig::disabled();
    config.site.base_url = BASE_URL.to_string();
    config.timeouts.content = 0.05;
    config.timeouts.consent = 0.02;
    config.timeouts.next_page = 0.02;
    config.timeouts.poll_interval = 0.01;
    config
}

pub fn page_url(n: u32) -> String {
    if n == 1 {
        format!("{}laptop", BASE_URL)
    } else {
        format!("{}laptop_Desde_{}", BASE_URL, (n - 1) * 50 + 1)
    }
}

fn card_html(card: &Card<'_>) -> String {
    let (name, url, price) = card;
    if url.is_empty() {
        return r#"<li class="ui-search-layout__item"><div class="ad-banner">Sponsored</div></li>"#
            .to_string();
    }
    format!(
        r#"<li class="ui-search-layout__item">
             <a href="{url}"><h2 class="poly-component__title">{name}</h2></a>
             <span class="price-tag-fraction">{price}</span>
           </li>"#
    )
}

/// A results page in the listing site's markup. `next` adds the pagination
/// control pointing at that URL.
pub fn listing_page(cards: &[Card<'_>], next: Option<&str>) -> String {
    let items: String = cards.iter().map(card_html).collect();
    let pagination = match next {
        Some(url) => format!(
            r#"<ul class="andes-pagination">
                 <li class="andes-pagination__button andes-pagination__button--next">
                   <a class="andes-pagination__link" href="{url}">Siguiente</a>
                 </li>
               </ul>"#
        ),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html><html><head><title>laptop</title></head><body>
             <button class="cookie-consent-button">Aceptar cookies</button>
             <ol class="ui-search-layout">{items}</ol>
             {pagination}
           </body></html>"#
    )
}

/// Last page: the next control is still rendered, but disabled
pub fn last_page_with_disabled_next(cards: &[Card<'_>]) -> String {
    let items: String = cards.iter().map(card_html).collect();
    format!(
        r#"<html><body>
             <ol class="ui-search-layout">{items}</ol>
             <ul class="andes-pagination">
               <li class="andes-pagination__button andes-pagination__button--next andes-pagination__button--disabled">
                 <a class="andes-pagination__link">Siguiente</a>
               </li>
             </ul>
           </body></html>"#
    )
}

/// A page that never renders its listings, e.g. an interstitial block page
pub fn blocked_page() -> String {
    r#"<html><body><h1>Verifying you are human</h1></body></html>"#.to_string()
}

/// A page whose next control is rendered and enabled but goes nowhere: its
/// link carries no destination
pub fn page_with_inert_next(cards: &[Card<'_>]) -> String {
    let items: String = cards.iter().map(card_html).collect();
    format!(
        r#"<html><body>
             <ol class="ui-search-layout">{items}</ol>
             <ul class="andes-pagination">
               <li class="andes-pagination__button andes-pagination__button--next"><a>Siguiente</a></li>
             </ul>
           </body></html>"#
    )
}

/// Card and pagination links written relative to the page, as most sites do
pub fn page_with_relative_links(items: &[(&str, &str)], next: Option<&str>) -> String {
    let cards: String = items
        .iter()
        .map(|(name, href)| {
            format!(
                r#"<li class="ui-search-layout__item">
                     <a href="{href}"><h2>{name}</h2></a>
                     <span class="price-tag-fraction">1.000</span>
                   </li>"#
            )
        })
        .collect();
    let pagination = next
        .map(|href| {
            format!(
                r#"<ul><li class="andes-pagination__button--next"><a href="{href}">Siguiente</a></li></ul>"#
            )
        })
        .unwrap_or_default();
    format!(r#"<html><body><ol>{cards}</ol>{pagination}</body></html>"#)
}
