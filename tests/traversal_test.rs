mod common;

use std::time::Duration;

use common::{
    blocked_page, fast_config, last_page_with_disabled_next, listing_page, page_url,
    page_with_inert_next, page_with_relative_links,
};
use listing_scraper::browser::SnapshotBrowser;
use listing_scraper::pipeline::{StopSignal, Termination, TraversalController};

fn urls(outcome: &listing_scraper::pipeline::TraversalOutcome) -> Vec<&str> {
    outcome.result.records.iter().map(|r| r.url.as_str()).collect()
}

#[tokio::test]
async fn test_walks_every_page_until_next_control_disappears() {
    let browser = SnapshotBrowser::new()
        .with_page(
            &page_url(1),
            &listing_page(
                &[
                    ("Notebook A", "https://item.test/a", "1.042.634"),
                    ("", "", ""),
                    ("Notebook B", "https://item.test/b", "899.999"),
                ],
                Some(&page_url(2)),
            ),
        )
        .with_page(
            &page_url(2),
            &listing_page(
                &[
                    // promoted again on the second page
                    ("Notebook A", "https://item.test/a", "1.042.634"),
                    ("Notebook C", "https://item.test/c", "45"),
                ],
                Some(&page_url(3)),
            ),
        )
        .with_page(
            &page_url(3),
            &listing_page(&[("Notebook D", "https://item.test/d", "2.500.000")], None),
        );
    let probe = browser.clone();

    let controller = TraversalController::from_config(browser, &fast_config(), StopSignal::new());
    let outcome = controller.run("laptop").await;

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(
        urls(&outcome),
        vec!["https://item.test/a", "https://item.test/b", "https://item.test/c", "https://item.test/d"]
    );
    assert_eq!(outcome.result.pages_visited, 3);
    assert_eq!(outcome.result.cards_skipped, 1);
    assert_eq!(outcome.result.duplicates_removed, 1);
    assert_eq!(outcome.result.records[2].price.to_string(), "0.45");
    assert_eq!(outcome.result.records[0].name, "Notebook A");
    assert_eq!(probe.history(), vec![page_url(1), page_url(2), page_url(3)]);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn test_single_page_when_next_control_never_appears() {
    let browser = SnapshotBrowser::new().with_page(
        &page_url(1),
        &listing_page(
            &[
                ("Mouse", "https://item.test/mouse", "12.500"),
                ("Keyboard", "https://item.test/keyboard", "30.000"),
            ],
            None,
        ),
    );
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("laptop")
        .await;

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.result.pages_visited, 1);
    assert_eq!(urls(&outcome), vec!["https://item.test/mouse", "https://item.test/keyboard"]);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn test_disabled_next_control_ends_pagination() {
    let browser = SnapshotBrowser::new()
        .with_page(
            &page_url(1),
            &listing_page(&[("One", "https://item.test/1", "1000")], Some(&page_url(2))),
        )
        .with_page(
            &page_url(2),
            &last_page_with_disabled_next(&[("Two", "https://item.test/2", "2000")]),
        );

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("laptop")
        .await;

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.result.pages_visited, 2);
    assert_eq!(urls(&outcome), vec!["https://item.test/1", "https://item.test/2"]);
}

#[tokio::test]
async fn test_fatal_page_keeps_earlier_records() {
    let browser = SnapshotBrowser::new()
        .with_page(
            &page_url(1),
            &listing_page(
                &[
                    ("First", "https://item.test/first", "10.000"),
                    ("Second", "https://item.test/second", "20.000"),
                ],
                Some(&page_url(2)),
            ),
        )
        .with_page(&page_url(2), &blocked_page());
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("laptop")
        .await;

    match &outcome.termination {
        Termination::Fatal(reason) => assert!(reason.starts_with("page 2:"), "reason: {}", reason),
        other => panic!("expected fatal termination, got {:?}", other),
    }
    assert_eq!(urls(&outcome), vec!["https://item.test/first", "https://item.test/second"]);
    assert_eq!(outcome.result.pages_visited, 1);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn test_unreachable_start_page_is_fatal_and_closes_session() {
    let browser = SnapshotBrowser::new();
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("laptop")
        .await;

    assert!(outcome.termination.is_fatal());
    assert!(outcome.result.records.is_empty());
    assert_eq!(outcome.result.pages_visited, 0);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn test_page_limit_stops_early() {
    let mut config = fast_config();
    config.run.max_pages = Some(2);

    let browser = SnapshotBrowser::new()
        .with_page(&page_url(1), &listing_page(&[("1", "https://item.test/1", "1000")], Some(&page_url(2))))
        .with_page(&page_url(2), &listing_page(&[("2", "https://item.test/2", "1000")], Some(&page_url(3))))
        .with_page(&page_url(3), &listing_page(&[("3", "https://item.test/3", "1000")], None));
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &config, StopSignal::new())
        .run("laptop")
        .await;

    assert_eq!(outcome.termination, Termination::PageLimit);
    assert_eq!(outcome.result.pages_visited, 2);
    assert_eq!(probe.history().len(), 2);
}

#[tokio::test]
async fn test_stop_signal_finishes_with_partial_results() {
    let browser = SnapshotBrowser::new().with_page(
        &page_url(1),
        &listing_page(&[("1", "https://item.test/1", "1000")], None),
    );
    let probe = browser.clone();
    let stop = StopSignal::new();
    stop.trigger();

    let outcome = TraversalController::from_config(browser, &fast_config(), stop)
        .run("laptop")
        .await;

    assert_eq!(outcome.termination, Termination::Cancelled);
    assert!(outcome.result.records.is_empty());
    assert!(probe.history().is_empty());
    assert!(probe.is_closed());
}

#[tokio::test]
async fn test_search_terms_with_spaces_use_path_separator() {
    let url = format!("{}gaming-laptop", common::BASE_URL);
    let browser = SnapshotBrowser::new().with_page(
        &url,
        &listing_page(&[("G", "https://item.test/g", "5000")], None),
    );
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("gaming laptop")
        .await;

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(probe.history(), vec![url]);
}

#[tokio::test]
async fn test_next_control_that_does_not_navigate_ends_pagination() {
    let browser = SnapshotBrowser::new().with_page(
        &page_url(1),
        &page_with_inert_next(&[("Only", "https://item.test/only", "1000")]),
    );
    let probe = browser.clone();

    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        TraversalController::from_config(browser, &fast_config(), StopSignal::new()).run("laptop"),
    )
    .await
    .expect("traversal must end on its own");

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.result.pages_visited, 1);
    assert_eq!(urls(&outcome), vec!["https://item.test/only"]);
    assert_eq!(probe.history(), vec![page_url(1)]);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn test_next_control_leading_back_to_a_visited_page_ends_pagination() {
    let browser = SnapshotBrowser::new()
        .with_page(
            &page_url(1),
            &listing_page(&[("1", "https://item.test/1", "1000")], Some(&page_url(2))),
        )
        .with_page(
            &page_url(2),
            // last page wraps around to the first
            &listing_page(&[("2", "https://item.test/2", "1000")], Some(&page_url(1))),
        );
    let probe = browser.clone();

    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        TraversalController::from_config(browser, &fast_config(), StopSignal::new()).run("laptop"),
    )
    .await
    .expect("traversal must end on its own");

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(outcome.result.pages_visited, 2);
    assert_eq!(urls(&outcome), vec!["https://item.test/1", "https://item.test/2"]);
    assert_eq!(probe.history(), vec![page_url(1), page_url(2), page_url(1)]);
}

#[tokio::test]
async fn test_relative_links_become_absolute_identifiers() {
    let browser = SnapshotBrowser::new()
        .with_page(
            &page_url(1),
            &page_with_relative_links(
                &[("Notebook", "/MLA-1-notebook"), ("Mouse", "MLA-2-mouse?tracking=1")],
                Some("laptop_Desde_51"),
            ),
        )
        .with_page(
            &page_url(2),
            &page_with_relative_links(&[("Notebook", "https://listado.test/MLA-1-notebook")], None),
        );
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("laptop")
        .await;

    assert_eq!(outcome.termination, Termination::Completed);
    assert_eq!(
        urls(&outcome),
        vec![
            "https://listado.test/MLA-1-notebook",
            "https://listado.test/MLA-2-mouse?tracking=1"
        ]
    );
    assert_eq!(outcome.result.duplicates_removed, 1);
    assert_eq!(probe.history(), vec![page_url(1), page_url(2)]);
}

#[tokio::test]
async fn test_consent_banner_is_dismissed_on_first_page_only() {
    let browser = SnapshotBrowser::new()
        .with_page(
            &page_url(1),
            &listing_page(&[("1", "https://item.test/1", "1000")], Some(&page_url(2))),
        )
        .with_page(
            &page_url(2),
            &listing_page(&[("2", "https://item.test/2", "1000")], None),
        );
    let probe = browser.clone();

    let outcome = TraversalController::from_config(browser, &fast_config(), StopSignal::new())
        .run("laptop")
        .await;

    assert_eq!(outcome.result.pages_visited, 2);
    let clicks = probe.clicks();
    let consent_clicks = clicks
        .iter()
        .filter(|html| html.contains("cookie-consent-button"))
        .count();
    assert_eq!(consent_clicks, 1);
    // consent first, then the one next-page link
    assert!(clicks[0].contains("cookie-consent-button"));
    assert_eq!(clicks.len(), 2);
}
