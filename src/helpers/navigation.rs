use tracing::info;

use crate::browser::driver::Browser;
use crate::browser::network::{AwaitedExchange, RoutePattern};
use crate::browser::selector::Selector;
use crate::browser::wait::wait_for_location;
use crate::error::SuiteResult;
use crate::settings::RunSettings;

/// Path fragment every product-detail location contains.
pub const PRODUCT_PATH: &str = "/products/";

pub const CART_PATH: &str = "/cart";

pub fn search_input() -> Selector {
    Selector::test_id("search-input").visible_only()
}

/// Type `identifier` into the header search and submit. Complete only once
/// the location is a product-detail view; returns that URL.
pub fn search_and_open(
    browser: &mut dyn Browser,
    settings: &RunSettings,
    identifier: &str,
) -> SuiteResult<String> {
    let timeouts = &settings.timeouts;
    let input = search_input();

    if !browser.query_visible(&input)? {
        browser.navigate(&settings.url("/")?)?;
    }

    timeouts.assert.until("search input to be enabled", || {
        Ok((browser.query_enabled(&input)? == Some(true)).then_some(()))
    })?;
    browser.fill(&input, identifier, true)?;

    let url = wait_for_location(browser, &timeouts.navigation, PRODUCT_PATH)?;
    info!(%identifier, %url, "product page open");
    Ok(url)
}

/// Visit the search-results URL directly, synchronized on the results
/// exchange, and wait for the redirect to the product page.
pub fn open_search_results(
    browser: &mut dyn Browser,
    settings: &RunSettings,
    query: &str,
) -> SuiteResult<String> {
    let timeouts = &settings.timeouts;
    let pending =
        AwaitedExchange::new(RoutePattern::get("**/search/results**")).begin(browser)?;

    browser.navigate(&settings.url_with_query("/search/results", &[("query", query)])?)?;
    pending.finish(browser, &timeouts.exchange)?;

    let url = wait_for_location(browser, &timeouts.navigation, PRODUCT_PATH)?;
    info!(%query, %url, "product page open");
    Ok(url)
}

/// Visit the cart and wait for its data exchange to return 200.
pub fn open_cart(browser: &mut dyn Browser, settings: &RunSettings) -> SuiteResult<()> {
    let pending =
        AwaitedExchange::expecting(RoutePattern::get("**/cart/**"), 200).begin(browser)?;
    browser.navigate(&settings.url(CART_PATH)?)?;
    pending.finish(browser, &settings.timeouts.exchange)?;
    wait_for_location(browser, &settings.timeouts.navigation, CART_PATH)?;
    Ok(())
}
