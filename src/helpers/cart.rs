use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::browser::driver::Browser;
use crate::browser::selector::Selector;
use crate::browser::wait::{wait_actionable, wait_text_visible};
use crate::error::{SuiteError, SuiteResult};
use crate::settings::RunSettings;

pub const EMPTY_CART_TEXT: &str = "Your cart is empty";

pub fn remove_all_button() -> Selector {
    Selector::test_id("remove-all-button")
}

pub fn confirm_remove_all_button() -> Selector {
    Selector::test_id("remove-all-items")
}

/// State of the cart's "remove all" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartAffordance {
    Absent,
    Actionable,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartClearOutcome {
    AlreadyEmpty,
    Cleared,
}

impl std::fmt::Display for CartClearOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CartClearOutcome::AlreadyEmpty => "already_empty",
            CartClearOutcome::Cleared => "cleared",
        })
    }
}

pub fn probe_remove_all(browser: &mut dyn Browser) -> SuiteResult<CartAffordance> {
    let button = remove_all_button();
    if browser.query_count(&button)? == 0 {
        return Ok(CartAffordance::Absent);
    }
    let visible = browser.query_visible(&button)?;
    let enabled = browser.query_enabled(&button)? == Some(true);
    Ok(if visible && enabled {
        CartAffordance::Actionable
    } else {
        CartAffordance::Disabled
    })
}

/// Empty the cart on the current cart page.
///
/// A missing "remove all" control only counts as an empty cart when the
/// empty-cart indicator is also shown. A control that stays disabled is an
/// error, not proof of anything.
pub fn empty_cart(browser: &mut dyn Browser, settings: &RunSettings) -> SuiteResult<CartClearOutcome> {
    let waiter = &settings.timeouts.assert;

    match probe_remove_all(browser)? {
        CartAffordance::Absent => {
            wait_text_visible(browser, waiter, EMPTY_CART_TEXT).map_err(|_| {
                SuiteError::CartState(format!(
                    "no remove-all control and \"{}\" is not shown",
                    EMPTY_CART_TEXT
                ))
            })?;
            debug!("cart already empty");
            return Ok(CartClearOutcome::AlreadyEmpty);
        }
        CartAffordance::Disabled => {
            wait_actionable(browser, waiter, &remove_all_button()).map_err(|_| {
                SuiteError::CartState("remove-all control is present but not actionable".into())
            })?;
        }
        CartAffordance::Actionable => {}
    }

    browser.click(&remove_all_button())?;

    let confirm = confirm_remove_all_button();
    wait_actionable(browser, waiter, &confirm)?;
    browser.click(&confirm)?;

    wait_text_visible(browser, waiter, EMPTY_CART_TEXT)?;
    info!("cart cleared");
    Ok(CartClearOutcome::Cleared)
}
