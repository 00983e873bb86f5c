use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::browser::network::NetworkExchange;
use crate::browser::selector::Selector;
use crate::error::SuiteResult;

/// DOM events dispatched after assigning a value directly, for inputs whose
/// bindings ignore synthetic typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    Blur,
}

/// Everything the helpers and the scenario runner need from a browser.
///
/// `BrowserSession` drives a real Chromium through the NDJSON driver; tests
/// substitute an in-memory storefront.
pub trait Browser {
    /// Load an absolute URL and wait for the page load event.
    fn navigate(&mut self, url: &str) -> SuiteResult<()>;

    fn current_url(&mut self) -> SuiteResult<String>;

    fn click(&mut self, target: &Selector) -> SuiteResult<()>;

    /// Clear the field and type `value`; press Enter afterwards when `submit`.
    fn fill(&mut self, target: &Selector, value: &str, submit: bool) -> SuiteResult<()>;

    /// Assign the value property and dispatch `events` (bubbling).
    fn set_value(&mut self, target: &Selector, value: &str, events: &[DomEvent]) -> SuiteResult<()>;

    /// Text content of the first match, `None` when nothing matches.
    fn query_text(&mut self, target: &Selector) -> SuiteResult<Option<String>>;

    /// Form value of the first match, `None` when nothing matches.
    fn query_value(&mut self, target: &Selector) -> SuiteResult<Option<String>>;

    fn query_visible(&mut self, target: &Selector) -> SuiteResult<bool>;

    /// `None` when nothing matches.
    fn query_enabled(&mut self, target: &Selector) -> SuiteResult<Option<bool>>;

    fn query_count(&mut self, target: &Selector) -> SuiteResult<u32>;

    /// Whether some visible element contains `text`.
    fn text_visible(&mut self, text: &str) -> SuiteResult<bool>;

    /// Completed exchanges with `index >= since`, oldest first.
    fn network_log(&mut self, since: usize) -> SuiteResult<Vec<NetworkExchange>>;

    /// Number of exchanges logged so far.
    fn network_cursor(&mut self) -> SuiteResult<usize>;

    /// Cookies and local storage of the current context.
    fn storage_state(&mut self) -> SuiteResult<Value>;

    fn restore_storage_state(&mut self, state: &Value) -> SuiteResult<()>;

    /// Clear cookies and storage and park on a blank page.
    fn reset(&mut self) -> SuiteResult<()>;

    fn screenshot(&mut self, path: &str) -> SuiteResult<()>;
}
