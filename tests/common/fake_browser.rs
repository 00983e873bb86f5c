use std::collections::{HashMap, HashSet};

use serde_json::Value;
use storefront_e2e::browser::driver::{Browser, DomEvent};
use storefront_e2e::browser::network::NetworkExchange;
use storefront_e2e::browser::selector::Selector;
use storefront_e2e::error::{SuiteError, SuiteResult};

pub const ORIGIN: &str = "https://shop.test";

/// One element of the fake page, addressed by its CSS selector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeElement {
    pub text: Option<String>,
    pub value: Option<String>,
    pub visible: bool,
    pub enabled: bool,
}

impl FakeElement {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            value: None,
            visible: true,
            enabled: true,
        }
    }

    pub fn input(value: &str) -> Self {
        Self {
            text: None,
            value: Some(value.to_string()),
            visible: true,
            enabled: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Something the fake page does in response to an interaction.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Log a completed exchange for `ORIGIN + path`
    Exchange {
        method: &'static str,
        path: String,
        status: u16,
    },
    Show(String, FakeElement),
    Remove(String),
    SetText(String, String),
    /// Load another page (runs its navigation rules)
    GoTo(String),
    ShowText(String),
    SetStorage(Value),
    /// Add the quantity held by the input at this selector to the cart
    AddToCart(String),
    /// Cart page body for the current cart contents
    RenderCart,
    ClearCart,
    /// Write `unit * quantity` into the price element
    Reprice {
        price_css: String,
        quantity_css: String,
        unit_cents: i64,
    },
    /// Cap a quantity input at `available` and show the over-inventory prompt
    CapQuantity {
        quantity_css: String,
        available: u32,
    },
}

/// In-memory `Browser` driven by scripted rules, standing in for the
/// Playwright driver.
#[derive(Debug, Default)]
pub struct FakeBrowser {
    pub url: String,
    pub elements: HashMap<String, FakeElement>,
    pub texts: Vec<String>,
    pub exchanges: Vec<NetworkExchange>,
    pub storage: Value,

    pub page_rules: HashMap<String, Vec<Effect>>,
    pub click_rules: HashMap<String, Vec<Effect>>,
    pub fill_rules: HashMap<String, Vec<Effect>>,
    pub submit_rules: HashMap<String, Vec<Effect>>,

    pub cart_quantity: u32,
    pub cart_item: String,

    /// Commands that answer with a driver error
    pub failing: HashSet<&'static str>,

    pub visits: Vec<String>,
    pub clicks: Vec<String>,
    pub fills: Vec<(String, String)>,
    pub dispatched: Vec<(String, String, Vec<DomEvent>)>,
    pub restored: Vec<Value>,
    pub screenshots: Vec<String>,
    pub resets: usize,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self {
            url: "about:blank".into(),
            storage: Value::Null,
            ..Self::default()
        }
    }

    pub fn with_element(mut self, css: &str, element: FakeElement) -> Self {
        self.elements.insert(css.to_string(), element);
        self
    }

    pub fn on_page(mut self, path: &str, effects: Vec<Effect>) -> Self {
        self.page_rules.insert(path.to_string(), effects);
        self
    }

    pub fn on_click(mut self, css: &str, effects: Vec<Effect>) -> Self {
        self.click_rules.insert(css.to_string(), effects);
        self
    }

    pub fn on_fill(mut self, css: &str, effects: Vec<Effect>) -> Self {
        self.fill_rules.insert(css.to_string(), effects);
        self
    }

    pub fn on_submit(mut self, css: &str, effects: Vec<Effect>) -> Self {
        self.submit_rules.insert(css.to_string(), effects);
        self
    }

    pub fn failing_on(mut self, command: &'static str) -> Self {
        self.failing.insert(command);
        self
    }

    /// Log an exchange as if the page had made a request.
    pub fn push_exchange(&mut self, method: &str, path: &str, status: u16) {
        let index = self.exchanges.len();
        self.exchanges.push(NetworkExchange {
            index,
            method: method.to_string(),
            url: format!("{}{}", ORIGIN, path),
            status,
        });
    }

    fn check(&self, command: &'static str) -> SuiteResult<()> {
        if self.failing.contains(command) {
            return Err(SuiteError::SessionProtocol {
                command: command.into(),
                error: "scripted failure".into(),
            });
        }
        Ok(())
    }

    fn key(selector: &Selector) -> (String, bool) {
        match selector.css.strip_suffix(":visible") {
            Some(css) => (css.to_string(), true),
            None => (selector.css.clone(), false),
        }
    }

    fn find(&self, selector: &Selector) -> Option<&FakeElement> {
        let (css, visible_only) = Self::key(selector);
        self.elements
            .get(&css)
            .filter(|e| !visible_only || e.visible)
            .filter(|e| match &selector.has_text {
                Some(t) => e.text.as_deref().is_some_and(|text| text.contains(t.as_str())),
                None => true,
            })
    }

    fn find_mut(&mut self, selector: &Selector) -> Option<&mut FakeElement> {
        let (css, visible_only) = Self::key(selector);
        self.elements
            .get_mut(&css)
            .filter(|e| !visible_only || e.visible)
    }

    fn load(&mut self, url: &str) {
        self.url = url.to_string();
        self.visits.push(url.to_string());
        self.elements.clear();
        self.texts.clear();

        let path = url
            .strip_prefix(ORIGIN)
            .unwrap_or(url)
            .split('?')
            .next()
            .unwrap_or("")
            .to_string();
        if let Some(effects) = self.page_rules.get(&path).cloned() {
            self.apply(effects);
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Exchange {
                    method,
                    path,
                    status,
                } => self.push_exchange(method, &path, status),
                Effect::Show(css, element) => {
                    self.elements.insert(css, element);
                }
                Effect::Remove(css) => {
                    self.elements.remove(&css);
                }
                Effect::SetText(css, text) => {
                    if let Some(e) = self.elements.get_mut(&css) {
                        e.text = Some(text);
                    }
                }
                Effect::GoTo(path) => self.load(&format!("{}{}", ORIGIN, path)),
                Effect::ShowText(text) => self.texts.push(text),
                Effect::SetStorage(state) => self.storage = state,
                Effect::AddToCart(quantity_css) => {
                    let quantity = self
                        .elements
                        .get(&quantity_css)
                        .and_then(|e| e.value.as_deref())
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(1);
                    self.cart_quantity += quantity;
                }
                Effect::RenderCart => {
                    if self.cart_quantity > 0 {
                        self.elements.insert(
                            r#"[data-test="remove-all-button"]"#.into(),
                            FakeElement::text("Remove All"),
                        );
                        self.elements.insert(
                            r#"[data-test="item-quantity"]"#.into(),
                            FakeElement::input(&self.cart_quantity.to_string()),
                        );
                        let item = self.cart_item.clone();
                        self.elements
                            .insert(r#"[data-test="item-number"]"#.into(), FakeElement::text(&item));
                    } else {
                        self.texts.push("Your cart is empty".into());
                    }
                }
                Effect::ClearCart => {
                    self.cart_quantity = 0;
                    self.elements.remove(r#"[data-test="remove-all-button"]"#);
                    self.elements.remove(r#"[data-test="remove-all-items"]"#);
                    self.elements.remove(r#"[data-test="item-quantity"]"#);
                    self.elements.remove(r#"[data-test="item-number"]"#);
                    self.texts.push("Your cart is empty".into());
                }
                Effect::Reprice {
                    price_css,
                    quantity_css,
                    unit_cents,
                } => {
                    let quantity = self
                        .elements
                        .get(&quantity_css)
                        .and_then(|e| e.value.as_deref())
                        .and_then(|v| v.parse::<i64>().ok())
                        .unwrap_or(1);
                    let cents = unit_cents * quantity;
                    let text = format!("${}.{:02}", cents / 100, cents % 100);
                    if let Some(e) = self.elements.get_mut(&price_css) {
                        e.text = Some(text);
                    }
                }
                Effect::CapQuantity {
                    quantity_css,
                    available,
                } => {
                    let requested = self
                        .elements
                        .get(&quantity_css)
                        .and_then(|e| e.value.as_deref())
                        .and_then(|v| v.parse::<u32>().ok())
                        .unwrap_or(0);
                    if requested > available {
                        self.texts.push("Requested Quantity More than Available".into());
                        self.elements.insert(
                            r#"[data-test="available-quantity"]"#.into(),
                            FakeElement::text(&format!("Available: {}", available)),
                        );
                        self.elements.insert(
                            r#"[data-test="modal-button"]"#.into(),
                            FakeElement::text("Yes"),
                        );
                        if let Some(e) = self.elements.get_mut(&quantity_css) {
                            e.value = Some(available.to_string());
                        }
                    }
                }
            }
        }
    }
}

impl Browser for FakeBrowser {
    fn navigate(&mut self, url: &str) -> SuiteResult<()> {
        self.check("navigate")?;
        self.load(url);
        Ok(())
    }

    fn current_url(&mut self) -> SuiteResult<String> {
        self.check("current_url")?;
        Ok(self.url.clone())
    }

    fn click(&mut self, target: &Selector) -> SuiteResult<()> {
        self.check("click")?;
        let visible = self.find(target).is_some_and(|e| e.visible);
        if !visible {
            return Err(SuiteError::SessionProtocol {
                command: "click".into(),
                error: format!("no visible element for {}", target),
            });
        }
        let (css, _) = Self::key(target);
        self.clicks.push(css.clone());
        if let Some(effects) = self.click_rules.get(&css).cloned() {
            self.apply(effects);
        }
        Ok(())
    }

    fn fill(&mut self, target: &Selector, value: &str, submit: bool) -> SuiteResult<()> {
        self.check("fill")?;
        let element = self.find_mut(target).ok_or_else(|| SuiteError::SessionProtocol {
            command: "fill".into(),
            error: format!("no element for {}", target),
        })?;
        element.value = Some(value.to_string());

        let (css, _) = Self::key(target);
        self.fills.push((css.clone(), value.to_string()));
        if let Some(effects) = self.fill_rules.get(&css).cloned() {
            self.apply(effects);
        }
        if submit {
            if let Some(effects) = self.submit_rules.get(&css).cloned() {
                self.apply(effects);
            }
        }
        Ok(())
    }

    fn set_value(&mut self, target: &Selector, value: &str, events: &[DomEvent]) -> SuiteResult<()> {
        self.check("set_value")?;
        let element = self.find_mut(target).ok_or_else(|| SuiteError::SessionProtocol {
            command: "set_value".into(),
            error: format!("no element for {}", target),
        })?;
        element.value = Some(value.to_string());

        let (css, _) = Self::key(target);
        self.dispatched
            .push((css.clone(), value.to_string(), events.to_vec()));
        if events.contains(&DomEvent::Change) {
            if let Some(effects) = self.fill_rules.get(&css).cloned() {
                self.apply(effects);
            }
        }
        Ok(())
    }

    fn query_text(&mut self, target: &Selector) -> SuiteResult<Option<String>> {
        self.check("query_text")?;
        Ok(self.find(target).and_then(|e| e.text.clone()))
    }

    fn query_value(&mut self, target: &Selector) -> SuiteResult<Option<String>> {
        self.check("query_value")?;
        Ok(self.find(target).and_then(|e| e.value.clone()))
    }

    fn query_visible(&mut self, target: &Selector) -> SuiteResult<bool> {
        self.check("query_visible")?;
        Ok(self.find(target).is_some_and(|e| e.visible))
    }

    fn query_enabled(&mut self, target: &Selector) -> SuiteResult<Option<bool>> {
        self.check("query_enabled")?;
        Ok(self.find(target).map(|e| e.enabled))
    }

    fn query_count(&mut self, target: &Selector) -> SuiteResult<u32> {
        self.check("query_count")?;
        Ok(u32::from(self.find(target).is_some()))
    }

    fn text_visible(&mut self, text: &str) -> SuiteResult<bool> {
        self.check("text_visible")?;
        let in_texts = self.texts.iter().any(|t| t.contains(text));
        let in_elements = self
            .elements
            .values()
            .any(|e| e.visible && e.text.as_deref().is_some_and(|t| t.contains(text)));
        Ok(in_texts || in_elements)
    }

    fn network_log(&mut self, since: usize) -> SuiteResult<Vec<NetworkExchange>> {
        self.check("network")?;
        Ok(self.exchanges.iter().skip(since).cloned().collect())
    }

    fn network_cursor(&mut self) -> SuiteResult<usize> {
        self.check("network_cursor")?;
        Ok(self.exchanges.len())
    }

    fn storage_state(&mut self) -> SuiteResult<Value> {
        self.check("storage_state")?;
        Ok(self.storage.clone())
    }

    fn restore_storage_state(&mut self, state: &Value) -> SuiteResult<()> {
        self.check("restore_storage")?;
        self.storage = state.clone();
        self.restored.push(state.clone());
        Ok(())
    }

    fn reset(&mut self) -> SuiteResult<()> {
        self.check("reset")?;
        self.url = "about:blank".into();
        self.elements.clear();
        self.texts.clear();
        self.exchanges.clear();
        self.storage = Value::Null;
        self.resets += 1;
        Ok(())
    }

    fn screenshot(&mut self, path: &str) -> SuiteResult<()> {
        self.check("screenshot")?;
        self.screenshots.push(path.to_string());
        Ok(())
    }
}
