use std::collections::HashMap;

use serde_json::json;
use storefront_e2e::backend::client::ProductLookup;
use storefront_e2e::backend::product::{Price, ProductRecord};
use storefront_e2e::browser::wait::Waiter;
use storefront_e2e::error::{SuiteError, SuiteResult};
use storefront_e2e::helpers::auth::Credentials;
use storefront_e2e::settings::{RunSettings, Timeouts};

use super::fake_browser::{Effect, FakeBrowser, FakeElement, ORIGIN};

pub const SKU: &str = "4196:4677:P";
pub const PRODUCT_PATH: &str = "/products/4196-4677-P";
pub const UNIT_PRICE_CENTS: i64 = 1250;

pub const SEARCH_INPUT: &str = r#"[data-test="search-input"]"#;
pub const QUANTITY: &str = r#"[data-test="quantity"]"#;
pub const MAIN_PRICE: &str = r#"[data-test="main-price-container"]"#;
pub const ADD_TO_CART: &str = r#"[data-test="add-to-cart"]"#;

pub fn fast_settings() -> RunSettings {
    RunSettings::new(ORIGIN, Timeouts::uniform(Waiter::from_millis(200, 5)))
        .expect("valid test origin")
}

pub fn credentials() -> Credentials {
    Credentials::new("buyer@example.com", "hunter2")
}

pub fn product_record() -> ProductRecord {
    ProductRecord {
        sku: SKU.into(),
        status: "In Stock".into(),
        description: "14K Yellow Gold Ring Mounting".into(),
        price: Price { value: 1234.5 },
    }
}

fn show(css: &str, element: FakeElement) -> Effect {
    Effect::Show(css.to_string(), element)
}

fn exchange(method: &'static str, path: &str, status: u16) -> Effect {
    Effect::Exchange {
        method,
        path: path.to_string(),
        status,
    }
}

/// A storefront with home, login, search, a product page, price recompute,
/// add-to-cart and a cart page that can be emptied.
pub fn storefront() -> FakeBrowser {
    storefront_with_login_status(200)
}

pub fn storefront_with_login_status(login_status: u16) -> FakeBrowser {
    let mut browser = FakeBrowser::new()
        .on_page(
            "/",
            vec![
                show(SEARCH_INPUT, FakeElement::input("")),
                show(r#"[data-test="Account"]"#, FakeElement::text("Account")),
            ],
        )
        .on_click(
            r#"[data-test="Account"]"#,
            vec![
                show(r#"[data-test="username"]"#, FakeElement::input("")),
                show(r#"[data-test="password"]"#, FakeElement::input("")),
                show(r#"[data-test="log-in"]"#, FakeElement::text("Log In")),
            ],
        )
        .on_click(
            r#"[data-test="log-in"]"#,
            vec![
                exchange("POST", "/login", login_status),
                Effect::SetStorage(json!({ "cookies": [{ "name": "session", "value": "s-1" }] })),
            ],
        )
        .on_submit(SEARCH_INPUT, vec![Effect::GoTo(PRODUCT_PATH.into())])
        .on_page(
            "/search/results",
            vec![
                exchange("GET", "/search/results", 200),
                Effect::GoTo(PRODUCT_PATH.into()),
            ],
        )
        .on_page(
            PRODUCT_PATH,
            vec![
                show(r#"[data-test="item-number"]"#, FakeElement::text(SKU)),
                show(r#"[data-test="status-message"]"#, FakeElement::text("  In Stock\n")),
                show(".lblPrice > .mainPriceContainer", FakeElement::text("$1,234.50")),
                show(
                    ".productDescription",
                    FakeElement::text("  14K Yellow Gold Ring Mounting, polished finish  "),
                ),
                show(MAIN_PRICE, FakeElement::text("$12.50")),
                show(QUANTITY, FakeElement::input("1")),
                show(ADD_TO_CART, FakeElement::text("Add to Cart")),
                show(r#"[data-test="ship-date"]"#, FakeElement::text("Ships tomorrow")),
                show(
                    r#"[data-test="special-instructions-section"] textarea.form-control"#,
                    FakeElement::input(""),
                ),
            ],
        )
        .on_fill(
            QUANTITY,
            vec![
                Effect::Reprice {
                    price_css: MAIN_PRICE.into(),
                    quantity_css: QUANTITY.into(),
                    unit_cents: UNIT_PRICE_CENTS,
                },
                exchange("GET", "/api/price/quote", 200),
            ],
        )
        .on_click(
            ADD_TO_CART,
            vec![
                Effect::AddToCart(QUANTITY.into()),
                exchange("POST", "/api/addtocart/item", 200),
            ],
        )
        .on_page(
            "/cart",
            vec![exchange("GET", "/api/cart/items", 200), Effect::RenderCart],
        )
        .on_click(
            r#"[data-test="remove-all-button"]"#,
            vec![show(
                r#"[data-test="remove-all-items"]"#,
                FakeElement::text("Remove All Items"),
            )],
        )
        .on_click(r#"[data-test="remove-all-items"]"#, vec![Effect::ClearCart]);
    browser.cart_item = SKU.into();
    browser
}

/// `ProductLookup` over a fixed set of records.
#[derive(Default)]
pub struct StaticProducts {
    pub records: HashMap<String, ProductRecord>,
}

impl StaticProducts {
    pub fn with(record: ProductRecord) -> Self {
        let mut records = HashMap::new();
        records.insert(record.sku.clone(), record);
        Self { records }
    }
}

impl ProductLookup for StaticProducts {
    fn fetch_product(&self, sku: &str) -> SuiteResult<ProductRecord> {
        self.records
            .get(sku)
            .cloned()
            .ok_or_else(|| SuiteError::Backend(format!("no products returned for SKU '{}'", sku)))
    }
}
