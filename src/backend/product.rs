use serde::{Deserialize, Serialize};

use crate::error::{SuiteError, SuiteResult};
use crate::reconcile::model::BackendValue;

/// A validated product as returned by the product-lookup exchange.
///
/// Fetched once before UI interaction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "SKU")]
    pub sku: String,

    #[serde(rename = "Status")]
    pub status: String,

    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Price")]
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(rename = "Value")]
    pub value: f64,
}

/// Record fields a scenario can compare against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Sku,
    Status,
    Description,
    Price,
}

impl ProductRecord {
    pub fn field(&self, field: RecordField) -> BackendValue {
        match field {
            RecordField::Sku => BackendValue::Text(self.sku.clone()),
            RecordField::Status => BackendValue::Text(self.status.clone()),
            RecordField::Description => BackendValue::Text(self.description.clone()),
            RecordField::Price => BackendValue::Decimal(self.price.value),
        }
    }
}

// ============================================================================
// Wire payload (every field optional until validated)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(rename = "Products", default)]
    pub products: Option<Vec<RawProduct>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawProduct {
    #[serde(rename = "SKU", default)]
    pub sku: Option<String>,
    #[serde(rename = "Status", default)]
    pub status: Option<String>,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<RawPrice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPrice {
    #[serde(rename = "Value", default)]
    pub value: Option<f64>,
}

fn require<T>(value: Option<T>, path: &str) -> SuiteResult<T> {
    value.ok_or_else(|| SuiteError::Backend(format!("product is missing '{}'", path)))
}

impl TryFrom<RawProduct> for ProductRecord {
    type Error = SuiteError;

    fn try_from(raw: RawProduct) -> SuiteResult<Self> {
        let price = require(raw.price, "Price")?;
        Ok(ProductRecord {
            sku: require(raw.sku, "SKU")?,
            status: require(raw.status, "Status")?,
            description: require(raw.description, "Description")?,
            price: Price {
                value: require(price.value, "Price.Value")?,
            },
        })
    }
}

/// Take the first product of a lookup response; the collection must be non-empty.
pub fn first_product(response: ProductsResponse, sku: &str) -> SuiteResult<ProductRecord> {
    let products = response
        .products
        .ok_or_else(|| SuiteError::Backend(format!("lookup for '{}' has no 'Products' field", sku)))?;
    let first = products
        .into_iter()
        .next()
        .ok_or_else(|| SuiteError::Backend(format!("lookup for '{}' returned no products", sku)))?;
    ProductRecord::try_from(first)
}
