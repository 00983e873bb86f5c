use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::backend::product::{ProductRecord, ProductsResponse, first_product};
use crate::cli::config::ApiConfig;
use crate::error::{SuiteError, SuiteResult};
use crate::helpers::auth::Credentials;

/// Source of truth for product data.
pub trait ProductLookup {
    fn fetch_product(&self, sku: &str) -> SuiteResult<ProductRecord>;
}

/// Product lookup over the storefront's authenticated HTTP API.
pub struct HttpProductApi {
    client: Client,
    endpoint: Url,
    credentials: Credentials,
}

impl HttpProductApi {
    pub fn new(config: &ApiConfig, credentials: Credentials) -> SuiteResult<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            SuiteError::Config(format!("invalid api.base_url '{}': {}", config.base_url, e))
        })?;
        // Any path prefix on the base is kept.
        let joined = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.products_path.trim_start_matches('/')
        );
        let endpoint = Url::parse(&joined).map_err(|e| {
            SuiteError::Config(format!(
                "invalid api.products_path '{}': {}",
                config.products_path, e
            ))
        })?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            credentials,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ProductLookup for HttpProductApi {
    fn fetch_product(&self, sku: &str) -> SuiteResult<ProductRecord> {
        debug!(%sku, endpoint = %self.endpoint, "fetching product record");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("SKU", sku)])
            .basic_auth(self.credentials.username(), Some(self.credentials.password()))
            .send()?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(SuiteError::UnexpectedStatus {
                exchange: format!("GET {}", self.endpoint),
                expected: 200,
                actual: status,
            });
        }

        let body: ProductsResponse = response.json()?;
        let record = first_product(body, sku)?;
        info!(sku = %record.sku, status = %record.status, price = record.price.value, "product record fetched");
        Ok(record)
    }
}
