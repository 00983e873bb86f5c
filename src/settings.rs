use std::path::PathBuf;

use reqwest::Url;

use crate::browser::wait::Waiter;
use crate::cli::config::{AppConfig, TimeoutConfig};
use crate::error::{SuiteError, SuiteResult};

/// One waiter per kind of synchronization point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub assert: Waiter,
    pub exchange: Waiter,
    pub navigation: Waiter,
}

impl Timeouts {
    pub fn from_config(config: &TimeoutConfig) -> Self {
        let poll = config.poll_interval_ms;
        Self {
            assert: Waiter::from_millis(config.assert_ms, poll),
            exchange: Waiter::from_millis(config.exchange_ms, poll),
            navigation: Waiter::from_millis(config.navigation_ms, poll),
        }
    }

    /// The same waiter for everything; handy for tests and fakes.
    pub fn uniform(waiter: Waiter) -> Self {
        Self {
            assert: waiter,
            exchange: waiter,
            navigation: waiter,
        }
    }
}

/// Resolved, validated settings a scenario run needs.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub storefront: Url,
    pub timeouts: Timeouts,
    pub screenshots_dir: Option<PathBuf>,
}

impl RunSettings {
    pub fn new(storefront: &str, timeouts: Timeouts) -> SuiteResult<Self> {
        let storefront = Url::parse(storefront).map_err(|e| {
            SuiteError::Config(format!("invalid storefront URL '{}': {}", storefront, e))
        })?;
        Ok(Self {
            storefront,
            timeouts,
            screenshots_dir: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> SuiteResult<Self> {
        let mut settings = Self::new(
            &config.storefront.base_url,
            Timeouts::from_config(&config.timeouts),
        )?;
        settings.screenshots_dir = config.run.screenshots_dir.as_ref().map(PathBuf::from);
        Ok(settings)
    }

    /// Absolute storefront URL for `path`.
    pub fn url(&self, path: &str) -> SuiteResult<String> {
        self.storefront
            .join(path)
            .map(|u| u.to_string())
            .map_err(|e| SuiteError::Config(format!("cannot resolve path '{}': {}", path, e)))
    }

    /// Absolute storefront URL for `path` with encoded query parameters.
    pub fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> SuiteResult<String> {
        let mut url = self
            .storefront
            .join(path)
            .map_err(|e| SuiteError::Config(format!("cannot resolve path '{}': {}", path, e)))?;
        url.query_pairs_mut().extend_pairs(query);
        Ok(url.to_string())
    }

    /// Origin used to key cached sessions, e.g. `https://www.stuller.com`.
    pub fn origin(&self) -> String {
        self.storefront.origin().ascii_serialization()
    }
}
