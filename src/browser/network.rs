use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::driver::Browser;
use crate::browser::wait::Waiter;
use crate::error::{SuiteError, SuiteResult};

/// A completed request/response pair as logged by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkExchange {
    pub index: usize,
    pub method: String,
    pub url: String,
    pub status: u16,
}

/// Method plus URL glob, e.g. `POST **/addtocart/**`.
///
/// `**` matches any run of characters, `*` any run without `/`; every
/// other character is literal (including `?`, which appears in query strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub url: String,
}

impl RoutePattern {
    pub fn new(method: Option<&str>, url: &str) -> Self {
        Self {
            method: method.map(|m| m.to_uppercase()),
            url: url.to_string(),
        }
    }

    pub fn get(url: &str) -> Self {
        Self::new(Some("GET"), url)
    }

    pub fn post(url: &str) -> Self {
        Self::new(Some("POST"), url)
    }

    pub fn any(url: &str) -> Self {
        Self::new(None, url)
    }

    pub fn compile(&self) -> SuiteResult<CompiledRoute> {
        let regex = Regex::new(&glob_to_regex(&self.url)).map_err(|e| {
            SuiteError::Config(format!("invalid route pattern '{}': {}", self.url, e))
        })?;
        Ok(CompiledRoute {
            route: self.clone(),
            regex,
        })
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(m) => write!(f, "{} {}", m, self.url),
            None => write!(f, "{}", self.url),
        }
    }
}

pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut literal = String::new();
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '*' {
            literal.push(c);
            continue;
        }
        out.push_str(&regex::escape(&literal));
        literal.clear();
        if chars.peek() == Some(&'*') {
            while chars.peek() == Some(&'*') {
                chars.next();
            }
            out.push_str(".*");
        } else {
            out.push_str("[^/]*");
        }
    }

    out.push_str(&regex::escape(&literal));
    out.push('$');
    out
}

#[derive(Debug, Clone)]
pub struct CompiledRoute {
    route: RoutePattern,
    regex: Regex,
}

impl CompiledRoute {
    pub fn route(&self) -> &RoutePattern {
        &self.route
    }

    pub fn matches(&self, exchange: &NetworkExchange) -> bool {
        let method_ok = self
            .route
            .method
            .as_deref()
            .is_none_or(|m| m.eq_ignore_ascii_case(&exchange.method));
        method_ok && self.regex.is_match(&exchange.url)
    }
}

// ============================================================================
// Watches
// ============================================================================

/// Interest in a route, anchored at the network log position when registered.
/// Only exchanges completed after registration can satisfy it.
#[derive(Debug, Clone)]
pub struct ExchangeWatch {
    route: CompiledRoute,
    cursor: usize,
}

impl ExchangeWatch {
    pub fn register(browser: &mut dyn Browser, route: &RoutePattern) -> SuiteResult<Self> {
        let compiled = route.compile()?;
        let cursor = browser.network_cursor()?;
        debug!(route = %route, cursor, "watching exchange");
        Ok(Self {
            route: compiled,
            cursor,
        })
    }

    pub fn route(&self) -> &RoutePattern {
        self.route.route()
    }

    /// Block until a matching exchange completes.
    pub fn wait(&self, browser: &mut dyn Browser, waiter: &Waiter) -> SuiteResult<NetworkExchange> {
        let exchange = waiter.until(&format!("exchange {}", self.route()), || {
            let log = browser.network_log(self.cursor)?;
            Ok(log.into_iter().find(|e| self.route.matches(e)))
        })?;
        debug!(route = %self.route(), url = %exchange.url, status = exchange.status, "exchange completed");
        Ok(exchange)
    }
}

/// Fail unless the exchange finished with `expected`.
pub fn expect_status(
    exchange: &NetworkExchange,
    route: &RoutePattern,
    expected: u16,
) -> SuiteResult<()> {
    if exchange.status == expected {
        Ok(())
    } else {
        Err(SuiteError::UnexpectedStatus {
            exchange: format!("{} ({})", route, exchange.url),
            expected,
            actual: exchange.status,
        })
    }
}

/// An exchange a mutating step triggers and must wait for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwaitedExchange {
    pub route: RoutePattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl AwaitedExchange {
    pub fn new(route: RoutePattern) -> Self {
        Self {
            route,
            status: None,
        }
    }

    pub fn expecting(route: RoutePattern, status: u16) -> Self {
        Self {
            route,
            status: Some(status),
        }
    }

    /// Register the watch; call before the triggering action.
    pub fn begin(&self, browser: &mut dyn Browser) -> SuiteResult<PendingExchange> {
        Ok(PendingExchange {
            watch: ExchangeWatch::register(browser, &self.route)?,
            status: self.status,
        })
    }
}

pub struct PendingExchange {
    watch: ExchangeWatch,
    status: Option<u16>,
}

impl PendingExchange {
    pub fn finish(self, browser: &mut dyn Browser, waiter: &Waiter) -> SuiteResult<NetworkExchange> {
        let exchange = self.watch.wait(browser, waiter)?;
        if let Some(expected) = self.status {
            expect_status(&exchange, self.watch.route(), expected)?;
        }
        Ok(exchange)
    }
}

/// Begin an optional exchange, run `action`, then wait for it.
pub fn with_exchange<T>(
    browser: &mut dyn Browser,
    awaited: Option<&AwaitedExchange>,
    waiter: &Waiter,
    action: impl FnOnce(&mut dyn Browser) -> SuiteResult<T>,
) -> SuiteResult<T> {
    let pending = awaited.map(|a| a.begin(browser)).transpose()?;
    let value = action(browser)?;
    if let Some(p) = pending {
        p.finish(browser, waiter)?;
    }
    Ok(value)
}
