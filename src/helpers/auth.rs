use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use sha1::{Digest, Sha1};
use tracing::{debug, info};

use crate::browser::driver::Browser;
use crate::browser::network::{AwaitedExchange, RoutePattern};
use crate::browser::selector::Selector;
use crate::browser::wait::wait_visible;
use crate::cli::config::CredentialsConfig;
use crate::error::{SuiteError, SuiteResult};
use crate::settings::RunSettings;

// ============================================================================
// Credentials
// ============================================================================

/// Storefront login. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read both values from the environment variables named in config.
    pub fn from_env(config: &CredentialsConfig) -> SuiteResult<Self> {
        Self::from_lookup(&config.username_env, &config.password_env, |name| {
            std::env::var(name).ok()
        })
    }

    /// Resolve through `lookup`; an unset or blank value is a configuration error.
    pub fn from_lookup(
        username_var: &str,
        password_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> SuiteResult<Self> {
        let read = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| SuiteError::MissingCredential {
                    name: name.to_string(),
                })
        };
        Ok(Self::new(read(username_var)?, read(password_var)?))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// Login flow
// ============================================================================

/// Browser state of a logged-in user, exportable into a fresh context.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedSession {
    /// Fingerprint of storefront origin + username
    pub identity: String,
    pub username: String,
    pub storage: Value,
}

pub fn login_route() -> RoutePattern {
    RoutePattern::post("**/login**")
}

/// SHA-1 of origin and username; keys the session cache without holding
/// anything secret.
pub fn session_fingerprint(origin: &str, username: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(origin.as_bytes());
    hasher.update(b"\n");
    hasher.update(username.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Log in through the account form and require the login exchange to
/// return 200.
pub fn authenticate(
    browser: &mut dyn Browser,
    settings: &RunSettings,
    credentials: &Credentials,
) -> SuiteResult<AuthenticatedSession> {
    let timeouts = &settings.timeouts;
    info!(username = %credentials.username(), "logging in");

    let pending = AwaitedExchange::expecting(login_route(), 200).begin(browser)?;

    browser.navigate(&settings.url("/")?)?;
    browser.click(&Selector::test_id("Account"))?;

    let username = Selector::test_id("username");
    wait_visible(browser, &timeouts.assert, &username)?;
    browser.fill(&username, credentials.username(), false)?;

    let password = Selector::test_id("password");
    wait_visible(browser, &timeouts.assert, &password)?;
    browser.fill(&password, credentials.password(), false)?;

    browser.click(&Selector::test_id("log-in"))?;
    pending.finish(browser, &timeouts.exchange)?;

    let storage = browser.storage_state()?;
    debug!(username = %credentials.username(), "login exchange succeeded");

    Ok(AuthenticatedSession {
        identity: session_fingerprint(&settings.origin(), credentials.username()),
        username: credentials.username().to_string(),
        storage,
    })
}

// ============================================================================
// Session cache
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Cached,
    Fresh,
}

/// Authenticated sessions shared across the scenarios of one run.
///
/// Filled lazily on the first login per identity; a hit restores the stored
/// browser state instead of logging in again. Dropped with the run.
///
/// Two runners missing on the same identity at once both log in, and the
/// later session replaces the earlier one.
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: Mutex<HashMap<String, Arc<AuthenticatedSession>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_authenticate(
        &self,
        browser: &mut dyn Browser,
        settings: &RunSettings,
        credentials: &Credentials,
    ) -> SuiteResult<(Arc<AuthenticatedSession>, SessionSource)> {
        let identity = session_fingerprint(&settings.origin(), credentials.username());

        // The lock is never held across browser work.
        if let Some(session) = self.get(&identity) {
            debug!(username = %session.username, "restoring cached session");
            browser.restore_storage_state(&session.storage)?;
            return Ok((session, SessionSource::Cached));
        }

        let session = self.store(authenticate(browser, settings, credentials)?);
        Ok((session, SessionSource::Fresh))
    }

    /// Insert or replace the session for its identity.
    pub fn store(&self, session: AuthenticatedSession) -> Arc<AuthenticatedSession> {
        let session = Arc::new(session);
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.identity.clone(), Arc::clone(&session));
        session
    }

    pub fn get(&self, identity: &str) -> Option<Arc<AuthenticatedSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
