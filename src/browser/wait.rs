use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::browser::driver::Browser;
use crate::browser::selector::Selector;
use crate::error::{SuiteError, SuiteResult};

/// Bounded polling for one kind of synchronization point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waiter {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn from_millis(timeout_ms: u64, poll_interval_ms: u64) -> Self {
        Self::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
        )
    }

    /// Poll `check` until it yields a value. Errors from `check` end the wait
    /// immediately; running out of time is a `SyncTimeout` naming `awaited`.
    pub fn until<T>(
        &self,
        awaited: &str,
        mut check: impl FnMut() -> SuiteResult<Option<T>>,
    ) -> SuiteResult<T> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(value) = check()? {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                debug!(%awaited, timeout_ms = self.timeout.as_millis() as u64, "wait timed out");
                return Err(SuiteError::SyncTimeout {
                    awaited: awaited.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                });
            }
            thread::sleep(self.poll_interval);
        }
    }

    /// Re-run `attempt` until `done` accepts its result or time runs out,
    /// returning the last result either way.
    pub fn retry<T>(&self, mut attempt: impl FnMut() -> T, done: impl Fn(&T) -> bool) -> T {
        let deadline = Instant::now() + self.timeout;
        loop {
            let result = attempt();
            if done(&result) || Instant::now() >= deadline {
                return result;
            }
            thread::sleep(self.poll_interval);
        }
    }
}

/// Wait until the location contains `fragment`; returns the full URL.
pub fn wait_for_location(
    browser: &mut dyn Browser,
    waiter: &Waiter,
    fragment: &str,
) -> SuiteResult<String> {
    waiter.until(&format!("location to include '{}'", fragment), || {
        let url = browser.current_url()?;
        Ok(url.contains(fragment).then_some(url))
    })
}

pub fn wait_visible(browser: &mut dyn Browser, waiter: &Waiter, target: &Selector) -> SuiteResult<()> {
    waiter.until(&format!("{} to be visible", target), || {
        Ok(browser.query_visible(target)?.then_some(()))
    })
}

/// Visible and enabled, the state a click needs.
pub fn wait_actionable(
    browser: &mut dyn Browser,
    waiter: &Waiter,
    target: &Selector,
) -> SuiteResult<()> {
    waiter.until(&format!("{} to be visible and enabled", target), || {
        let ready = browser.query_visible(target)? && browser.query_enabled(target)? == Some(true);
        Ok(ready.then_some(()))
    })
}

pub fn wait_text_visible(browser: &mut dyn Browser, waiter: &Waiter, text: &str) -> SuiteResult<()> {
    waiter.until(&format!("text \"{}\" to be visible", text), || {
        Ok(browser.text_visible(text)?.then_some(()))
    })
}

pub fn wait_value(
    browser: &mut dyn Browser,
    waiter: &Waiter,
    target: &Selector,
    expected: &str,
) -> SuiteResult<()> {
    waiter.until(&format!("{} to have value '{}'", target, expected), || {
        let value = browser.query_value(target)?;
        Ok((value.as_deref() == Some(expected)).then_some(()))
    })
}
