use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::backend::client::ProductLookup;
use crate::browser::driver::{Browser, DomEvent};
use crate::browser::network::{ExchangeWatch, expect_status, with_exchange};
use crate::browser::selector::Selector;
use crate::browser::wait::{wait_actionable, wait_for_location, wait_value};
use crate::error::{SuiteError, SuiteResult};
use crate::helpers::auth::{Credentials, SessionCache, authenticate};
use crate::helpers::cart::empty_cart;
use crate::helpers::navigation::{open_cart, open_search_results, search_and_open};
use crate::reconcile::money::Money;
use crate::reconcile::{RenderedField, reconcile};
use crate::scenario::context::ScenarioContext;
use crate::scenario::scenario_model::{
    Check, CheckResult, Cleanup, CleanupReport, FailedStep, ReadKind, ScenarioResult,
    ScenarioSpec, SessionMode, Step,
};
use crate::settings::RunSettings;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{StepEvent, StepStatus};

/// Why a scenario stopped before its last step.
struct Halt {
    failed: FailedStep,
    error: Option<String>,
}

/// Executes scenarios against a browser, one at a time.
///
/// Everything shared between scenarios (settings, credentials, the session
/// cache, the product API) is borrowed; per-scenario state lives in a
/// `ScenarioContext` that is dropped when the scenario ends.
pub struct ScenarioRunner<'a> {
    settings: &'a RunSettings,
    credentials: &'a Credentials,
    sessions: &'a SessionCache,
    products: &'a dyn ProductLookup,
    tracer: Option<&'a TraceLogger>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(
        settings: &'a RunSettings,
        credentials: &'a Credentials,
        sessions: &'a SessionCache,
        products: &'a dyn ProductLookup,
    ) -> Self {
        Self {
            settings,
            credentials,
            sessions,
            products,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: &'a TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Run one scenario. Failures never escape: they are reported in the
    /// returned `ScenarioResult`, and cleanup runs regardless.
    pub fn run(&self, spec: &ScenarioSpec, browser: &mut dyn Browser) -> ScenarioResult {
        let started = Instant::now();
        let mut ctx = ScenarioContext::new();
        info!(scenario = %spec.name, "scenario started");

        let halt = self.execute(spec, browser, &mut ctx).err();
        let steps_run = match &halt {
            Some(Halt { failed: FailedStep { index: Some(i), .. }, .. }) => i + 1,
            Some(_) => 0,
            None => spec.steps.len(),
        };

        if halt.is_some() {
            self.capture_screenshot(spec, browser);
        }

        let cleanup = self.cleanup(spec, browser);
        let cleanup_ok = !matches!(cleanup, CleanupReport::Failed(_));

        let (failed_step, error) = match halt {
            Some(h) => (Some(h.failed), h.error),
            None => (None, None),
        };
        let passed = failed_step.is_none() && ctx.all_passed() && cleanup_ok;

        if passed {
            info!(scenario = %spec.name, checks = ctx.pass_count(), "scenario passed");
        } else {
            warn!(
                scenario = %spec.name,
                failed_checks = ctx.fail_count(),
                error = error.as_deref().unwrap_or(""),
                "scenario failed"
            );
        }

        ScenarioResult {
            scenario_name: spec.name.clone(),
            passed,
            steps_run,
            failed_step,
            check_results: ctx.check_results,
            error,
            cleanup,
            duration_ms: started.elapsed().as_millis(),
        }
    }

    fn execute(
        &self,
        spec: &ScenarioSpec,
        browser: &mut dyn Browser,
        ctx: &mut ScenarioContext,
    ) -> Result<(), Halt> {
        self.setup_phase(spec, "reset browser", || browser.reset())?;

        if let Some(pre) = &spec.precondition {
            let record = self.setup_phase(spec, &format!("fetch product {}", pre.product), || {
                self.products.fetch_product(&pre.product)
            })?;
            ctx.record = Some(record);
        }

        match spec.session {
            SessionMode::Cached => {
                self.setup_phase(spec, "restore session", || {
                    self.sessions
                        .get_or_authenticate(browser, self.settings, self.credentials)
                        .map(|_| ())
                })?;
            }
            SessionMode::Fresh => {
                self.setup_phase(spec, "log in", || {
                    let session = authenticate(browser, self.settings, self.credentials)?;
                    self.sessions.store(session);
                    Ok(())
                })?;
            }
            SessionMode::Anonymous => {}
        }

        for (i, step) in spec.steps.iter().enumerate() {
            let label = step.label();
            info!(scenario = %spec.name, step = i, %label, "step");
            let step_started = Instant::now();
            let checks_before = ctx.check_results.len();

            let result = self.execute_step(step, i, browser, ctx);
            let elapsed = step_started.elapsed().as_millis();

            let halt = match result {
                Err(e) => {
                    self.trace(
                        StepEvent::now(&spec.name, Some(i), &label)
                            .with_status(StepStatus::Errored)
                            .with_duration(elapsed)
                            .with_detail(&e),
                    );
                    Some(Some(format!("Step {} failed: {}", i, e)))
                }
                Ok(()) => {
                    let failures: Vec<String> = ctx.check_results[checks_before..]
                        .iter()
                        .filter(|r| !r.passed)
                        .map(|r| {
                            r.message
                                .clone()
                                .unwrap_or_else(|| format!("{} failed", r.check.name()))
                        })
                        .collect();
                    if failures.is_empty() {
                        self.trace(
                            StepEvent::now(&spec.name, Some(i), &label).with_duration(elapsed),
                        );
                        None
                    } else {
                        self.trace(
                            StepEvent::now(&spec.name, Some(i), &label)
                                .with_status(StepStatus::Failed)
                                .with_duration(elapsed)
                                .with_detail(failures.join("; ")),
                        );
                        Some(None)
                    }
                }
            };

            if let Some(error) = halt {
                return Err(Halt {
                    failed: FailedStep {
                        index: Some(i),
                        label,
                    },
                    error,
                });
            }
        }

        Ok(())
    }

    /// Run a setup action; on error, halt before the first step.
    fn setup_phase<T>(
        &self,
        spec: &ScenarioSpec,
        label: &str,
        action: impl FnOnce() -> SuiteResult<T>,
    ) -> Result<T, Halt> {
        let started = Instant::now();
        match action() {
            Ok(value) => {
                self.trace(
                    StepEvent::now(&spec.name, None, label)
                        .with_duration(started.elapsed().as_millis()),
                );
                Ok(value)
            }
            Err(e) => {
                self.trace(
                    StepEvent::now(&spec.name, None, label)
                        .with_status(StepStatus::Errored)
                        .with_duration(started.elapsed().as_millis())
                        .with_detail(&e),
                );
                Err(Halt {
                    failed: FailedStep {
                        index: None,
                        label: label.to_string(),
                    },
                    error: Some(format!("{} failed: {}", label, e)),
                })
            }
        }
    }

    /// Execute a single step.
    fn execute_step(
        &self,
        step: &Step,
        step_index: usize,
        browser: &mut dyn Browser,
        ctx: &mut ScenarioContext,
    ) -> SuiteResult<()> {
        let timeouts = &self.settings.timeouts;

        match step {
            Step::SearchAndOpen { query } => {
                search_and_open(browser, self.settings, query)?;
                Ok(())
            }

            Step::OpenSearchResults { query } => {
                open_search_results(browser, self.settings, query)?;
                Ok(())
            }

            Step::Visit {
                path,
                await_exchange,
                expect_location,
            } => {
                let url = self.settings.url(path)?;
                with_exchange(browser, await_exchange.as_ref(), &timeouts.exchange, |b| {
                    b.navigate(&url)
                })?;
                if let Some(fragment) = expect_location {
                    wait_for_location(browser, &timeouts.navigation, fragment)?;
                }
                Ok(())
            }

            Step::Click {
                target,
                await_exchange,
            } => {
                wait_actionable(browser, &timeouts.assert, target)?;
                with_exchange(browser, await_exchange.as_ref(), &timeouts.exchange, |b| {
                    b.click(target)
                })
            }

            Step::SetQuantity {
                target,
                value,
                await_exchange,
            } => {
                wait_actionable(browser, &timeouts.assert, target)?;
                with_exchange(browser, await_exchange.as_ref(), &timeouts.exchange, |b| {
                    b.fill(target, value, false)?;
                    wait_value(b, &timeouts.assert, target, value)
                })
            }

            Step::ForceQuantity {
                target,
                value,
                await_exchange,
            } => {
                wait_actionable(browser, &timeouts.assert, target)?;
                with_exchange(browser, await_exchange.as_ref(), &timeouts.exchange, |b| {
                    b.fill(target, "", false)?;
                    b.set_value(target, value, &[DomEvent::Input, DomEvent::Change])?;
                    wait_value(b, &timeouts.assert, target, value)
                })
            }

            Step::SetInstructions { target, text } => {
                wait_actionable(browser, &timeouts.assert, target)?;
                browser.set_value(
                    target,
                    text,
                    &[DomEvent::Input, DomEvent::Change, DomEvent::Blur],
                )
            }

            Step::Capture {
                alias,
                target,
                read,
                transform,
            } => {
                let raw = timeouts.assert.until(&format!("{} to be readable", target), || {
                    let value = read_target(browser, target, *read)?;
                    Ok(value.filter(|v| !v.trim().is_empty()))
                })?;
                let value = transform.apply(&raw);
                info!(%alias, %value, "captured");
                ctx.capture(alias, value);
                Ok(())
            }

            Step::Watch { alias, route } => {
                let watch = ExchangeWatch::register(browser, route)?;
                ctx.add_watch(alias, watch);
                Ok(())
            }

            Step::Await { alias, status } => {
                let watch = ctx.take_watch(alias).ok_or_else(|| {
                    SuiteError::Config(format!("no watch registered as '{}'", alias))
                })?;
                let exchange = watch.wait(browser, &timeouts.exchange)?;
                if let Some(expected) = status {
                    expect_status(&exchange, watch.route(), *expected)?;
                }
                Ok(())
            }

            Step::Assert { checks } => {
                for check in checks {
                    let result = timeouts.assert.retry(
                        || evaluate_check(check, step_index, browser, ctx),
                        |r| r.passed,
                    );
                    let passed = result.passed;
                    ctx.record_check(result);
                    if !passed {
                        break;
                    }
                }
                Ok(())
            }
        }
    }

    fn capture_screenshot(&self, spec: &ScenarioSpec, browser: &mut dyn Browser) {
        let Some(dir) = &self.settings.screenshots_dir else {
            return;
        };
        if let Err(e) = fs::create_dir_all(dir) {
            warn!(dir = %dir.display(), error = %e, "cannot create screenshot directory");
            return;
        }
        let path = screenshot_path(dir, &spec.name);
        match browser.screenshot(&path.to_string_lossy()) {
            Ok(()) => info!(path = %path.display(), "failure screenshot saved"),
            Err(e) => warn!(error = %e, "failure screenshot not taken"),
        }
    }

    fn cleanup(&self, spec: &ScenarioSpec, browser: &mut dyn Browser) -> CleanupReport {
        if spec.cleanup == Cleanup::None {
            return CleanupReport::Skipped;
        }

        let started = Instant::now();
        let result = open_cart(browser, self.settings).and_then(|_| empty_cart(browser, self.settings));
        let event = StepEvent::now(&spec.name, None, "empty cart")
            .with_duration(started.elapsed().as_millis());

        match result {
            Ok(outcome) => {
                self.trace(event.with_detail(outcome));
                CleanupReport::Done(outcome)
            }
            Err(e) => {
                warn!(scenario = %spec.name, error = %e, "cart cleanup failed");
                self.trace(event.with_status(StepStatus::Errored).with_detail(&e));
                CleanupReport::Failed(e.to_string())
            }
        }
    }

    fn trace(&self, event: StepEvent) {
        if let Some(tracer) = self.tracer {
            tracer.log(&event);
        }
    }
}

/// `<dir>/<scenario name with unsafe characters replaced>.png`
pub fn screenshot_path(dir: &Path, scenario: &str) -> PathBuf {
    dir.join(format!("{}.png", sanitize_filename(scenario)))
}

pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn read_target(
    browser: &mut dyn Browser,
    target: &Selector,
    read: ReadKind,
) -> SuiteResult<Option<String>> {
    match read {
        ReadKind::Text => browser.query_text(target),
        ReadKind::Value => browser.query_value(target),
    }
}

/// Evaluate a single check against the current page. Driver errors become
/// failed checks rather than aborting the step.
fn evaluate_check(
    check: &Check,
    step_index: usize,
    browser: &mut dyn Browser,
    ctx: &ScenarioContext,
) -> CheckResult {
    let result = |passed: bool, actual: Option<String>, message: String| CheckResult {
        step_index,
        check: check.clone(),
        passed,
        actual,
        message: if passed { None } else { Some(message) },
        outcome: None,
    };
    let failed_query = |what: &str, e: SuiteError| CheckResult {
        step_index,
        check: check.clone(),
        passed: false,
        actual: None,
        message: Some(format!("Failed to query {}: {}", what, e)),
        outcome: None,
    };

    match check {
        Check::Reconcile {
            target,
            read,
            expected,
            policy,
        } => match read_target(browser, target, *read) {
            Ok(raw) => {
                let expected_value = ctx.resolve_expected(expected);
                let outcome = reconcile(&expected_value, &RenderedField::from(raw.clone()), policy);
                CheckResult {
                    step_index,
                    check: check.clone(),
                    passed: outcome.passed,
                    actual: raw,
                    message: if outcome.passed {
                        None
                    } else {
                        Some(format!("{}: {}", target, outcome))
                    },
                    outcome: Some(outcome),
                }
            }
            Err(e) => failed_query("element text", e),
        },

        Check::Visible { target } => match browser.query_visible(target) {
            Ok(visible) => result(
                visible,
                Some(visible.to_string()),
                format!("Element '{}' is not visible", target),
            ),
            Err(e) => failed_query("element visibility", e),
        },

        Check::Hidden { target } => match browser.query_visible(target) {
            Ok(visible) => result(
                !visible,
                Some(visible.to_string()),
                format!("Element '{}' is visible but should be hidden", target),
            ),
            Err(e) => failed_query("element visibility", e),
        },

        Check::Enabled { target } => match browser.query_enabled(target) {
            Ok(Some(enabled)) => result(
                enabled,
                Some(enabled.to_string()),
                format!("Element '{}' is disabled", target),
            ),
            Ok(None) => result(false, None, format!("Element '{}' not found on page", target)),
            Err(e) => failed_query("element state", e),
        },

        Check::TextVisible { text } => match browser.text_visible(text) {
            Ok(visible) => result(
                visible,
                Some(visible.to_string()),
                format!("Text '{}' is not visible on page", text),
            ),
            Err(e) => failed_query("page text", e),
        },

        Check::NotEmpty { target } => match browser.query_text(target) {
            Ok(Some(text)) => {
                let passed = !text.trim().is_empty();
                result(passed, Some(text), format!("Element '{}' has no text", target))
            }
            Ok(None) => result(false, None, format!("Element '{}' not found on page", target)),
            Err(e) => failed_query("element text", e),
        },

        Check::PositiveMoney { target } => match browser.query_text(target) {
            Ok(Some(text)) => match Money::parse_rendered(&text) {
                Ok(amount) => result(
                    amount.is_positive(),
                    Some(text),
                    format!("Element '{}' shows {} which is not positive", target, amount),
                ),
                Err(e) => result(
                    false,
                    Some(text.clone()),
                    format!("Element '{}' text '{}' is not money: {}", target, text, e),
                ),
            },
            Ok(None) => result(false, None, format!("Element '{}' not found on page", target)),
            Err(e) => failed_query("element text", e),
        },

        Check::LocationContains { fragment } => match browser.current_url() {
            Ok(url) => {
                let passed = url.contains(fragment.as_str());
                result(passed, Some(url), format!("URL does not contain '{}'", fragment))
            }
            Err(e) => failed_query("URL", e),
        },
    }
}
