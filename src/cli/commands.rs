use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};

use crate::backend::client::{HttpProductApi, ProductLookup};
use crate::browser::session::BrowserSession;
use crate::cli::config::AppConfig;
use crate::error::{SuiteError, SuiteResult};
use crate::helpers::auth::{Credentials, SessionCache};
use crate::report::console::format_console_report;
use crate::report::json::generate_json_report;
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::{ReportFormat, SuiteReport};
use crate::scenario::runner::ScenarioRunner;
use crate::scenario::scenario_model::ScenarioSpec;
use crate::settings::RunSettings;
use crate::trace::logger::TraceLogger;

// ============================================================================
// run subcommand
// ============================================================================

/// Run scenarios and return whether all passed.
///
/// Credentials are resolved before anything touches the network or spawns
/// a browser, so a missing variable fails fast.
pub fn cmd_run(
    config: &AppConfig,
    scenarios: Option<&str>,
    only: &[String],
    tags: &[String],
    format: Option<&str>,
    output: Option<&str>,
) -> SuiteResult<bool> {
    let credentials = Credentials::from_env(&config.credentials)?;

    let format: ReportFormat = format
        .unwrap_or(&config.run.format)
        .parse()
        .map_err(SuiteError::Config)?;
    let output = output.or(config.run.output.as_deref());
    let scenario_path = scenarios.unwrap_or(&config.run.scenarios);

    let settings = RunSettings::from_config(config)?;
    let specs = filter_scenarios(load_scenarios(scenario_path)?, only, tags);

    if specs.is_empty() {
        warn!(path = %scenario_path, "no scenarios selected");
        return Ok(true);
    }
    info!(count = specs.len(), path = %scenario_path, "running scenarios");

    let products = HttpProductApi::new(&config.api, credentials.clone())?;
    let sessions = SessionCache::new();
    let tracer = config
        .run
        .trace_file
        .as_deref()
        .map(TraceLogger::new)
        .unwrap_or_else(TraceLogger::disabled);

    let mut browser = BrowserSession::launch(&config.browser, config.timeouts.navigation_ms)?;
    let runner = ScenarioRunner::new(&settings, &credentials, &sessions, &products)
        .with_tracer(&tracer);

    let start = Instant::now();
    let results: Vec<_> = specs
        .iter()
        .map(|spec| runner.run(spec, &mut browser))
        .collect();
    let duration = start.elapsed().as_millis();

    if let Err(e) = browser.quit() {
        warn!(error = %e, "browser did not shut down cleanly");
    }

    let report = SuiteReport::from_results(&suite_name(scenario_path), results)
        .with_duration(duration);
    let all_passed = report.all_passed();

    let output_content = render_report(&report, format)?;
    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

pub fn render_report(report: &SuiteReport, format: ReportFormat) -> SuiteResult<String> {
    Ok(match format {
        ReportFormat::Console => format_console_report(report),
        ReportFormat::Junit => generate_junit_xml(report),
        ReportFormat::Json => generate_json_report(report)?,
    })
}

fn suite_name(scenario_path: &str) -> String {
    Path::new(scenario_path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| scenario_path.to_string())
}

// ============================================================================
// list subcommand
// ============================================================================

pub fn cmd_list(config: &AppConfig, scenarios: Option<&str>) -> SuiteResult<()> {
    let scenario_path = scenarios.unwrap_or(&config.run.scenarios);
    let specs = load_scenarios(scenario_path)?;

    println!("{} scenarios in {}", specs.len(), scenario_path);
    for spec in &specs {
        let tags = if spec.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", spec.tags.join(", "))
        };
        println!("  - {} ({} steps){}", spec.name, spec.steps.len(), tags);
    }
    Ok(())
}

// ============================================================================
// lookup subcommand
// ============================================================================

pub fn cmd_lookup(config: &AppConfig, sku: &str) -> SuiteResult<()> {
    let credentials = Credentials::from_env(&config.credentials)?;
    let api = HttpProductApi::new(&config.api, credentials)?;
    let record = api.fetch_product(sku)?;

    let json = serde_json::to_string_pretty(&record).map_err(|e| SuiteError::JsonSerialize {
        context: "product record".into(),
        source: e,
    })?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// Scenario loading
// ============================================================================

/// Load scenarios from a single YAML file or a directory of YAML files,
/// ordered by file name.
/// A malformed scenario file is a configuration error naming the file.
pub fn load_scenarios(path: &str) -> SuiteResult<Vec<ScenarioSpec>> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| SuiteError::Config(format!("cannot read scenarios '{}': {}", path, e)))?;

    if !metadata.is_dir() {
        return Ok(vec![parse_scenario_file(Path::new(path))?]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let p = entry?.path();
        if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            files.push(p);
        }
    }
    // Run order is file-name order
    files.sort();
    files.iter().map(|p| parse_scenario_file(p)).collect()
}

fn parse_scenario_file(path: &Path) -> SuiteResult<ScenarioSpec> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content)
        .map_err(|e| SuiteError::Config(format!("invalid scenario '{}': {}", path.display(), e)))
}

/// Keep scenarios named in `only` (when given) that carry at least one of
/// `tags` (when given).
pub fn filter_scenarios(
    specs: Vec<ScenarioSpec>,
    only: &[String],
    tags: &[String],
) -> Vec<ScenarioSpec> {
    specs
        .into_iter()
        .filter(|s| only.is_empty() || only.contains(&s.name))
        .filter(|s| tags.is_empty() || s.tags.iter().any(|t| tags.contains(t)))
        .collect()
}
