use std::io::ErrorKind;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::{SuiteError, SuiteResult};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "storefront-e2e",
    version,
    about = "End-to-end storefront checks with API/UI reconciliation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: storefront-e2e.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios against the storefront
    Run {
        /// Scenario YAML file or directory (default from config)
        #[arg(long)]
        scenarios: Option<String>,

        /// Only run scenarios with this name (repeatable)
        #[arg(long)]
        only: Vec<String>,

        /// Only run scenarios carrying this tag (repeatable)
        #[arg(long)]
        tag: Vec<String>,

        /// Output format: console, junit, json
        #[arg(long)]
        format: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List scenarios without running them
    List {
        /// Scenario YAML file or directory (default from config)
        #[arg(long)]
        scenarios: Option<String>,
    },

    /// Fetch one product record from the backend and print it as JSON
    Lookup {
        /// Product SKU, e.g. 4196:4677:P
        #[arg(long)]
        sku: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

pub const DEFAULT_CONFIG_PATH: &str = "storefront-e2e.yaml";

/// Optional YAML config file: `storefront-e2e.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storefront: StorefrontConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default = "default_storefront_url")]
    pub base_url: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: default_storefront_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_products_path")]
    pub products_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            products_path: default_products_path(),
        }
    }
}

/// Names of the environment variables holding the storefront login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_username_env")]
    pub username_env: String,

    #[serde(default = "default_password_env")]
    pub password_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username_env: default_username_env(),
            password_env: default_password_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_node")]
    pub node_binary: String,

    #[serde(default = "default_server_script")]
    pub server_script: String,

    #[serde(default = "default_true")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            node_binary: default_node(),
            server_script: default_server_script(),
            headless: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Retry window for assertions and element states
    #[serde(default = "default_assert_ms")]
    pub assert_ms: u64,

    /// Wait for a watched network exchange
    #[serde(default = "default_exchange_ms")]
    pub exchange_ms: u64,

    /// Page loads and location changes
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            assert_ms: default_assert_ms(),
            exchange_ms: default_exchange_ms(),
            navigation_ms: default_navigation_ms(),
            poll_interval_ms: default_poll_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_scenarios")]
    pub scenarios: String,

    #[serde(default = "default_console")]
    pub format: String,

    pub output: Option<String>,

    /// JSONL step trace, disabled when unset
    pub trace_file: Option<String>,

    /// Screenshot directory for failed scenarios, disabled when unset
    pub screenshots_dir: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenarios: default_scenarios(),
            format: default_console(),
            output: None,
            trace_file: None,
            screenshots_dir: None,
        }
    }
}

// Serde default helpers
fn default_storefront_url() -> String { "https://www.stuller.com".to_string() }
fn default_api_url() -> String { "https://api.stuller.com".to_string() }
fn default_products_path() -> String { "/v2/products".to_string() }
fn default_username_env() -> String { "STOREFRONT_USERNAME".to_string() }
fn default_password_env() -> String { "STOREFRONT_PASSWORD".to_string() }
fn default_node() -> String { "node".to_string() }
fn default_server_script() -> String { "driver/browser_server.js".to_string() }
fn default_true() -> bool { true }
fn default_assert_ms() -> u64 { 4_000 }
fn default_exchange_ms() -> u64 { 30_000 }
fn default_navigation_ms() -> u64 { 60_000 }
fn default_poll_ms() -> u64 { 100 }
fn default_scenarios() -> String { "scenarios".to_string() }
fn default_console() -> String { "console".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from YAML. A missing default file yields defaults; a missing
/// explicit file or a malformed one is a configuration error.
pub fn load_config(path: Option<&str>) -> SuiteResult<AppConfig> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).map_err(|e| {
            SuiteError::Config(format!("malformed config '{}': {}", config_path, e))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound && path.is_none() => Ok(AppConfig::default()),
        Err(e) => Err(SuiteError::Config(format!(
            "cannot read config '{}': {}",
            config_path, e
        ))),
    }
}
