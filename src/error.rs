use thiserror::Error;

/// Every failure a scenario, helper, or the CLI can surface.
///
/// Reconciliation mismatches are not errors: they are recorded as
/// `ComparisonOutcome`s inside check results so reports can show both sides.
#[derive(Debug, Error)]
pub enum SuiteError {
    /// Malformed config file, bad route pattern, unusable base URL
    #[error("Configuration error: {0}")]
    Config(String),

    /// A credential environment variable is unset or empty
    #[error("Credentials missing: environment variable '{name}' is not set")]
    MissingCredential { name: String },

    /// An awaited exchange, element state, or navigation never arrived
    #[error("Timed out after {timeout_ms}ms waiting for {awaited}")]
    SyncTimeout { awaited: String, timeout_ms: u64 },

    /// A critical exchange completed with a non-success status
    #[error("{exchange} returned status {actual} (expected {expected})")]
    UnexpectedStatus {
        exchange: String,
        expected: u16,
        actual: u16,
    },

    /// Product lookup returned an unusable payload
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The browser driver process failed to spawn
    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    SubprocessSpawn {
        script: String,
        source: std::io::Error,
    },

    /// Reading from or writing to the driver process failed
    #[error("Browser session I/O: {0}")]
    SessionIo(String),

    /// The driver answered `ok: false` or omitted a required field
    #[error("Browser command '{command}' failed: {error}")]
    SessionProtocol { command: String, error: String },

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        source: serde_json::Error,
    },

    /// The cart could not be brought to an observable empty state
    #[error("Cart state: {0}")]
    CartState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SuiteError {
    /// Configuration problems abort the whole run instead of one scenario.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SuiteError::Config(_) | SuiteError::MissingCredential { .. }
        )
    }
}

pub type SuiteResult<T> = Result<T, SuiteError>;
