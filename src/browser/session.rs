use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::browser::driver::{Browser, DomEvent};
use crate::browser::network::NetworkExchange;
use crate::browser::selector::Selector;
use crate::cli::config::BrowserConfig;
use crate::error::{SuiteError, SuiteResult};

/// Request sent to the driver over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BrowserRequest {
    Navigate {
        url: String,
        timeout_ms: u64,
    },
    CurrentUrl,
    Click {
        selector: Selector,
    },
    Fill {
        selector: Selector,
        value: String,
        submit: bool,
    },
    SetValue {
        selector: Selector,
        value: String,
        events: Vec<DomEvent>,
    },
    QueryText {
        selector: Selector,
    },
    QueryValue {
        selector: Selector,
    },
    QueryVisible {
        selector: Selector,
    },
    QueryEnabled {
        selector: Selector,
    },
    QueryCount {
        selector: Selector,
    },
    TextVisible {
        text: String,
    },
    Network {
        since: usize,
    },
    NetworkCursor,
    StorageState,
    RestoreStorage {
        state: Value,
    },
    Reset,
    Screenshot {
        path: String,
    },
    Quit,
}

impl BrowserRequest {
    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::CurrentUrl => "current_url",
            BrowserRequest::Click { .. } => "click",
            BrowserRequest::Fill { .. } => "fill",
            BrowserRequest::SetValue { .. } => "set_value",
            BrowserRequest::QueryText { .. } => "query_text",
            BrowserRequest::QueryValue { .. } => "query_value",
            BrowserRequest::QueryVisible { .. } => "query_visible",
            BrowserRequest::QueryEnabled { .. } => "query_enabled",
            BrowserRequest::QueryCount { .. } => "query_count",
            BrowserRequest::TextVisible { .. } => "text_visible",
            BrowserRequest::Network { .. } => "network",
            BrowserRequest::NetworkCursor => "network_cursor",
            BrowserRequest::StorageState => "storage_state",
            BrowserRequest::RestoreStorage { .. } => "restore_storage",
            BrowserRequest::Reset => "reset",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Quit => "quit",
        }
    }

    /// Password fills must not reach the debug log.
    fn is_sensitive(&self) -> bool {
        matches!(self, BrowserRequest::Fill { selector, .. } if selector.css.contains("password"))
    }
}

/// Response received from the driver over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub exchanges: Option<Vec<NetworkExchange>>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub state: Option<Value>,
}

/// A persistent browser session backed by the Playwright driver script.
///
/// The driver keeps one Chromium context open and records every completed
/// network exchange, which is what exchange watches poll.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    navigation_timeout_ms: u64,
    closed: bool,
}

impl BrowserSession {
    /// Spawn the driver and wait for its ready line.
    pub fn launch(config: &BrowserConfig, navigation_timeout_ms: u64) -> SuiteResult<Self> {
        info!(script = %config.server_script, headless = config.headless, "launching browser driver");

        let mut child = Command::new(&config.node_binary)
            .arg(&config.server_script)
            .env("STOREFRONT_HEADLESS", if config.headless { "1" } else { "0" })
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SuiteError::SubprocessSpawn {
                script: config.server_script.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| SuiteError::SessionIo("failed to capture driver stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SuiteError::SessionIo("failed to capture driver stdout".into()))?;

        let mut session = BrowserSession {
            child,
            stdin,
            reader: BufReader::new(stdout),
            navigation_timeout_ms,
            closed: false,
        };

        let ready = session.read_response("ready signal")?;
        if !ready.ok || ready.ready != Some(true) {
            return Err(SuiteError::SessionProtocol {
                command: "launch".into(),
                error: ready
                    .error
                    .unwrap_or_else(|| "driver did not report ready".into()),
            });
        }

        Ok(session)
    }

    fn read_response(&mut self, context: &str) -> SuiteResult<BrowserResponse> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| SuiteError::SessionIo(format!("failed to read {}: {}", context, e)))?;

        if line.trim().is_empty() {
            return Err(SuiteError::SessionIo(format!(
                "empty {} from driver (process may have died)",
                context
            )));
        }

        serde_json::from_str(line.trim()).map_err(|e| SuiteError::JsonParse {
            context: format!("driver {}", context),
            source: e,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> SuiteResult<BrowserResponse> {
        let json = serde_json::to_string(request).map_err(|e| SuiteError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;

        if request.is_sensitive() {
            debug!(cmd = request.name(), "driver request (redacted)");
        } else {
            debug!(request = %json, "driver request");
        }

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| SuiteError::SessionIo(format!("failed to write to driver: {}", e)))?;

        self.read_response("response")
    }

    /// Send and require `ok: true`.
    fn send_ok(&mut self, request: &BrowserRequest) -> SuiteResult<BrowserResponse> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(SuiteError::SessionProtocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(response)
    }

    fn missing(command: &str, field: &str) -> SuiteError {
        SuiteError::SessionProtocol {
            command: command.into(),
            error: format!("no '{}' in response", field),
        }
    }

    /// Shut the driver down. Safe to call more than once.
    pub fn quit(&mut self) -> SuiteResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        // The driver may already be gone; nothing useful to report then.
        let _ = self.send(&BrowserRequest::Quit);
        let _ = self.child.wait();
        Ok(())
    }
}

impl Browser for BrowserSession {
    fn navigate(&mut self, url: &str) -> SuiteResult<()> {
        let timeout_ms = self.navigation_timeout_ms;
        self.send_ok(&BrowserRequest::Navigate {
            url: url.to_string(),
            timeout_ms,
        })?;
        Ok(())
    }

    fn current_url(&mut self) -> SuiteResult<String> {
        self.send_ok(&BrowserRequest::CurrentUrl)?
            .url
            .ok_or_else(|| Self::missing("current_url", "url"))
    }

    fn click(&mut self, target: &Selector) -> SuiteResult<()> {
        self.send_ok(&BrowserRequest::Click {
            selector: target.clone(),
        })?;
        Ok(())
    }

    fn fill(&mut self, target: &Selector, value: &str, submit: bool) -> SuiteResult<()> {
        self.send_ok(&BrowserRequest::Fill {
            selector: target.clone(),
            value: value.to_string(),
            submit,
        })?;
        Ok(())
    }

    fn set_value(&mut self, target: &Selector, value: &str, events: &[DomEvent]) -> SuiteResult<()> {
        self.send_ok(&BrowserRequest::SetValue {
            selector: target.clone(),
            value: value.to_string(),
            events: events.to_vec(),
        })?;
        Ok(())
    }

    fn query_text(&mut self, target: &Selector) -> SuiteResult<Option<String>> {
        Ok(self
            .send_ok(&BrowserRequest::QueryText {
                selector: target.clone(),
            })?
            .text)
    }

    fn query_value(&mut self, target: &Selector) -> SuiteResult<Option<String>> {
        Ok(self
            .send_ok(&BrowserRequest::QueryValue {
                selector: target.clone(),
            })?
            .value)
    }

    fn query_visible(&mut self, target: &Selector) -> SuiteResult<bool> {
        let response = self.send_ok(&BrowserRequest::QueryVisible {
            selector: target.clone(),
        })?;
        Ok(response.visible.unwrap_or(false))
    }

    fn query_enabled(&mut self, target: &Selector) -> SuiteResult<Option<bool>> {
        Ok(self
            .send_ok(&BrowserRequest::QueryEnabled {
                selector: target.clone(),
            })?
            .enabled)
    }

    fn query_count(&mut self, target: &Selector) -> SuiteResult<u32> {
        let response = self.send_ok(&BrowserRequest::QueryCount {
            selector: target.clone(),
        })?;
        Ok(response.count.unwrap_or(0))
    }

    fn text_visible(&mut self, text: &str) -> SuiteResult<bool> {
        let response = self.send_ok(&BrowserRequest::TextVisible {
            text: text.to_string(),
        })?;
        Ok(response.visible.unwrap_or(false))
    }

    fn network_log(&mut self, since: usize) -> SuiteResult<Vec<NetworkExchange>> {
        self.send_ok(&BrowserRequest::Network { since })?
            .exchanges
            .ok_or_else(|| Self::missing("network", "exchanges"))
    }

    fn network_cursor(&mut self) -> SuiteResult<usize> {
        self.send_ok(&BrowserRequest::NetworkCursor)?
            .total
            .ok_or_else(|| Self::missing("network_cursor", "total"))
    }

    fn storage_state(&mut self) -> SuiteResult<Value> {
        self.send_ok(&BrowserRequest::StorageState)?
            .state
            .ok_or_else(|| Self::missing("storage_state", "state"))
    }

    fn restore_storage_state(&mut self, state: &Value) -> SuiteResult<()> {
        self.send_ok(&BrowserRequest::RestoreStorage {
            state: state.clone(),
        })?;
        Ok(())
    }

    fn reset(&mut self) -> SuiteResult<()> {
        self.send_ok(&BrowserRequest::Reset)?;
        Ok(())
    }

    fn screenshot(&mut self, path: &str) -> SuiteResult<()> {
        self.send_ok(&BrowserRequest::Screenshot {
            path: path.to_string(),
        })?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
