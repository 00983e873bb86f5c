use std::fmt;

use serde::{Deserialize, Serialize};

/// Locator sent to the driver: a CSS selector, optionally narrowed to
/// elements containing some text.
///
/// Scenario files normally name a `data-test` attribute:
/// ```yaml
/// target: { test_id: "item-number" }
/// target: { test_id: "special-instructions-section", descendant: "textarea.form-control" }
/// target: { test_id: "modal-button", has_text: "Yes" }
/// target: { css: ".productDescription" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "SelectorDef")]
pub struct Selector {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SelectorDef {
    TestId {
        test_id: String,
        #[serde(default)]
        descendant: Option<String>,
        #[serde(default)]
        has_text: Option<String>,
    },
    Css {
        css: String,
        #[serde(default)]
        has_text: Option<String>,
    },
}

impl From<SelectorDef> for Selector {
    fn from(def: SelectorDef) -> Self {
        match def {
            SelectorDef::TestId {
                test_id,
                descendant,
                has_text,
            } => {
                let mut selector = Selector::test_id(&test_id);
                if let Some(d) = descendant {
                    selector = selector.descendant(&d);
                }
                selector.has_text = has_text;
                selector
            }
            SelectorDef::Css { css, has_text } => Selector { css, has_text },
        }
    }
}

impl Selector {
    /// `[data-test="<id>"]`
    pub fn test_id(id: &str) -> Self {
        Selector {
            css: format!("[data-test=\"{}\"]", id.replace('"', "\\\"")),
            has_text: None,
        }
    }

    pub fn css(css: &str) -> Self {
        Selector {
            css: css.to_string(),
            has_text: None,
        }
    }

    pub fn descendant(mut self, css: &str) -> Self {
        self.css = format!("{} {}", self.css, css);
        self
    }

    /// Restrict to rendered elements (the storefront duplicates some
    /// controls between mobile and desktop layouts).
    pub fn visible_only(mut self) -> Self {
        self.css.push_str(":visible");
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.has_text = Some(text.to_string());
        self
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.has_text {
            Some(text) => write!(f, "{} containing \"{}\"", self.css, text),
            None => write!(f, "{}", self.css),
        }
    }
}
