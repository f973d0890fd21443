//! Declarative YAML scenarios

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Sign in before the first step
    #[serde(default)]
    pub login: Option<ScenarioLogin>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioLogin {
    /// Login form page, used when no shared login client is configured
    #[serde(default = "default_login_url")]
    pub url: String,
    pub username: String,
    pub password: String,
    /// Page to open once signed in
    #[serde(default)]
    pub landing: Option<String>,
}

fn default_login_url() -> String {
    "/login".to_string()
}

/// A single step.
///
/// Component steps take an optional `type` naming the implementation (for
/// example `MATERIAL_SELECT`); without it the configured default is used.
/// `within` scopes the lookup to the first element matching a CSS selector.
/// String values of the form `${path}` are read from the test data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Navigate {
        url: String,
    },

    /// Click a button by its text
    Click {
        text: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    ClickLink {
        text: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    /// Type into the input labelled `label`, replacing its value
    Insert {
        label: String,
        value: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    Select {
        label: String,
        option: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    Radio {
        text: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    Toggle {
        label: String,
        on: bool,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    Tab {
        text: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    Expand {
        title: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    /// Click a button in the open modal
    ModalButton {
        text: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
    },

    WaitForLoader {
        #[serde(default = "default_wait_timeout")]
        timeout_ms: u64,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    /// Fail unless a visible alert shows `text`
    AssertAlert {
        text: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    AssertInput {
        label: String,
        value: String,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    AssertTable {
        #[serde(default)]
        rows: Option<usize>,
        /// Every `column: value` pair must match within a single row
        #[serde(default)]
        has_row: Option<BTreeMap<String, String>>,
        #[serde(default, rename = "type")]
        ty: Option<String>,
        #[serde(default)]
        within: Option<String>,
    },

    /// Fail unless the page title contains `contains`
    AssertTitle {
        contains: String,
    },

    /// Run `sql` against the attached database; `first_row` maps columns to
    /// expected values of the first result row
    AssertQuery {
        sql: String,
        #[serde(default)]
        rows: Option<usize>,
        #[serde(default)]
        first_row: BTreeMap<String, Value>,
    },

    /// Keep a value in the quest storage for later `${storage.key}` lookups
    Remember {
        key: String,
        value: String,
    },

    Log {
        message: String,
    },
}

fn default_wait_timeout() -> u64 {
    5000
}

impl Step {
    /// Short human-readable form for logs and results
    pub fn describe(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate {}", url),
            Step::Click { text, .. } => format!("click '{}'", text),
            Step::ClickLink { text, .. } => format!("click link '{}'", text),
            Step::Insert { label, .. } => format!("insert into '{}'", label),
            Step::Select { label, option, .. } => format!("select '{}' in '{}'", option, label),
            Step::Radio { text, .. } => format!("choose radio '{}'", text),
            Step::Toggle { label, on, .. } => {
                format!("switch '{}' {}", label, if *on { "on" } else { "off" })
            }
            Step::Tab { text, .. } => format!("open tab '{}'", text),
            Step::Expand { title, .. } => format!("expand '{}'", title),
            Step::ModalButton { text, .. } => format!("modal button '{}'", text),
            Step::WaitForLoader { .. } => "wait for loader".to_string(),
            Step::AssertAlert { text, .. } => format!("assert alert '{}'", text),
            Step::AssertInput { label, .. } => format!("assert input '{}'", label),
            Step::AssertTable { .. } => "assert table".to_string(),
            Step::AssertTitle { contains } => format!("assert title contains '{}'", contains),
            Step::AssertQuery { sql, .. } => format!("assert query '{}'", sql),
            Step::Remember { key, .. } => format!("remember '{}'", key),
            Step::Log { message } => format!("log '{}'", message),
        }
    }
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| E2eError::ScenarioParse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every scenario under a directory, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let yaml = r##"
name: signup
description: Register a new account
tags: [smoke, auth]
login:
  username: ana
  password: pw
steps:
  - action: navigate
    url: /signup
  - action: insert
    label: Email
    value: ${users.ana.email}
  - action: select
    label: Plan
    option: Pro
    type: MATERIAL_SELECT
    within: "#plans"
  - action: assert_table
    rows: 2
    has_row:
      Name: Ana
"##;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "signup");
        assert!(scenario.has_tag("auth"));
        assert_eq!(scenario.login.as_ref().unwrap().url, "/login");
        assert_eq!(scenario.steps.len(), 4);
        match &scenario.steps[2] {
            Step::Select { ty, within, .. } => {
                assert_eq!(ty.as_deref(), Some("MATERIAL_SELECT"));
                assert_eq!(within.as_deref(), Some("#plans"));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_parse_query_step() {
        let yaml = r#"
name: stored
steps:
  - action: assert_query
    sql: SELECT name, plan FROM users WHERE email = 'ana@example.com'
    rows: 1
    first_row:
      name: ana
      plan: 2
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        match &scenario.steps[0] {
            Step::AssertQuery { rows, first_row, .. } => {
                assert_eq!(*rows, Some(1));
                assert_eq!(first_row["name"], Value::from("ana"));
                assert_eq!(first_row["plan"], Value::from(2));
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_is_a_parse_error() {
        let yaml = "name: x\nsteps:\n  - action: hover\n    selector: a\n";
        assert!(matches!(
            Scenario::from_yaml(yaml),
            Err(E2eError::ScenarioParse(_))
        ));
    }

    #[test]
    fn test_load_all_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.yaml"), "name: b\nsteps: []\n").unwrap();
        std::fs::write(tmp.path().join("a.yml"), "name: a\nsteps: []\n").unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "skip").unwrap();

        let names: Vec<String> = Scenario::load_all(tmp.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
