//! Framework configuration
//!
//! Loaded in order of precedence:
//! 1. `QUEST_*` environment variables
//! 2. TOML config file
//! 3. Built-in defaults
//!
//! The resulting [`QuestConfig`] is passed explicitly to every service; nothing
//! reads configuration from a global.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::{Error, Result};

const ENV_PREFIX: &str = "QUEST_";
const DEFAULT_TYPE_SUFFIX: &str = "_DEFAULT_TYPE";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    pub project: ProjectConfig,

    /// Default component type name per concept, e.g. `radio = "BOOTSTRAP_RADIO"`
    pub defaults: BTreeMap<String, String>,

    pub wait: WaitConfig,

    pub driver: DriverConfig,

    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Package under which component types are looked up
    pub package: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            package: "quest".to_string(),
        }
    }
}

/// Implicit wait settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub duration_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            duration_ms: 5000,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
    Edge,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
            Browser::Edge => "MicrosoftEdge",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            "edge" | "microsoftedge" => Ok(Browser::Edge),
            other => Err(Error::Configuration(format!("Unsupported browser: {}", other))),
        }
    }
}

/// Browser driver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// WebDriver endpoint (chromedriver, geckodriver, Selenium Grid)
    pub url: String,

    pub browser: Browser,

    pub headless: bool,

    /// Base URL of the application under test; relative navigations are joined to it
    pub base_url: Option<String>,

    /// Extra browser command-line arguments
    pub args: Vec<String>,

    /// Route lookups through the waiting, recovering smart layer
    pub use_wrapped_functions: bool,

    /// Fall back to a shadow-root search when a plain lookup finds nothing
    pub use_shadow_root: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4444".to_string(),
            browser: Browser::Chrome,
            headless: true,
            base_url: None,
            args: Vec::new(),
            use_wrapped_functions: true,
            use_shadow_root: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding YAML/JSON test data
    pub dir: PathBuf,
    /// SQLite database of the application under test
    pub database: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("test-data"),
            database: None,
        }
    }
}

impl QuestConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            debug!("Loading configuration from {}", path.display());
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Load from file and apply `QUEST_*` overrides from the process environment
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(std::env::vars())?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::Configuration(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `QUEST_*` overrides; unrelated variables are ignored
    pub fn apply_env<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match name {
                "PROJECT_PACKAGE" => self.project.package = value,
                "WAIT_DURATION_MS" => self.wait.duration_ms = parse_env(&key, &value)?,
                "WAIT_POLL_INTERVAL_MS" => self.wait.poll_interval_ms = parse_env(&key, &value)?,
                "DRIVER_URL" => self.driver.url = value,
                "DRIVER_BROWSER" => self.driver.browser = value.parse()?,
                "DRIVER_HEADLESS" => self.driver.headless = parse_flag(&key, &value)?,
                "BASE_URL" => self.driver.base_url = Some(value),
                "USE_WRAPPED_FUNCTIONS" => {
                    self.driver.use_wrapped_functions = parse_flag(&key, &value)?
                }
                "USE_SHADOW_ROOT" => self.driver.use_shadow_root = parse_flag(&key, &value)?,
                "DATA_DIR" => self.data.dir = PathBuf::from(value),
                "DATA_DATABASE" => self.data.database = Some(PathBuf::from(value)),
                other => {
                    if let Some(concept) = other.strip_suffix(DEFAULT_TYPE_SUFFIX) {
                        self.defaults.insert(concept.to_lowercase(), value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Look up a setting by its dotted key, e.g. `radio.default.type`
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "project.package" => Some(self.project.package.clone()),
            "wait.duration" => Some(self.wait.duration_ms.to_string()),
            "wait.poll.interval" => Some(self.wait.poll_interval_ms.to_string()),
            "use.wrapped.selenium.functions" => {
                Some(self.driver.use_wrapped_functions.to_string())
            }
            "use.shadow.root" => Some(self.driver.use_shadow_root.to_string()),
            "driver.url" => Some(self.driver.url.clone()),
            "driver.browser" => Some(self.driver.browser.as_str().to_string()),
            "driver.headless" => Some(self.driver.headless.to_string()),
            "base.url" => self.driver.base_url.clone(),
            "data.dir" => Some(self.data.dir.display().to_string()),
            "data.database" => self.data.database.as_ref().map(|p| p.display().to_string()),
            other => other
                .strip_suffix(".default.type")
                .and_then(|concept| self.default_type_name(concept))
                .map(str::to_string),
        }
    }

    /// Configured default type name for a concept key such as `radio`
    pub fn default_type_name(&self, concept: &str) -> Option<&str> {
        self.defaults.get(concept).map(String::as_str)
    }

    pub fn wait_duration(&self) -> Duration {
        Duration::from_millis(self.wait.duration_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait.poll_interval_ms.max(1))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("{} has an invalid value: {}", key, value)))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Configuration(format!(
            "{} must be a boolean, got {}",
            key, value
        ))),
    }
}
