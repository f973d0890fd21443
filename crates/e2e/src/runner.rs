//! Runs scenarios through a fresh [`Quest`] each and collects the results

use async_trait::async_trait;
use quest_common::{contains_text, DataRepository, Error, QueryRunner, QuestConfig};
use quest_core::{
    resolve_or_err, AccordionType, AlertType, BaseLoginClient, ButtonType, CellCriteria,
    ComponentType, Container, FormLoginClient, InputType, LinkType, LoaderType, LoginExtension,
    ModalType, Quest, QuestExtension, RadioType, SelectType, TabType, TableType, ToggleType,
};
use quest_driver::{By, Driver, WebDriverClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::scenario::{Scenario, ScenarioLogin, Step};

/// Where each scenario's browser comes from
#[async_trait]
pub trait DriverProvider: Send + Sync {
    async fn open(&self, config: &QuestConfig) -> quest_common::Result<Arc<dyn Driver>>;
}

/// A new W3C WebDriver session per scenario
pub struct WebDriverProvider;

#[async_trait]
impl DriverProvider for WebDriverProvider {
    async fn open(&self, config: &QuestConfig) -> quest_common::Result<Arc<dyn Driver>> {
        Ok(Arc::new(WebDriverClient::connect(&config.driver).await?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

/// Configuration for the scenario runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            scenarios_dir: PathBuf::from("tests/scenarios"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

pub struct ScenarioRunner {
    config: Arc<QuestConfig>,
    provider: Arc<dyn DriverProvider>,
    data: Option<Arc<DataRepository>>,
    db: Option<QueryRunner>,
    /// Enabled on every scenario's quest, before any login
    extensions: Vec<Arc<dyn QuestExtension>>,
    /// Shared session cache; scenarios fall back to a form login without one
    logins: Option<Arc<BaseLoginClient>>,
    scenarios_dir: PathBuf,
    output_dir: PathBuf,
}

impl ScenarioRunner {
    pub fn new(config: Arc<QuestConfig>, provider: Arc<dyn DriverProvider>, runner: RunnerConfig) -> Self {
        Self {
            config,
            provider,
            data: None,
            db: None,
            extensions: Vec::new(),
            logins: None,
            scenarios_dir: runner.scenarios_dir,
            output_dir: runner.output_dir,
        }
    }

    pub fn with_data(mut self, data: Arc<DataRepository>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_db(mut self, db: QueryRunner) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_extension(mut self, extension: Arc<dyn QuestExtension>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn with_logins(mut self, logins: Arc<BaseLoginClient>) -> Self {
        self.logins = Some(logins);
        self
    }

    pub async fn run_all(&self) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(&self.scenarios_dir)?;
        Ok(self.run_scenarios(&scenarios).await)
    }

    pub async fn run_tagged(&self, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios: Vec<Scenario> = Scenario::load_all(&self.scenarios_dir)?
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect();
        Ok(self.run_scenarios(&scenarios).await)
    }

    pub async fn run_named(&self, name: &str) -> E2eResult<ScenarioResult> {
        let scenario = Scenario::load_all(&self.scenarios_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;
        Ok(self.run_scenario(&scenario).await)
    }

    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> SuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());
        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            if result.success {
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let passed = results.iter().filter(|r| r.success).count();
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed,
            results.len() - passed,
            duration_ms
        );

        SuiteResult {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    /// Run one scenario, stopping at its first failed step.
    ///
    /// The quest is completed and the browser closed whether or not the
    /// steps passed; a step failure is reported over a completion failure.
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let mut result = ScenarioResult {
            name: scenario.name.clone(),
            success: false,
            duration_ms: 0,
            steps: Vec::new(),
            error: None,
        };

        let driver = match self.provider.open(&self.config).await {
            Ok(driver) => driver,
            Err(e) => {
                result.error = Some(format!("browser: {}", e));
                result.duration_ms = start.elapsed().as_millis() as u64;
                return result;
            }
        };

        let mut quest = Quest::new(driver, self.config.clone());
        if let Some(data) = &self.data {
            quest = quest.with_data(data.clone());
        }
        if let Some(db) = &self.db {
            quest = quest.with_db(db.clone());
        }

        let driven = self.drive(&mut quest, scenario, &mut result.steps).await;
        let completed = quest.complete().await;
        result.error = match (driven, completed) {
            (Ok(()), Ok(())) => None,
            (Ok(()), Err(e)) => Some(e.to_string()),
            (Err(failure), Ok(())) => Some(failure),
            (Err(failure), Err(e)) => {
                warn!("Completing '{}' after a failed step also failed: {}", scenario.name, e);
                Some(failure)
            }
        };
        if let Err(e) = quest.quit().await {
            warn!("Closing browser for '{}' failed: {}", scenario.name, e);
        }

        result.success = result.error.is_none();
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    async fn drive(
        &self,
        quest: &mut Quest,
        scenario: &Scenario,
        steps: &mut Vec<StepResult>,
    ) -> Result<(), String> {
        for extension in &self.extensions {
            quest
                .enable_shared(extension.clone())
                .await
                .map_err(|e| format!("extension '{}': {}", extension.name(), e))?;
        }
        if let Some(login) = &scenario.login {
            self.login(quest, login)
                .await
                .map_err(|e| format!("login: {}", e))?;
        }

        for step in &scenario.steps {
            let start = Instant::now();
            let outcome = execute(quest, step).await;
            let failed = outcome.as_ref().err().map(|e| e.to_string());

            steps.push(StepResult {
                step: step.describe(),
                success: failed.is_none(),
                duration_ms: start.elapsed().as_millis() as u64,
                error: failed.clone(),
            });
            if let Some(reason) = failed {
                return Err(E2eError::StepFailed {
                    step: step.describe(),
                    reason,
                }
                .to_string());
            }
        }
        Ok(())
    }

    async fn login(&self, quest: &mut Quest, login: &ScenarioLogin) -> quest_common::Result<()> {
        let logins = match &self.logins {
            Some(logins) => logins.clone(),
            None => Arc::new(BaseLoginClient::new(Arc::new(FormLoginClient::new(
                quest.driver().clone(),
                &login.url,
            )))),
        };
        let username = resolve_value(quest, &login.username)?;
        let password = resolve_value(quest, &login.password)?;

        let mut extension = LoginExtension::new(logins, username, password);
        if let Some(landing) = &login.landing {
            extension = extension.landing(landing);
        }
        quest.enable(extension).await
    }

    /// Write results as JSON into the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join("scenario-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Resolve an optional type name to its enum value under the project package
fn typed<T: ComponentType>(quest: &Quest, ty: &Option<String>) -> quest_common::Result<Option<T>> {
    let package = &quest.config().project.package;
    ty.as_deref()
        .map(|name| resolve_or_err::<T>(name, package))
        .transpose()
}

fn container(within: &Option<String>) -> Container {
    within
        .as_deref()
        .map(|css| Container::Locator(By::css(css)))
        .unwrap_or_default()
}

/// Expand `${path}` from quest storage (`storage.` prefix) or test data
fn resolve_value(quest: &Quest, raw: &str) -> quest_common::Result<String> {
    let Some(path) = raw.strip_prefix("${").and_then(|r| r.strip_suffix('}')) else {
        return Ok(raw.to_string());
    };
    let value: Value = match path.strip_prefix("storage.") {
        Some(key) => quest
            .storage()
            .get(key)?
            .ok_or_else(|| Error::not_found(format!("stored value '{}'", key)))?,
        None => quest.data(path)?,
    };
    Ok(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Call `$op` on the default type, or `$op_as` when the step names one
macro_rules! dispatch {
    ($service:expr, $ty:expr, $op:ident, $op_as:ident $(, $arg:expr)*) => {
        match $ty {
            Some(ty) => $service.$op_as(ty $(, $arg)*).await,
            None => $service.$op($($arg),*).await,
        }
    };
}

async fn execute(quest: &mut Quest, step: &Step) -> quest_common::Result<()> {
    match step {
        Step::Navigate { url } => {
            let url = resolve_value(quest, url)?;
            quest.navigate(&url).await
        }
        Step::Click { text, ty, within } => {
            let ty = typed::<ButtonType>(quest, ty)?;
            dispatch!(quest.button(), ty, click, click_as, &container(within), text)
        }
        Step::ClickLink { text, ty, within } => {
            let ty = typed::<LinkType>(quest, ty)?;
            dispatch!(quest.link(), ty, click, click_as, &container(within), text)
        }
        Step::Insert { label, value, ty, within } => {
            let ty = typed::<InputType>(quest, ty)?;
            let value = resolve_value(quest, value)?;
            dispatch!(quest.input(), ty, insert, insert_as, &container(within), label, &value)
        }
        Step::Select { label, option, ty, within } => {
            let ty = typed::<SelectType>(quest, ty)?;
            let option = resolve_value(quest, option)?;
            dispatch!(quest.select(), ty, select, select_as, &container(within), label, &option)
        }
        Step::Radio { text, ty, within } => {
            let ty = typed::<RadioType>(quest, ty)?;
            dispatch!(quest.radio(), ty, select, select_as, &container(within), text)
        }
        Step::Toggle { label, on, ty, within } => {
            let ty = typed::<ToggleType>(quest, ty)?;
            if *on {
                dispatch!(quest.toggle(), ty, activate, activate_as, &container(within), label)
            } else {
                dispatch!(quest.toggle(), ty, deactivate, deactivate_as, &container(within), label)
            }
        }
        Step::Tab { text, ty, within } => {
            let ty = typed::<TabType>(quest, ty)?;
            dispatch!(quest.tab(), ty, click, click_as, &container(within), text)
        }
        Step::Expand { title, ty, within } => {
            let ty = typed::<AccordionType>(quest, ty)?;
            dispatch!(quest.accordion(), ty, expand, expand_as, &container(within), title)
        }
        Step::ModalButton { text, ty } => {
            let ty = typed::<ModalType>(quest, ty)?;
            dispatch!(quest.modal(), ty, click_button, click_button_as, text)
        }
        Step::WaitForLoader { timeout_ms, ty, within } => {
            let ty = typed::<LoaderType>(quest, ty)?;
            let timeout = Duration::from_millis(*timeout_ms);
            dispatch!(
                quest.loader(),
                ty,
                wait_to_disappear,
                wait_to_disappear_as,
                &container(within),
                timeout
            )
        }
        Step::AssertAlert { text, ty, within } => {
            let ty = typed::<AlertType>(quest, ty)?;
            let expected = resolve_value(quest, text)?;
            let actual = dispatch!(quest.alert(), ty, text, text_as, &container(within))?;
            quest.validate(
                contains_text(&actual, &expected),
                &format!("alert shows '{}', expected '{}'", actual, expected),
            )
        }
        Step::AssertInput { label, value, ty, within } => {
            let ty = typed::<InputType>(quest, ty)?;
            let expected = resolve_value(quest, value)?;
            let actual = dispatch!(quest.input(), ty, value, value_as, &container(within), label)?;
            quest.validate(
                actual == expected,
                &format!("input '{}' holds '{}', expected '{}'", label, actual, expected),
            )
        }
        Step::AssertTable { rows, has_row, ty, within } => {
            let ty = typed::<TableType>(quest, ty)?;
            let data = dispatch!(quest.table(), ty, read, read_as, &container(within))?;
            let checks = data.assert();
            if let Some(rows) = rows {
                checks.row_count(*rows)?;
            }
            if let Some(cells) = has_row {
                let criteria: Vec<CellCriteria> = cells
                    .iter()
                    .map(|(column, value)| CellCriteria::new(column, value))
                    .collect();
                checks.has_row(&criteria)?;
            }
            Ok(())
        }
        Step::AssertTitle { contains } => {
            let title = quest.driver().title().await?;
            quest.validate(
                contains_text(&title, contains),
                &format!("title '{}' does not contain '{}'", title, contains),
            )
        }
        Step::AssertQuery { sql, rows, first_row } => {
            let response = quest.db()?.query(sql, [])?;
            if let Some(rows) = rows {
                response.expect_row_count(*rows)?;
            }
            for (column, expected) in first_row {
                let expected = match expected {
                    Value::String(raw) => Value::String(resolve_value(quest, raw)?),
                    other => other.clone(),
                };
                response.expect_value(0, column, expected)?;
            }
            Ok(())
        }
        Step::Remember { key, value } => {
            let value = resolve_value(quest, value)?;
            quest.storage_mut().put(key.as_str(), &value)
        }
        Step::Log { message } => {
            info!("{}", message);
            Ok(())
        }
    }
}
