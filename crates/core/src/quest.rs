//! The Quest DSL
//!
//! A [`Quest`] is one test's handle on the browser: it owns the driver, one
//! service per concept, scratch storage shared between steps, injected test
//! data, an optional database connection and soft assertions.
//!
//! ```ignore
//! let mut quest = Quest::start(Arc::new(config)).await?;
//! quest.navigate("/signup").await?;
//! quest.input().insert(&Container::Page, "Email", "ana@example.com").await?;
//! quest.radio().select(&Container::Page, "Yes").await?;
//! quest.button().click(&Container::Page, "Create account").await?;
//! quest.soft_validate(quest.alert().is_visible(&Container::Page).await?, "confirmation shown");
//! quest.complete().await?;
//! ```

use quest_common::{DataRepository, Error, QueryRunner, QuestConfig, Result};
use quest_driver::{Driver, SmartDriver, WebDriverClient};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::components::accordion::AccordionService;
use crate::components::alert::AlertService;
use crate::components::button::ButtonService;
use crate::components::input::InputService;
use crate::components::link::LinkService;
use crate::components::loader::LoaderService;
use crate::components::modal::ModalService;
use crate::components::radio::RadioService;
use crate::components::select::SelectService;
use crate::components::tab::TabService;
use crate::components::table::TableService;
use crate::components::toggle::ToggleService;
use crate::extension::QuestExtension;

/// Typed key/value scratch space for passing values between steps
#[derive(Debug, Default)]
pub struct Storage {
    values: HashMap<String, Value>,
}

impl Storage {
    pub fn put<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> Result<()> {
        self.values.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// `None` when absent; a serialization error when stored as another shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.values
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(Error::from)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }
}

/// Failed checks collected without stopping the quest
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<String>,
}

impl SoftAssertions {
    /// Record `message` when `passed` is false; returns `passed`
    pub fn check(&mut self, passed: bool, message: impl Into<String>) -> bool {
        if !passed {
            let message = message.into();
            warn!("Soft assertion failed: {}", message);
            self.failures.push(message);
        }
        passed
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn verify(&self) -> Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }
        Err(Error::Assertion(format!(
            "{} soft assertion(s) failed: {}",
            self.failures.len(),
            self.failures.join("; ")
        )))
    }
}

pub struct Quest {
    driver: SmartDriver,
    config: Arc<QuestConfig>,
    accordion: AccordionService,
    alert: AlertService,
    button: ButtonService,
    input: InputService,
    link: LinkService,
    loader: LoaderService,
    modal: ModalService,
    radio: RadioService,
    select: SelectService,
    tab: TabService,
    table: TableService,
    toggle: ToggleService,
    storage: Storage,
    data: Option<Arc<DataRepository>>,
    db: Option<QueryRunner>,
    soft: SoftAssertions,
    extensions: Vec<Arc<dyn QuestExtension>>,
}

impl Quest {
    pub fn new(driver: Arc<dyn Driver>, config: Arc<QuestConfig>) -> Self {
        let driver = SmartDriver::from_config(driver, &config);
        Self {
            accordion: AccordionService::new(driver.clone(), &config),
            alert: AlertService::new(driver.clone(), &config),
            button: ButtonService::new(driver.clone(), &config),
            input: InputService::new(driver.clone(), &config),
            link: LinkService::new(driver.clone(), &config),
            loader: LoaderService::new(driver.clone(), &config),
            modal: ModalService::new(driver.clone(), &config),
            radio: RadioService::new(driver.clone(), &config),
            select: SelectService::new(driver.clone(), &config),
            tab: TabService::new(driver.clone(), &config),
            table: TableService::new(driver.clone(), &config),
            toggle: ToggleService::new(driver.clone(), &config),
            driver,
            config,
            storage: Storage::default(),
            data: None,
            db: None,
            soft: SoftAssertions::default(),
            extensions: Vec::new(),
        }
    }

    /// Open a WebDriver session as configured and wrap it in a quest
    pub async fn start(config: Arc<QuestConfig>) -> Result<Self> {
        let client = WebDriverClient::connect(&config.driver).await?;
        info!("Quest started against {}", config.driver.url);
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn with_data(mut self, data: Arc<DataRepository>) -> Self {
        self.data = Some(data);
        self
    }

    /// Attach the application database for query-backed checks
    pub fn with_db(mut self, db: QueryRunner) -> Self {
        self.db = Some(db);
        self
    }

    pub fn driver(&self) -> &SmartDriver {
        &self.driver
    }

    pub fn config(&self) -> &QuestConfig {
        &self.config
    }

    pub fn accordion(&self) -> &AccordionService {
        &self.accordion
    }

    pub fn alert(&self) -> &AlertService {
        &self.alert
    }

    pub fn button(&self) -> &ButtonService {
        &self.button
    }

    pub fn input(&self) -> &InputService {
        &self.input
    }

    pub fn link(&self) -> &LinkService {
        &self.link
    }

    pub fn loader(&self) -> &LoaderService {
        &self.loader
    }

    pub fn modal(&self) -> &ModalService {
        &self.modal
    }

    pub fn radio(&self) -> &RadioService {
        &self.radio
    }

    pub fn select(&self) -> &SelectService {
        &self.select
    }

    pub fn tab(&self) -> &TabService {
        &self.tab
    }

    pub fn table(&self) -> &TableService {
        &self.table
    }

    pub fn toggle(&self) -> &ToggleService {
        &self.toggle
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Injected test data at a dotted path
    pub fn data<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        match &self.data {
            Some(repo) => repo.get(path),
            None => Err(Error::IllegalState(
                "no test data repository attached to this quest".to_string(),
            )),
        }
    }

    pub fn db(&self) -> Result<&QueryRunner> {
        self.db.as_ref().ok_or_else(|| {
            Error::IllegalState("no database attached to this quest".to_string())
        })
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.driver.navigate(url).await
    }

    /// Hard check: fails the quest right away
    pub fn validate(&self, passed: bool, message: &str) -> Result<()> {
        if passed {
            Ok(())
        } else {
            Err(Error::Assertion(message.to_string()))
        }
    }

    /// Soft check: recorded, reported by [`Quest::complete`]
    pub fn soft_validate(&mut self, passed: bool, message: impl Into<String>) -> bool {
        self.soft.check(passed, message)
    }

    pub fn soft_assertions(&self) -> &SoftAssertions {
        &self.soft
    }

    /// Run the extension's `before` hook and keep it for `complete`
    pub async fn enable<E: QuestExtension + 'static>(&mut self, extension: E) -> Result<()> {
        self.enable_shared(Arc::new(extension)).await
    }

    /// [`Quest::enable`] for an extension shared between quests
    pub async fn enable_shared(&mut self, extension: Arc<dyn QuestExtension>) -> Result<()> {
        info!("Enabling extension '{}'", extension.name());
        extension.before(self).await?;
        self.extensions.push(extension);
        Ok(())
    }

    /// Run every `after` hook in reverse order, then check soft assertions.
    ///
    /// A failing hook does not stop the others; the first hook error wins
    /// over soft assertion failures.
    pub async fn complete(&mut self) -> Result<()> {
        let extensions = std::mem::take(&mut self.extensions);
        let mut failed = None;
        for extension in extensions.iter().rev() {
            if let Err(e) = extension.after(self).await {
                warn!("Extension '{}' failed on completion: {}", extension.name(), e);
                failed.get_or_insert(e);
            }
        }
        let verified = self.soft.verify();
        match failed {
            Some(e) => Err(e),
            None => verified,
        }
    }

    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use quest_common::ErrorKind;
    use quest_driver::{FakeBrowser, Node};

    fn quest(page: Node) -> (Arc<FakeBrowser>, Quest) {
        let mut config = QuestConfig::default();
        config.wait.duration_ms = 20;
        config.wait.poll_interval_ms = 1;
        config.defaults.insert("button".into(), "BOOTSTRAP_BUTTON".into());
        let fake = Arc::new(FakeBrowser::new(page));
        let quest = Quest::new(fake.clone(), Arc::new(config));
        (fake, quest)
    }

    #[test]
    fn test_storage_round_trips_typed_values() {
        let mut storage = Storage::default();
        storage.put("order.id", &42u32).unwrap();
        storage.put("tags", &vec!["a", "b"]).unwrap();

        assert_eq!(storage.get::<u32>("order.id").unwrap(), Some(42));
        assert_eq!(storage.get::<Vec<String>>("tags").unwrap().unwrap(), vec!["a", "b"]);
        assert_eq!(storage.get::<u32>("missing").unwrap(), None);
        assert!(storage.get::<u32>("tags").is_err());
        assert!(storage.remove("tags").is_some());
        assert!(!storage.contains("tags"));
    }

    #[tokio::test]
    async fn test_soft_failures_surface_on_complete() {
        let (_, mut quest) = quest(Node::new("main"));

        assert!(!quest.soft_validate(false, "banner shown"));
        assert!(quest.soft_validate(true, "title set"));
        assert!(quest.validate(true, "ok").is_ok());
        assert_eq!(
            quest.validate(false, "hard").unwrap_err().kind(),
            ErrorKind::Assertion
        );

        let err = quest.complete().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert!(err.to_string().contains("banner shown"));
    }

    #[tokio::test]
    async fn test_services_use_configured_defaults() {
        let (fake, quest) = quest(Node::new("main").child(
            Node::new("button").class("btn").text("Save"),
        ));

        quest.button().click(&Container::Page, "save").await.unwrap();
        assert_eq!(fake.clicked(), vec!["Save"]);

        let err = quest.radio().select(&Container::Page, "Yes").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }

    #[tokio::test]
    async fn test_data_requires_repository() {
        let (_, quest) = quest(Node::new("main"));
        assert_eq!(
            quest.data::<String>("users.admin").unwrap_err().kind(),
            ErrorKind::IllegalState
        );

        let mut repo = DataRepository::new();
        repo.insert("users", serde_json::json!({ "admin": "root" }));
        let quest = quest.with_data(Arc::new(repo));
        assert_eq!(quest.data::<String>("users.admin").unwrap(), "root");
    }

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail_after: bool,
    }

    #[async_trait]
    impl QuestExtension for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn before(&self, _quest: &mut Quest) -> Result<()> {
            self.log.lock().push(format!("before {}", self.name));
            Ok(())
        }

        async fn after(&self, _quest: &mut Quest) -> Result<()> {
            self.log.lock().push(format!("after {}", self.name));
            if self.fail_after {
                return Err(Error::Internal(format!("{} cleanup failed", self.name)));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_extensions_unwind_in_reverse() {
        let (_, mut quest) = quest(Node::new("main"));
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["db", "login"] {
            quest
                .enable(Recorder {
                    name,
                    log: log.clone(),
                    fail_after: false,
                })
                .await
                .unwrap();
        }
        quest.complete().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["before db", "before login", "after login", "after db"]
        );
    }

    #[tokio::test]
    async fn test_failing_after_hook_does_not_skip_others() {
        let (_, mut quest) = quest(Node::new("main"));
        let log = Arc::new(Mutex::new(Vec::new()));

        for (name, fail_after) in [("db", false), ("login", true), ("trace", false)] {
            quest
                .enable(Recorder {
                    name,
                    log: log.clone(),
                    fail_after,
                })
                .await
                .unwrap();
        }
        quest.soft_validate(false, "badge shown");

        let err = quest.complete().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("login cleanup failed"));
        assert_eq!(
            log.lock()[3..].to_vec(),
            vec!["after trace", "after login", "after db"]
        );
    }

    #[tokio::test]
    async fn test_db_checks_need_attached_runner() {
        let (_, quest) = quest(Node::new("main"));
        assert_eq!(quest.db().unwrap_err().kind(), ErrorKind::IllegalState);

        let db = QueryRunner::open_memory().unwrap();
        db.execute_batch("CREATE TABLE users (name TEXT); INSERT INTO users VALUES ('ana');")
            .unwrap();
        let quest = quest.with_db(db);

        let users = quest.db().unwrap().query("SELECT name FROM users", []).unwrap();
        users.expect_row_count(1).unwrap().expect_value(0, "name", "ana").unwrap();
    }
}
