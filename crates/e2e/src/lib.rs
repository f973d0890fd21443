//! Quest E2E Scenario Framework
//!
//! Declarative YAML scenarios executed step by step through a [`Quest`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  ScenarioRunner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  DriverProvider::open() -> Arc<dyn Driver>                  │
//! │    ├── WebDriverProvider (chromedriver, geckodriver, Grid)  │
//! │    └── any other DriverProvider (in-memory pages in tests)  │
//! │  run_scenario(&Scenario) -> ScenarioResult                  │
//! │  write_results(&SuiteResult) -> scenario-results.json       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags                              │
//! │    ├── login { username, password, url?, landing? }         │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── click / insert / select / radio / toggle ...   │
//! │          │     { ..., type?, within? }                      │
//! │          ├── assert_alert / assert_input / assert_table     │
//! │          └── assert_query { sql, rows?, first_row? }        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Quest`]: quest_core::Quest

pub mod error;
pub mod runner;
pub mod scenario;

pub use error::{E2eError, E2eResult};
pub use runner::{
    DriverProvider, RunnerConfig, ScenarioResult, ScenarioRunner, StepResult, SuiteResult,
    WebDriverProvider,
};
pub use scenario::{Scenario, ScenarioLogin, Step};
