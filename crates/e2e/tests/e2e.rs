//! Scenario harness entry point
//!
//! Runs the YAML scenarios under `--scenarios` against a WebDriver endpoint.
//! Run with: cargo test --package quest-e2e --test e2e -- --config quest.toml

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use quest_common::{DataRepository, QueryRunner, QuestConfig};
use quest_e2e::{RunnerConfig, ScenarioRunner, SuiteResult, WebDriverProvider};

#[derive(Parser, Debug)]
#[command(name = "quest-e2e")]
#[command(about = "Scenario runner for Quest")]
struct Args {
    /// Path to the scenarios directory
    #[arg(short, long, default_value = "tests/scenarios")]
    scenarios: PathBuf,

    /// Quest configuration file (TOML); QUEST_* variables override it
    #[arg(short, long, default_value = "quest.toml")]
    config: PathBuf,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only the scenario with this name
    #[arg(short, long)]
    name: Option<String>,

    /// WebDriver endpoint, overriding the configuration
    #[arg(long, env = "QUEST_DRIVER_URL")]
    driver_url: Option<String>,

    /// Base URL of the application under test
    #[arg(long)]
    base_url: Option<String>,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> anyhow::Result<bool> {
    if !args.scenarios.is_dir() {
        println!("No scenarios under {}; nothing to run", args.scenarios.display());
        return Ok(true);
    }

    let mut config = QuestConfig::load_with_env(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(url) = args.driver_url {
        config.driver.url = url;
    }
    if let Some(base_url) = args.base_url {
        config.driver.base_url = Some(base_url);
    }

    let data = if config.data.dir.is_dir() {
        Some(Arc::new(
            DataRepository::load_dir(&config.data.dir)
                .with_context(|| format!("loading test data from {}", config.data.dir.display()))?,
        ))
    } else {
        None
    };

    let db = config
        .data
        .database
        .as_ref()
        .map(|path| {
            QueryRunner::open(path).with_context(|| format!("opening database {}", path.display()))
        })
        .transpose()?;

    let mut runner = ScenarioRunner::new(
        Arc::new(config),
        Arc::new(WebDriverProvider),
        RunnerConfig {
            scenarios_dir: args.scenarios,
            output_dir: args.output,
        },
    );
    if let Some(data) = data {
        runner = runner.with_data(data);
    }
    if let Some(db) = db {
        runner = runner.with_db(db);
    }

    let results = if let Some(name) = args.name {
        let result = runner.run_named(&name).await?;
        SuiteResult {
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;
    Ok(results.failed == 0)
}
