//! Quest Common Library
//!
//! Shared types and utilities for the Quest UI test automation framework.

pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod strategy;
pub mod text;

// Re-export commonly used types
pub use config::{Browser, DriverConfig, QuestConfig, WaitConfig};
pub use data::{DataRepository, TestData};
pub use db::{QueryResponse, QueryRunner};
pub use error::{Error, ErrorKind, Result, ResultExt};
pub use strategy::Strategy;
pub use text::{contains_text, matches_text};

/// Quest version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
