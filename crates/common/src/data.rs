//! Test data repository
//!
//! Every `.yaml`, `.yml` or `.json` file below the data directory becomes a
//! document keyed by its file stem. Values are addressed with dotted paths:
//! `users.admin.password` reads `password` from the `admin` entry of
//! `users.yaml`. Array elements are addressed by index (`orders.0.id`).

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

/// Typed test data bound to a fixed repository path
pub trait TestData: DeserializeOwned {
    /// Dotted path of this data within the repository
    const KEY: &'static str;
}

/// In-memory set of test data documents
#[derive(Debug, Clone, Default)]
pub struct DataRepository {
    documents: HashMap<String, Value>,
}

impl DataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every data file under `dir`
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut repo = Self::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };

            let content = std::fs::read_to_string(path)?;
            let value: Value = match ext {
                "yaml" | "yml" => serde_yaml::from_str(&content)?,
                "json" => serde_json::from_str(&content)?,
                _ => continue,
            };

            debug!("Loaded test data '{}' from {}", stem, path.display());
            repo.documents.insert(stem, value);
        }

        Ok(repo)
    }

    /// Register a document directly
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.documents.insert(name.into(), value);
    }

    /// Raw value at a dotted path
    pub fn value(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.documents.get(parts.next()?)?;

        for part in parts {
            current = match current {
                Value::Object(map) => map.get(part)?,
                Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Deserialize the value at a dotted path
    pub fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self
            .value(path)
            .ok_or_else(|| Error::Configuration(format!("No test data at '{}'", path)))?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Deserialize a [`TestData`] type from its own key
    pub fn load<T: TestData>(&self) -> Result<T> {
        self.get(T::KEY)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.value(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Credentials {
        username: String,
        password: String,
    }

    impl TestData for Credentials {
        const KEY: &'static str = "users.admin";
    }

    #[test]
    fn test_load_dir_yaml_and_json() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("users.yaml"),
            "admin:\n  username: admin\n  password: s3cret\n",
        )
        .unwrap();
        std::fs::create_dir_all(tmp.path().join("orders")).unwrap();
        std::fs::write(
            tmp.path().join("orders").join("orders.json"),
            r#"[{"id": 7}, {"id": 9}]"#,
        )
        .unwrap();
        std::fs::write(tmp.path().join("README.md"), "ignored").unwrap();

        let repo = DataRepository::load_dir(tmp.path()).unwrap();

        let admin: Credentials = repo.load().unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(repo.get::<u32>("orders.1.id").unwrap(), 9);
        assert!(!repo.contains("README"));
    }

    #[test]
    fn test_missing_path_is_configuration_error() {
        let mut repo = DataRepository::new();
        repo.insert("users", json!({ "guest": { "username": "g" } }));

        assert!(repo.contains("users.guest.username"));
        let err = repo.get::<String>("users.admin.username").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
    }
}
