//! The browser-driver seam
//!
//! Everything Quest does to a browser goes through [`Driver`]. The production
//! implementation speaks W3C WebDriver over HTTP; tests use the in-memory
//! [`FakeBrowser`](crate::fake::FakeBrowser).

use async_trait::async_trait;
use quest_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::by::By;

/// Key under which W3C WebDriver serializes element references
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque reference to an element inside the browser
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element reference as a script argument
    pub fn to_json(&self) -> Value {
        json!({ W3C_ELEMENT_KEY: self.0 })
    }

    /// Parse an element reference returned by the driver
    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .get(W3C_ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(ElementId::new)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<u64>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            secure: None,
            http_only: None,
            expiry: None,
        }
    }
}

/// Raw browser operations, one request each; no waiting and no recovery
#[async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    /// Find elements in document order, below `root` or in the whole page
    async fn find_elements(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>>;

    async fn click(&self, element: &ElementId) -> Result<()>;

    async fn clear(&self, element: &ElementId) -> Result<()>;

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()>;

    async fn text(&self, element: &ElementId) -> Result<String>;

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>>;

    async fn tag_name(&self, element: &ElementId) -> Result<String>;

    async fn is_displayed(&self, element: &ElementId) -> Result<bool>;

    async fn is_enabled(&self, element: &ElementId) -> Result<bool>;

    async fn is_selected(&self, element: &ElementId) -> Result<bool>;

    /// Whether [`Driver::execute_script`] is available
    fn supports_script(&self) -> bool {
        true
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value>;

    async fn alert_text(&self) -> Result<String>;

    async fn accept_alert(&self) -> Result<()>;

    async fn dismiss_alert(&self) -> Result<()>;

    async fn cookies(&self) -> Result<Vec<Cookie>>;

    async fn add_cookie(&self, cookie: &Cookie) -> Result<()>;

    async fn delete_cookies(&self) -> Result<()>;

    async fn quit(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_reference_json() {
        let id = ElementId::new("abc-123");
        let json = id.to_json();
        assert_eq!(json[W3C_ELEMENT_KEY], "abc-123");
        assert_eq!(ElementId::from_json(&json), Some(id));
        assert_eq!(ElementId::from_json(&json!({"other": 1})), None);
    }

    #[test]
    fn test_cookie_wire_format() {
        let mut cookie = Cookie::new("session", "t0k3n");
        cookie.http_only = Some(true);
        let json = serde_json::to_value(&cookie).unwrap();
        assert_eq!(json["httpOnly"], true);
        assert!(json.get("domain").is_none());
    }
}
