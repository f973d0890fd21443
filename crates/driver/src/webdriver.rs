//! W3C WebDriver client over HTTP
//!
//! Talks to chromedriver, geckodriver or a Selenium Grid. Every command is a
//! JSON request against `/session/{id}/...`; responses carry their payload in
//! `value`, and failures carry `value.error` / `value.message`.

use async_trait::async_trait;
use quest_common::{Browser, DriverConfig, Error, Result};
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::by::By;
use crate::driver::{Cookie, Driver, ElementId};

/// Session against a remote WebDriver endpoint
pub struct WebDriverClient {
    http: reqwest::Client,
    endpoint: String,
    session_id: String,
}

fn transport(e: reqwest::Error) -> Error {
    Error::Transport(e.to_string())
}

impl WebDriverClient {
    /// Start a new browser session
    pub async fn connect(config: &DriverConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(transport)?;
        let endpoint = config.url.trim_end_matches('/').to_string();

        info!("Starting {} session at {}", config.browser.as_str(), endpoint);

        let body = json!({
            "capabilities": { "alwaysMatch": Self::capabilities(config) }
        });
        let value = Self::send(&http, Method::POST, &format!("{}/session", endpoint), Some(body)).await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Transport(format!("No sessionId in response: {}", value)))?
            .to_string();

        debug!("WebDriver session {} created", session_id);
        Ok(Self {
            http,
            endpoint,
            session_id,
        })
    }

    /// Capabilities requested for the configured browser
    pub fn capabilities(config: &DriverConfig) -> Value {
        let mut args = config.args.clone();
        match config.browser {
            Browser::Chrome | Browser::Edge => {
                if config.headless {
                    args.push("--headless=new".to_string());
                }
                let options_key = if config.browser == Browser::Chrome {
                    "goog:chromeOptions"
                } else {
                    "ms:edgeOptions"
                };
                json!({
                    "browserName": config.browser.as_str(),
                    options_key: { "args": args },
                })
            }
            Browser::Firefox => {
                if config.headless {
                    args.push("-headless".to_string());
                }
                json!({
                    "browserName": "firefox",
                    "moz:firefoxOptions": { "args": args },
                })
            }
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn send(http: &reqwest::Client, method: Method, url: &str, body: Option<Value>) -> Result<Value> {
        trace!("WebDriver {} {}", method, url);

        let mut request = http.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let payload: Value = response.json().await.map_err(transport)?;
        let value = payload.get("value").cloned().unwrap_or(Value::Null);

        if !status.is_success() {
            let error = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(Error::from_webdriver(error, message));
        }

        Ok(value)
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = format!("{}/session/{}{}", self.endpoint, self.session_id, path);
        Self::send(&self.http, method, &url, body).await
    }

    async fn element_get(&self, element: &ElementId, suffix: &str) -> Result<Value> {
        self.command(Method::GET, &format!("/element/{}/{}", element, suffix), None)
            .await
    }

    async fn element_post(&self, element: &ElementId, suffix: &str, body: Value) -> Result<Value> {
        self.command(Method::POST, &format!("/element/{}/{}", element, suffix), Some(body))
            .await
    }
}

fn as_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Driver for WebDriverClient {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(as_string(self.command(Method::GET, "/url", None).await?))
    }

    async fn title(&self) -> Result<String> {
        Ok(as_string(self.command(Method::GET, "/title", None).await?))
    }

    async fn find_elements(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        let (using, value) = by.to_w3c();
        let path = match root {
            Some(root) => format!("/element/{}/elements", root),
            None => "/elements".to_string(),
        };
        let found = self
            .command(Method::POST, &path, Some(json!({ "using": using, "value": value })))
            .await?;

        Ok(found
            .as_array()
            .map(|items| items.iter().filter_map(ElementId::from_json).collect())
            .unwrap_or_default())
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.element_post(element, "click", json!({})).await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        self.element_post(element, "clear", json!({})).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        self.element_post(element, "value", json!({ "text": text }))
            .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        Ok(as_string(self.element_get(element, "text").await?))
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        let value = self
            .element_get(element, &format!("attribute/{}", name))
            .await?;
        Ok(match value {
            Value::Null => None,
            other => Some(as_string(other)),
        })
    }

    async fn tag_name(&self, element: &ElementId) -> Result<String> {
        Ok(as_string(self.element_get(element, "name").await?))
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        Ok(self
            .element_get(element, "displayed")
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        Ok(self
            .element_get(element, "enabled")
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        Ok(self
            .element_get(element, "selected")
            .await?
            .as_bool()
            .unwrap_or(false))
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.command(
            Method::POST,
            "/execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn alert_text(&self) -> Result<String> {
        Ok(as_string(self.command(Method::GET, "/alert/text", None).await?))
    }

    async fn accept_alert(&self) -> Result<()> {
        self.command(Method::POST, "/alert/accept", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn dismiss_alert(&self) -> Result<()> {
        self.command(Method::POST, "/alert/dismiss", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        let value = self.command(Method::GET, "/cookie", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<()> {
        self.command(Method::POST, "/cookie", Some(json!({ "cookie": cookie })))
            .await?;
        Ok(())
    }

    async fn delete_cookies(&self) -> Result<()> {
        self.command(Method::DELETE, "/cookie", None).await?;
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        info!("Closing WebDriver session {}", self.session_id);
        self.command(Method::DELETE, "", None).await?;
        Ok(())
    }
}
