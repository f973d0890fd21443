//! Authenticated session cache
//!
//! Logging in through the UI is slow, so sessions are cached per
//! `(username, password, client type)` and replayed as cookies. Concurrent
//! first logins with the same credentials may both authenticate; only one
//! session is kept.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use quest_common::Result;
use quest_driver::{By, Cookie, SmartDriver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LoginKey {
    pub username: String,
    pub password: String,
    pub client_type: String,
}

impl LoginKey {
    pub fn new(username: &str, password: &str, client_type: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            client_type: client_type.to_string(),
        }
    }
}

impl fmt::Debug for LoginKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginKey")
            .field("username", &self.username)
            .field("password", &"***")
            .field("client_type", &self.client_type)
            .finish()
    }
}

/// What a successful login leaves behind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginSession {
    pub username: String,
    pub client_type: String,
    pub cookies: Vec<Cookie>,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoginSession {
    pub fn new(username: &str, client_type: &str, cookies: Vec<Cookie>) -> Self {
        Self {
            username: username.to_string(),
            client_type: client_type.to_string(),
            cookies,
            token: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// One way of obtaining a session for a user
#[async_trait]
pub trait LoginClient: Send + Sync {
    /// Distinguishes sessions obtained through different channels
    fn client_type(&self) -> &str;

    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginSession>;
}

/// Caching front for a [`LoginClient`]
pub struct BaseLoginClient {
    client: Arc<dyn LoginClient>,
    sessions: DashMap<LoginKey, LoginSession>,
}

impl BaseLoginClient {
    pub fn new(client: Arc<dyn LoginClient>) -> Self {
        Self {
            client,
            sessions: DashMap::new(),
        }
    }

    pub fn client_type(&self) -> &str {
        self.client.client_type()
    }

    /// Cached session for the credentials, authenticating on a miss
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession> {
        let key = LoginKey::new(username, password, self.client.client_type());
        if let Some(session) = self.cached(&key) {
            debug!("Reusing {} session for '{}'", key.client_type, username);
            return Ok(session);
        }

        let session = self.client.authenticate(username, password).await?;
        info!("Logged in '{}' via {}", username, key.client_type);

        let stored = self.sessions.entry(key).or_insert(session).value().clone();
        Ok(stored)
    }

    pub fn cached(&self, key: &LoginKey) -> Option<LoginSession> {
        self.sessions.get(key).map(|s| s.value().clone())
    }

    /// Drop the cached session so the next login authenticates again
    pub fn invalidate(&self, username: &str, password: &str) -> bool {
        let key = LoginKey::new(username, password, self.client.client_type());
        self.sessions.remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Logs in by filling a username/password form and keeps the resulting cookies
pub struct FormLoginClient {
    driver: SmartDriver,
    url: String,
    username_field: By,
    password_field: By,
    submit: By,
}

impl FormLoginClient {
    pub fn new(driver: SmartDriver, url: impl Into<String>) -> Self {
        Self {
            driver,
            url: url.into(),
            username_field: By::name("username"),
            password_field: By::name("password"),
            submit: By::css("button[type=submit]"),
        }
    }

    pub fn with_fields(mut self, username: By, password: By, submit: By) -> Self {
        self.username_field = username;
        self.password_field = password;
        self.submit = submit;
        self
    }
}

#[async_trait]
impl LoginClient for FormLoginClient {
    fn client_type(&self) -> &str {
        "form"
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<LoginSession> {
        self.driver.navigate(&self.url).await?;
        self.driver
            .find_element(&self.username_field)
            .await?
            .clear_and_send_keys(username)
            .await?;
        self.driver
            .find_element(&self.password_field)
            .await?
            .clear_and_send_keys(password)
            .await?;
        self.driver.find_element(&self.submit).await?.click().await?;

        let cookies = self.driver.cookies().await?;
        Ok(LoginSession::new(username, self.client_type(), cookies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::browser;
    use quest_driver::Node;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct SlowClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LoginClient for SlowClient {
        fn client_type(&self) -> &str {
            "api"
        }

        async fn authenticate(&self, username: &str, _password: &str) -> Result<LoginSession> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(LoginSession::new(username, "api", Vec::new()).with_token(format!("token-{}", call)))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_logins_keep_one_session() {
        let client = Arc::new(SlowClient {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(BaseLoginClient::new(client.clone()));

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.login("ana", "pw").await }
        });
        let second = tokio::spawn({
            let cache = cache.clone();
            async move { cache.login("ana", "pw").await }
        });
        let a = first.await.unwrap().unwrap();
        let b = second.await.unwrap().unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(a, b);

        let calls = client.calls.load(Ordering::SeqCst);
        let again = cache.login("ana", "pw").await.unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), calls);
        assert_eq!(Some(again), cache.cached(&LoginKey::new("ana", "pw", "api")));
    }

    #[tokio::test]
    async fn test_sessions_are_keyed_by_password() {
        let cache = BaseLoginClient::new(Arc::new(SlowClient {
            calls: AtomicUsize::new(0),
        }));

        cache.login("ana", "one").await.unwrap();
        cache.login("ana", "two").await.unwrap();
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate("ana", "one"));
        assert!(!cache.invalidate("ana", "one"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_debug_masks_password() {
        let shown = format!("{:?}", LoginKey::new("ana", "hunter2", "form"));
        assert!(shown.contains("ana"));
        assert!(!shown.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_form_login_fills_and_submits() {
        let (fake, driver) = browser(Node::new("form").children([
            Node::new("input").attr("name", "username"),
            Node::new("input").attr("name", "password").attr("type", "password"),
            Node::new("button").attr("type", "submit").text("Sign in"),
        ]));
        driver.add_cookie(&Cookie::new("sid", "abc")).await.unwrap();
        let client = FormLoginClient::new(driver, "/login");

        let session = client.authenticate("ana", "pw").await.unwrap();

        assert_eq!(fake.value_of("input[name=username]"), "ana");
        assert_eq!(fake.value_of("input[name=password]"), "pw");
        assert_eq!(fake.clicked(), vec!["Sign in"]);
        assert_eq!(session.cookies, vec![Cookie::new("sid", "abc")]);
        assert_eq!(session.client_type, "form");
    }
}
