//! Hooks around a quest's lifetime

use async_trait::async_trait;
use quest_common::Result;
use std::sync::Arc;
use tracing::debug;

use crate::login::BaseLoginClient;
use crate::quest::Quest;

/// Runs when enabled on a quest and again when the quest completes
#[async_trait]
pub trait QuestExtension: Send + Sync {
    fn name(&self) -> &str;

    async fn before(&self, _quest: &mut Quest) -> Result<()> {
        Ok(())
    }

    async fn after(&self, _quest: &mut Quest) -> Result<()> {
        Ok(())
    }
}

/// Starts the quest already signed in, replaying a cached session's cookies
pub struct LoginExtension {
    logins: Arc<BaseLoginClient>,
    username: String,
    password: String,
    landing: Option<String>,
}

impl LoginExtension {
    pub fn new(logins: Arc<BaseLoginClient>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            logins,
            username: username.into(),
            password: password.into(),
            landing: None,
        }
    }

    /// Page to open once the cookies are in place
    pub fn landing(mut self, url: impl Into<String>) -> Self {
        self.landing = Some(url.into());
        self
    }
}

#[async_trait]
impl QuestExtension for LoginExtension {
    fn name(&self) -> &str {
        "login"
    }

    async fn before(&self, quest: &mut Quest) -> Result<()> {
        let session = self.logins.login(&self.username, &self.password).await?;
        for cookie in &session.cookies {
            quest.driver().add_cookie(cookie).await?;
        }
        debug!(
            "Applied {} cookie(s) for '{}'",
            session.cookies.len(),
            session.username
        );

        if let Some(url) = &self.landing {
            quest.navigate(url).await?;
        }
        quest.storage_mut().put("login.session", &session)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::login::{LoginClient, LoginSession};
    use quest_common::QuestConfig;
    use quest_driver::{Cookie, FakeBrowser, Node};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CookieClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LoginClient for CookieClient {
        fn client_type(&self) -> &str {
            "api"
        }

        async fn authenticate(&self, username: &str, _password: &str) -> Result<LoginSession> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(LoginSession::new(
                username,
                "api",
                vec![Cookie::new("sid", "s-1")],
            ))
        }
    }

    #[tokio::test]
    async fn test_login_extension_shares_sessions_across_quests() {
        let client = Arc::new(CookieClient {
            calls: AtomicUsize::new(0),
        });
        let logins = Arc::new(BaseLoginClient::new(client.clone()));

        for _ in 0..2 {
            let fake = Arc::new(
                FakeBrowser::blank().with_route("/home", Node::new("h1").text("Welcome")),
            );
            let mut quest = Quest::new(fake.clone(), Arc::new(QuestConfig::default()));
            quest
                .enable(LoginExtension::new(logins.clone(), "ana", "pw").landing("/home"))
                .await
                .unwrap();

            assert_eq!(fake.url(), "/home");
            let cookies = quest.driver().cookies().await.unwrap();
            assert_eq!(cookies, vec![Cookie::new("sid", "s-1")]);
            let stored: LoginSession = quest.storage().get("login.session").unwrap().unwrap();
            assert_eq!(stored.username, "ana");
        }

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
