//! Smart driver and element decorators
//!
//! [`SmartDriver`] and [`SmartElement`] wrap a raw [`Driver`] and add:
//! - a best-effort wait before every lookup (a timed-out wait is ignored and
//!   the direct lookup runs anyway)
//! - lookup failures that name the locator
//! - recovery for stale references (re-located once from their locator) and
//!   intercepted clicks (scroll into view, then a script click)
//! - an optional shadow-root search when a plain lookup finds nothing
//!
//! With `use_wrapped_functions` off every call goes straight to the driver.

use quest_common::{Error, ErrorKind, QuestConfig, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::by::By;
use crate::driver::{Cookie, Driver, ElementId};
use crate::shadow;
use crate::wait::{best_effort, wait_until};

const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";
const SCRIPT_CLICK: &str = "arguments[0].click();";

/// Behaviour switches for the smart layer
#[derive(Debug, Clone)]
pub struct SmartSettings {
    pub wait: Duration,
    pub poll: Duration,
    pub wrapped: bool,
    pub shadow_root: bool,
    pub base_url: Option<String>,
}

impl Default for SmartSettings {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            poll: Duration::from_millis(100),
            wrapped: true,
            shadow_root: false,
            base_url: None,
        }
    }
}

impl SmartSettings {
    pub fn from_config(config: &QuestConfig) -> Self {
        Self {
            wait: config.wait_duration(),
            poll: config.poll_interval(),
            wrapped: config.driver.use_wrapped_functions,
            shadow_root: config.driver.use_shadow_root,
            base_url: config.driver.base_url.clone(),
        }
    }
}

/// Driver handle shared by every component of one browser session
#[derive(Clone)]
pub struct SmartDriver {
    inner: Arc<dyn Driver>,
    settings: Arc<SmartSettings>,
}

impl SmartDriver {
    pub fn new(inner: Arc<dyn Driver>, settings: SmartSettings) -> Self {
        Self {
            inner,
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(inner: Arc<dyn Driver>, config: &QuestConfig) -> Self {
        Self::new(inner, SmartSettings::from_config(config))
    }

    /// The undecorated driver
    pub fn raw(&self) -> &dyn Driver {
        self.inner.as_ref()
    }

    pub fn settings(&self) -> &SmartSettings {
        &self.settings
    }

    /// Join relative URLs onto the configured base URL
    pub fn resolve_url(&self, url: &str) -> String {
        match &self.settings.base_url {
            Some(base) if !url.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        let url = self.resolve_url(url);
        debug!("Navigating to {}", url);
        self.inner.navigate(&url).await
    }

    pub async fn current_url(&self) -> Result<String> {
        self.inner.current_url().await
    }

    pub async fn title(&self) -> Result<String> {
        self.inner.title().await
    }

    /// Plain lookup, then the shadow-root search when enabled and nothing matched
    async fn search(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        let found = self.inner.find_elements(root, by).await?;
        if found.is_empty() && self.settings.shadow_root && self.inner.supports_script() {
            return shadow::find_in_shadow(self.inner.as_ref(), root, by).await;
        }
        Ok(found)
    }

    async fn locate(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        if !self.settings.wrapped {
            return self.inner.find_elements(root, by).await;
        }

        let waited = best_effort(
            &by.to_string(),
            self.settings.wait,
            self.settings.poll,
            move || async move {
                let found = self.search(root, by).await?;
                Ok::<_, Error>((!found.is_empty()).then_some(found))
            },
        )
        .await;

        match waited {
            Ok(Some(found)) => return Ok(found),
            Ok(None) => {}
            Err(e) => warn!("Wait for {} failed, looking up directly: {}", by, e),
        }
        self.search(root, by).await
    }

    fn wrap(&self, root: Option<&ElementId>, by: &By, found: Vec<ElementId>) -> Vec<SmartElement> {
        found
            .into_iter()
            .enumerate()
            .map(|(index, id)| SmartElement {
                driver: self.clone(),
                id,
                origin: Some(Origin {
                    root: root.cloned(),
                    by: by.clone(),
                    index,
                }),
            })
            .collect()
    }

    /// All matches below `root` (or in the page), after a best-effort wait
    pub async fn find_elements_in(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<SmartElement>> {
        let found = self.locate(root, by).await?;
        Ok(self.wrap(root, by, found))
    }

    /// First match below `root` (or in the page); `NotFound` names the locator
    pub async fn find_element_in(&self, root: Option<&ElementId>, by: &By) -> Result<SmartElement> {
        self.find_elements_in(root, by)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(by.to_string()))
    }

    pub async fn find_element(&self, by: &By) -> Result<SmartElement> {
        self.find_element_in(None, by).await
    }

    pub async fn find_elements(&self, by: &By) -> Result<Vec<SmartElement>> {
        self.find_elements_in(None, by).await
    }

    /// Immediate lookup without waiting, for checks where absence is a valid answer
    pub async fn scan(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<SmartElement>> {
        let found = self.inner.find_elements(root, by).await?;
        Ok(self.wrap(root, by, found))
    }

    /// Wait until no displayed element matches `by`
    pub async fn wait_until_gone(&self, root: Option<&ElementId>, by: &By, timeout: Duration) -> Result<()> {
        let inner = &self.inner;
        wait_until(
            &format!("{} to disappear", by),
            timeout,
            self.settings.poll,
            move || async move {
                for id in inner.find_elements(root, by).await? {
                    match inner.is_displayed(&id).await {
                        Ok(true) => return Ok(None),
                        Ok(false) => {}
                        Err(e) if e.kind() == ErrorKind::StaleElement => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok::<_, Error>(Some(()))
            },
        )
        .await
    }

    /// Run a script; a driver without script support is an illegal state
    pub async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        if !self.inner.supports_script() {
            return Err(Error::IllegalState(
                "the underlying driver does not support script execution".to_string(),
            ));
        }
        self.inner.execute_script(script, args).await
    }

    async fn await_alert(&self) {
        if !self.settings.wrapped {
            return;
        }
        let inner = &self.inner;
        let _ = best_effort("alert", self.settings.wait, self.settings.poll, move || async move {
            inner.alert_text().await.map(Some)
        })
        .await;
    }

    pub async fn alert_text(&self) -> Result<String> {
        self.await_alert().await;
        self.inner.alert_text().await
    }

    pub async fn accept_alert(&self) -> Result<()> {
        self.await_alert().await;
        self.inner.accept_alert().await
    }

    pub async fn dismiss_alert(&self) -> Result<()> {
        self.await_alert().await;
        self.inner.dismiss_alert().await
    }

    pub async fn cookies(&self) -> Result<Vec<Cookie>> {
        self.inner.cookies().await
    }

    pub async fn add_cookie(&self, cookie: &Cookie) -> Result<()> {
        self.inner.add_cookie(cookie).await
    }

    pub async fn delete_cookies(&self) -> Result<()> {
        self.inner.delete_cookies().await
    }

    pub async fn quit(&self) -> Result<()> {
        self.inner.quit().await
    }
}

/// Where an element was found, so a stale reference can be looked up again
#[derive(Debug, Clone)]
struct Origin {
    root: Option<ElementId>,
    by: By,
    index: usize,
}

/// Element handle bound to a [`SmartDriver`]
#[derive(Clone)]
pub struct SmartElement {
    driver: SmartDriver,
    id: ElementId,
    origin: Option<Origin>,
}

/// Run a raw driver call on the element, re-locating it once if it went stale
macro_rules! relocating {
    ($self:ident, $op:ident ( $($arg:expr),* )) => {
        match $self.driver.inner.$op(&$self.id $(, $arg)*).await {
            Err(e) if $self.recoverable(&e) => {
                let fresh = $self.relocate().await?;
                fresh.driver.inner.$op(&fresh.id $(, $arg)*).await
            }
            other => other,
        }
    };
}

impl SmartElement {
    /// Wrap a bare element reference; it cannot be re-located when stale
    pub fn new(driver: SmartDriver, id: ElementId) -> Self {
        Self {
            driver,
            id,
            origin: None,
        }
    }

    pub fn id(&self) -> &ElementId {
        &self.id
    }

    pub fn driver(&self) -> &SmartDriver {
        &self.driver
    }

    pub async fn find_element(&self, by: &By) -> Result<SmartElement> {
        self.driver.find_element_in(Some(&self.id), by).await
    }

    pub async fn find_elements(&self, by: &By) -> Result<Vec<SmartElement>> {
        self.driver.find_elements_in(Some(&self.id), by).await
    }

    /// Immediate scoped lookup without waiting
    pub async fn scan(&self, by: &By) -> Result<Vec<SmartElement>> {
        self.driver.scan(Some(&self.id), by).await
    }

    fn recoverable(&self, e: &Error) -> bool {
        self.driver.settings.wrapped && e.kind() == ErrorKind::StaleElement && self.origin.is_some()
    }

    async fn relocate(&self) -> Result<SmartElement> {
        let Some(origin) = &self.origin else {
            return Err(Error::StaleElement(format!("{} has no locator", self.id)));
        };
        warn!("Element {} went stale, locating again via {}", self.id, origin.by);

        let found = self
            .driver
            .inner
            .find_elements(origin.root.as_ref(), &origin.by)
            .await?;
        let id = found
            .into_iter()
            .nth(origin.index)
            .ok_or_else(|| Error::not_found(origin.by.to_string()))?;

        Ok(SmartElement {
            driver: self.driver.clone(),
            id,
            origin: self.origin.clone(),
        })
    }

    pub async fn click(&self) -> Result<()> {
        match self.driver.inner.click(&self.id).await {
            Ok(()) => Ok(()),
            Err(e) if !self.driver.settings.wrapped => Err(e),
            Err(e) if self.recoverable(&e) => {
                let fresh = self.relocate().await?;
                fresh.driver.inner.click(&fresh.id).await
            }
            Err(e) if e.kind() == ErrorKind::ClickIntercepted => self.click_past_overlay(e).await,
            Err(e) => Err(e),
        }
    }

    async fn click_past_overlay(&self, cause: Error) -> Result<()> {
        if !self.driver.inner.supports_script() {
            return Err(cause);
        }
        warn!("Click on {} intercepted, scrolling into view: {}", self.id, cause);

        self.driver
            .execute_script(SCROLL_INTO_VIEW, vec![self.id.to_json()])
            .await?;
        match self.driver.inner.click(&self.id).await {
            Err(e) if e.kind() == ErrorKind::ClickIntercepted => {
                debug!("Falling back to script click on {}", self.id);
                self.driver
                    .execute_script(SCRIPT_CLICK, vec![self.id.to_json()])
                    .await?;
                Ok(())
            }
            other => other,
        }
    }

    pub async fn clear(&self) -> Result<()> {
        relocating!(self, clear())
    }

    pub async fn send_keys(&self, text: &str) -> Result<()> {
        relocating!(self, send_keys(text))
    }

    pub async fn clear_and_send_keys(&self, text: &str) -> Result<()> {
        self.clear().await?;
        self.send_keys(text).await
    }

    pub async fn text(&self) -> Result<String> {
        relocating!(self, text())
    }

    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        relocating!(self, attribute(name))
    }

    /// `value` attribute, empty when absent
    pub async fn value(&self) -> Result<String> {
        Ok(self.attribute("value").await?.unwrap_or_default())
    }

    pub async fn has_class(&self, class: &str) -> Result<bool> {
        Ok(self
            .attribute("class")
            .await?
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false))
    }

    pub async fn tag_name(&self) -> Result<String> {
        relocating!(self, tag_name())
    }

    pub async fn is_displayed(&self) -> Result<bool> {
        relocating!(self, is_displayed())
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        relocating!(self, is_enabled())
    }

    pub async fn is_selected(&self) -> Result<bool> {
        relocating!(self, is_selected())
    }

    pub async fn scroll_into_view(&self) -> Result<()> {
        self.driver
            .execute_script(SCROLL_INTO_VIEW, vec![self.id.to_json()])
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for SmartElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartElement")
            .field("id", &self.id)
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests;
