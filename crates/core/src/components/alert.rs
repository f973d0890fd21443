//! In-page alerts and snack bars
//!
//! These are DOM notifications, not the browser's native `alert()` dialog;
//! the latter is handled directly on [`SmartDriver`].

use async_trait::async_trait;
use quest_common::{Error, ErrorKind, Result, ResultExt};
use quest_driver::{By, SmartDriver, SmartElement};

use super::{BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Alert: Send + Sync {
    /// Message of the first visible alert
    async fn text(&self, container: &Container) -> Result<String>;

    async fn is_visible(&self, container: &Container) -> Result<bool>;

    async fn close(&self, container: &Container) -> Result<()>;
}

component_types! {
    pub enum AlertType: dyn Alert for Concept::Alert {
        Bootstrap = "BOOTSTRAP_ALERT" in BOOTSTRAP => StyledAlert::bootstrap,
        Material = "MATERIAL_ALERT" in MATERIAL => StyledAlert::material,
    }
}

pub struct StyledAlert {
    driver: SmartDriver,
    selector: &'static str,
    /// Element holding the message; the alert itself when `None`
    message: Option<&'static str>,
    close: &'static str,
}

impl StyledAlert {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: ".alert",
            message: None,
            close: ".btn-close",
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: "mat-snack-bar-container, .mat-mdc-snack-bar-container",
            message: Some(".mat-mdc-snack-bar-label"),
            close: ".mat-mdc-snack-bar-actions button",
        }
    }

    async fn visible(&self, container: &Container, wait: bool) -> Result<Option<SmartElement>> {
        let by = By::css(self.selector);
        let candidates = if wait {
            container.find_all(&self.driver, &by).await?
        } else {
            container.scan(&self.driver, &by).await?
        };
        for alert in candidates {
            if alert
                .is_displayed()
                .await
                .recover(ErrorKind::StaleElement, false)?
            {
                return Ok(Some(alert));
            }
        }
        Ok(None)
    }

    async fn require(&self, container: &Container) -> Result<SmartElement> {
        self.visible(container, true)
            .await?
            .ok_or_else(|| Error::not_found(format!("visible alert ({})", self.selector)))
    }
}

#[async_trait]
impl Alert for StyledAlert {
    async fn text(&self, container: &Container) -> Result<String> {
        let alert = self.require(container).await?;
        let text = match self.message {
            Some(message) => alert.find_element(&By::css(message)).await?.text().await?,
            None => alert.text().await?,
        };
        Ok(text.trim().to_string())
    }

    async fn is_visible(&self, container: &Container) -> Result<bool> {
        Ok(self.visible(container, false).await?.is_some())
    }

    async fn close(&self, container: &Container) -> Result<()> {
        self.require(container)
            .await?
            .find_element(&By::css(self.close))
            .await?
            .click()
            .await
    }
}

pub type AlertService = ComponentService<AlertType>;

impl ComponentService<AlertType> {
    pub async fn text(&self, container: &Container) -> Result<String> {
        self.component(None)?.text(container).await
    }

    pub async fn text_as(&self, ty: AlertType, container: &Container) -> Result<String> {
        self.get_or_create(ty).text(container).await
    }

    pub async fn is_visible(&self, container: &Container) -> Result<bool> {
        self.component(None)?.is_visible(container).await
    }

    pub async fn is_visible_as(&self, ty: AlertType, container: &Container) -> Result<bool> {
        self.get_or_create(ty).is_visible(container).await
    }

    pub async fn close(&self, container: &Container) -> Result<()> {
        self.component(None)?.close(container).await
    }

    pub async fn close_as(&self, ty: AlertType, container: &Container) -> Result<()> {
        self.get_or_create(ty).close(container).await
    }
}
