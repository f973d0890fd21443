//! Buttons

use async_trait::async_trait;
use quest_common::{ErrorKind, Result, ResultExt};
use quest_driver::{By, SmartDriver, SmartElement};

use super::{by_text, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Button: Send + Sync {
    /// Click the button whose text matches `text`
    async fn click(&self, container: &Container, text: &str) -> Result<()>;

    async fn click_element(&self, element: &SmartElement) -> Result<()>;

    async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool>;

    /// Whether a matching button is on the page and displayed
    async fn is_visible(&self, container: &Container, text: &str) -> Result<bool>;
}

component_types! {
    pub enum ButtonType: dyn Button for Concept::Button {
        Bootstrap = "BOOTSTRAP_BUTTON" in BOOTSTRAP => StyledButton::bootstrap,
        Material = "MATERIAL_BUTTON" in MATERIAL => StyledButton::material,
    }
}

/// Button recognised by its framework classes
pub struct StyledButton {
    driver: SmartDriver,
    selector: &'static str,
    disabled_class: &'static str,
}

impl StyledButton {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: "button.btn, a.btn",
            disabled_class: "disabled",
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: "button.mdc-button, button.mat-mdc-button, button.mat-mdc-icon-button, button.mat-mdc-fab, a.mat-mdc-button",
            disabled_class: "mat-mdc-button-disabled",
        }
    }

    async fn locate(&self, container: &Container, text: &str) -> Result<SmartElement> {
        let buttons = container.find_all(&self.driver, &By::css(self.selector)).await?;
        by_text(buttons, text, "button").await
    }
}

#[async_trait]
impl Button for StyledButton {
    async fn click(&self, container: &Container, text: &str) -> Result<()> {
        self.locate(container, text).await?.click().await
    }

    async fn click_element(&self, element: &SmartElement) -> Result<()> {
        element.click().await
    }

    async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool> {
        let button = self.locate(container, text).await?;
        Ok(button.is_enabled().await? && !button.has_class(self.disabled_class).await?)
    }

    async fn is_visible(&self, container: &Container, text: &str) -> Result<bool> {
        let Some(button) = self.locate(container, text).await.ignore(ErrorKind::NotFound)? else {
            return Ok(false);
        };
        button
            .is_displayed()
            .await
            .recover(ErrorKind::StaleElement, false)
    }
}

pub type ButtonService = ComponentService<ButtonType>;

impl ComponentService<ButtonType> {
    pub async fn click(&self, container: &Container, text: &str) -> Result<()> {
        self.component(None)?.click(container, text).await
    }

    pub async fn click_as(&self, ty: ButtonType, container: &Container, text: &str) -> Result<()> {
        self.get_or_create(ty).click(container, text).await
    }

    pub async fn click_element(&self, element: &SmartElement) -> Result<()> {
        self.component(None)?.click_element(element).await
    }

    pub async fn click_element_as(&self, ty: ButtonType, element: &SmartElement) -> Result<()> {
        self.get_or_create(ty).click_element(element).await
    }

    pub async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool> {
        self.component(None)?.is_enabled(container, text).await
    }

    pub async fn is_enabled_as(&self, ty: ButtonType, container: &Container, text: &str) -> Result<bool> {
        self.get_or_create(ty).is_enabled(container, text).await
    }

    pub async fn is_visible(&self, container: &Container, text: &str) -> Result<bool> {
        self.component(None)?.is_visible(container, text).await
    }

    pub async fn is_visible_as(&self, ty: ButtonType, container: &Container, text: &str) -> Result<bool> {
        self.get_or_create(ty).is_visible(container, text).await
    }
}
