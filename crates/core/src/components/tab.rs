//! Tab strips

use async_trait::async_trait;
use quest_common::Result;
use quest_driver::{By, SmartDriver, SmartElement};

use super::{by_text, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Tab: Send + Sync {
    async fn click(&self, container: &Container, text: &str) -> Result<()>;

    async fn is_selected(&self, container: &Container, text: &str) -> Result<bool>;

    /// Text of the active tab
    async fn active(&self, container: &Container) -> Result<Option<String>>;
}

component_types! {
    pub enum TabType: dyn Tab for Concept::Tab {
        Bootstrap = "BOOTSTRAP_TAB" in BOOTSTRAP => StyledTab::bootstrap,
        Material = "MATERIAL_TAB" in MATERIAL => StyledTab::material,
    }
}

/// How a framework marks the active tab
enum ActiveMarker {
    Class(&'static str),
    AriaSelected,
}

pub struct StyledTab {
    driver: SmartDriver,
    selector: &'static str,
    marker: ActiveMarker,
}

impl StyledTab {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: ".nav-tabs .nav-link, .nav-pills .nav-link",
            marker: ActiveMarker::Class("active"),
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: ".mat-mdc-tab, .mat-mdc-tab-link",
            marker: ActiveMarker::AriaSelected,
        }
    }

    async fn tabs(&self, container: &Container) -> Result<Vec<SmartElement>> {
        container.find_all(&self.driver, &By::css(self.selector)).await
    }

    async fn is_active(&self, tab: &SmartElement) -> Result<bool> {
        match self.marker {
            ActiveMarker::Class(class) => tab.has_class(class).await,
            ActiveMarker::AriaSelected => {
                Ok(tab.attribute("aria-selected").await?.as_deref() == Some("true"))
            }
        }
    }
}

#[async_trait]
impl Tab for StyledTab {
    async fn click(&self, container: &Container, text: &str) -> Result<()> {
        by_text(self.tabs(container).await?, text, "tab")
            .await?
            .click()
            .await
    }

    async fn is_selected(&self, container: &Container, text: &str) -> Result<bool> {
        let tab = by_text(self.tabs(container).await?, text, "tab").await?;
        self.is_active(&tab).await
    }

    async fn active(&self, container: &Container) -> Result<Option<String>> {
        for tab in self.tabs(container).await? {
            if self.is_active(&tab).await? {
                return Ok(Some(tab.text().await?.trim().to_string()));
            }
        }
        Ok(None)
    }
}

pub type TabService = ComponentService<TabType>;

impl ComponentService<TabType> {
    pub async fn click(&self, container: &Container, text: &str) -> Result<()> {
        self.component(None)?.click(container, text).await
    }

    pub async fn click_as(&self, ty: TabType, container: &Container, text: &str) -> Result<()> {
        self.get_or_create(ty).click(container, text).await
    }

    pub async fn is_selected(&self, container: &Container, text: &str) -> Result<bool> {
        self.component(None)?.is_selected(container, text).await
    }

    pub async fn is_selected_as(&self, ty: TabType, container: &Container, text: &str) -> Result<bool> {
        self.get_or_create(ty).is_selected(container, text).await
    }

    pub async fn active(&self, container: &Container) -> Result<Option<String>> {
        self.component(None)?.active(container).await
    }

    pub async fn active_as(&self, ty: TabType, container: &Container) -> Result<Option<String>> {
        self.get_or_create(ty).active(container).await
    }
}
