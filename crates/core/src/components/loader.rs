//! Spinners and progress indicators

use async_trait::async_trait;
use quest_common::{ErrorKind, Result, ResultExt};
use quest_driver::{By, SmartDriver};
use std::time::Duration;
use tracing::debug;

use super::{BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Loader: Send + Sync {
    async fn is_visible(&self, container: &Container) -> Result<bool>;

    /// Block until no loader is displayed; `Timeout` once `timeout` passes
    async fn wait_to_disappear(&self, container: &Container, timeout: Duration) -> Result<()>;
}

component_types! {
    pub enum LoaderType: dyn Loader for Concept::Loader {
        Bootstrap = "BOOTSTRAP_LOADER" in BOOTSTRAP => StyledLoader::bootstrap,
        Material = "MATERIAL_LOADER" in MATERIAL => StyledLoader::material,
    }
}

pub struct StyledLoader {
    driver: SmartDriver,
    selector: &'static str,
}

impl StyledLoader {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: ".spinner-border, .spinner-grow",
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: "mat-progress-spinner, mat-spinner, mat-progress-bar",
        }
    }
}

#[async_trait]
impl Loader for StyledLoader {
    async fn is_visible(&self, container: &Container) -> Result<bool> {
        for loader in container.scan(&self.driver, &By::css(self.selector)).await? {
            if loader
                .is_displayed()
                .await
                .recover(ErrorKind::StaleElement, false)?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn wait_to_disappear(&self, container: &Container, timeout: Duration) -> Result<()> {
        let root = container.root(&self.driver).await?;
        self.driver
            .wait_until_gone(root.as_ref().map(|r| r.id()), &By::css(self.selector), timeout)
            .await?;
        debug!("Loader '{}' gone", self.selector);
        Ok(())
    }
}

pub type LoaderService = ComponentService<LoaderType>;

impl ComponentService<LoaderType> {
    pub async fn is_visible(&self, container: &Container) -> Result<bool> {
        self.component(None)?.is_visible(container).await
    }

    pub async fn is_visible_as(&self, ty: LoaderType, container: &Container) -> Result<bool> {
        self.get_or_create(ty).is_visible(container).await
    }

    pub async fn wait_to_disappear(&self, container: &Container, timeout: Duration) -> Result<()> {
        self.component(None)?
            .wait_to_disappear(container, timeout)
            .await
    }

    pub async fn wait_to_disappear_as(
        &self,
        ty: LoaderType,
        container: &Container,
        timeout: Duration,
    ) -> Result<()> {
        self.get_or_create(ty)
            .wait_to_disappear(container, timeout)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::browser;
    use quest_driver::Node;

    #[tokio::test]
    async fn test_waits_for_spinner_to_vanish() {
        let (_, driver) = browser(Node::new("main").children([
            Node::new("div")
                .class("spinner-border")
                .attr("role", "status")
                .vanishes_on_lookup(3),
            Node::new("p").text("Loaded"),
        ]));
        let loader = StyledLoader::bootstrap(driver);

        assert!(loader.is_visible(&Container::Page).await.unwrap());
        loader
            .wait_to_disappear(&Container::Page, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(!loader.is_visible(&Container::Page).await.unwrap());
    }

    #[tokio::test]
    async fn test_wait_times_out_while_loading() {
        let (_, driver) = browser(Node::new("mat-progress-bar"));
        let loader = StyledLoader::material(driver);

        let err = loader
            .wait_to_disappear(&Container::Page, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_hidden_spinner_is_not_visible() {
        let (_, driver) = browser(Node::new("main").child(Node::new("mat-spinner").hidden()));
        let loader = StyledLoader::material(driver);

        assert!(!loader.is_visible(&Container::Page).await.unwrap());
        loader
            .wait_to_disappear(&Container::Page, Duration::from_millis(20))
            .await
            .unwrap();
    }
}
