//! Hyperlinks

use async_trait::async_trait;
use quest_common::Result;
use quest_driver::{By, SmartDriver, SmartElement};

use super::{by_text, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Link: Send + Sync {
    async fn click(&self, container: &Container, text: &str) -> Result<()>;

    async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool>;

    async fn href(&self, container: &Container, text: &str) -> Result<Option<String>>;
}

component_types! {
    pub enum LinkType: dyn Link for Concept::Link {
        Bootstrap = "BOOTSTRAP_LINK" in BOOTSTRAP => StyledLink::bootstrap,
        Material = "MATERIAL_LINK" in MATERIAL => StyledLink::material,
    }
}

pub struct StyledLink {
    driver: SmartDriver,
    selector: &'static str,
    disabled_class: &'static str,
}

impl StyledLink {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: "a",
            disabled_class: "disabled",
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            selector: "a.mat-mdc-button, a.mdc-button, a.mat-mdc-list-item, a.mat-mdc-tab-link",
            disabled_class: "mat-mdc-button-disabled",
        }
    }

    async fn locate(&self, container: &Container, text: &str) -> Result<SmartElement> {
        let links = container.find_all(&self.driver, &By::css(self.selector)).await?;
        by_text(links, text, "link").await
    }
}

#[async_trait]
impl Link for StyledLink {
    async fn click(&self, container: &Container, text: &str) -> Result<()> {
        self.locate(container, text).await?.click().await
    }

    async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool> {
        let link = self.locate(container, text).await?;
        let aria_disabled = link.attribute("aria-disabled").await?.as_deref() == Some("true");
        Ok(!aria_disabled && !link.has_class(self.disabled_class).await?)
    }

    async fn href(&self, container: &Container, text: &str) -> Result<Option<String>> {
        self.locate(container, text).await?.attribute("href").await
    }
}

pub type LinkService = ComponentService<LinkType>;

impl ComponentService<LinkType> {
    pub async fn click(&self, container: &Container, text: &str) -> Result<()> {
        self.component(None)?.click(container, text).await
    }

    pub async fn click_as(&self, ty: LinkType, container: &Container, text: &str) -> Result<()> {
        self.get_or_create(ty).click(container, text).await
    }

    pub async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool> {
        self.component(None)?.is_enabled(container, text).await
    }

    pub async fn is_enabled_as(&self, ty: LinkType, container: &Container, text: &str) -> Result<bool> {
        self.get_or_create(ty).is_enabled(container, text).await
    }

    pub async fn href(&self, container: &Container, text: &str) -> Result<Option<String>> {
        self.component(None)?.href(container, text).await
    }

    pub async fn href_as(&self, ty: LinkType, container: &Container, text: &str) -> Result<Option<String>> {
        self.get_or_create(ty).href(container, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::{browser, config_with};
    use quest_driver::Node;

    #[tokio::test]
    async fn test_links() {
        let (fake, driver) = browser(Node::new("nav").children([
            Node::new("a").attr("href", "/docs").text("Docs"),
            Node::new("a").class("disabled").attr("aria-disabled", "true").text("Admin"),
            Node::new("a")
                .class("mat-mdc-button")
                .attr("href", "/help")
                .text("Help"),
        ]));
        let service = LinkService::new(driver, &config_with("link", "BOOTSTRAP_LINK"));

        assert_eq!(
            service.href(&Container::Page, "docs").await.unwrap(),
            Some("/docs".to_string())
        );
        assert!(!service.is_enabled(&Container::Page, "Admin").await.unwrap());

        service
            .click_as(LinkType::Material, &Container::Page, "help")
            .await
            .unwrap();
        assert_eq!(fake.clicked(), vec!["Help"]);

        let err = service
            .click_as(LinkType::Material, &Container::Page, "Docs")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), quest_common::ErrorKind::NotFound);
    }
}
