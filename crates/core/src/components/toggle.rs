//! On/off switches

use async_trait::async_trait;
use quest_common::Result;
use quest_driver::{By, SmartDriver, SmartElement};
use tracing::debug;

use super::{by_label, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Toggle: Send + Sync {
    /// Switch on; no-op when already on
    async fn activate(&self, container: &Container, label: &str) -> Result<()>;

    /// Switch off; no-op when already off
    async fn deactivate(&self, container: &Container, label: &str) -> Result<()>;

    async fn is_activated(&self, container: &Container, label: &str) -> Result<bool>;

    async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool>;
}

component_types! {
    pub enum ToggleType: dyn Toggle for Concept::Toggle {
        Bootstrap = "BOOTSTRAP_TOGGLE" in BOOTSTRAP => BootstrapToggle::new,
        Material = "MATERIAL_TOGGLE" in MATERIAL => MaterialToggle::new,
    }
}

async fn set_state<T: Toggle + ?Sized>(
    toggle: &T,
    control: &SmartElement,
    container: &Container,
    label: &str,
    on: bool,
) -> Result<()> {
    if toggle.is_activated(container, label).await? == on {
        debug!("Toggle '{}' already {}", label, if on { "on" } else { "off" });
        return Ok(());
    }
    control.click().await
}

/// `.form-switch` wrapping a checkbox input
pub struct BootstrapToggle {
    driver: SmartDriver,
}

impl BootstrapToggle {
    pub fn new(driver: SmartDriver) -> Self {
        Self { driver }
    }

    async fn control(&self, container: &Container, label: &str) -> Result<SmartElement> {
        let switches = container
            .find_all(&self.driver, &By::css(".form-switch"))
            .await?;
        by_label(switches, &By::css("label"), label, "toggle")
            .await?
            .find_element(&By::css("input[type=checkbox]"))
            .await
    }
}

#[async_trait]
impl Toggle for BootstrapToggle {
    async fn activate(&self, container: &Container, label: &str) -> Result<()> {
        let control = self.control(container, label).await?;
        set_state(self, &control, container, label, true).await
    }

    async fn deactivate(&self, container: &Container, label: &str) -> Result<()> {
        let control = self.control(container, label).await?;
        set_state(self, &control, container, label, false).await
    }

    async fn is_activated(&self, container: &Container, label: &str) -> Result<bool> {
        self.control(container, label).await?.is_selected().await
    }

    async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool> {
        self.control(container, label).await?.is_enabled().await
    }
}

/// `mat-slide-toggle` driven through its `role=switch` button
pub struct MaterialToggle {
    driver: SmartDriver,
}

impl MaterialToggle {
    pub fn new(driver: SmartDriver) -> Self {
        Self { driver }
    }

    async fn parts(&self, container: &Container, label: &str) -> Result<(SmartElement, SmartElement)> {
        let toggles = container
            .find_all(&self.driver, &By::css("mat-slide-toggle"))
            .await?;
        let toggle = by_label(toggles, &By::css("label"), label, "toggle").await?;
        let control = toggle.find_element(&By::css("button[role=switch]")).await?;
        Ok((toggle, control))
    }
}

#[async_trait]
impl Toggle for MaterialToggle {
    async fn activate(&self, container: &Container, label: &str) -> Result<()> {
        let (_, control) = self.parts(container, label).await?;
        set_state(self, &control, container, label, true).await
    }

    async fn deactivate(&self, container: &Container, label: &str) -> Result<()> {
        let (_, control) = self.parts(container, label).await?;
        set_state(self, &control, container, label, false).await
    }

    async fn is_activated(&self, container: &Container, label: &str) -> Result<bool> {
        let (_, control) = self.parts(container, label).await?;
        Ok(control.attribute("aria-checked").await?.as_deref() == Some("true"))
    }

    async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool> {
        let (toggle, control) = self.parts(container, label).await?;
        Ok(control.is_enabled().await? && !toggle.has_class("mat-mdc-slide-toggle-disabled").await?)
    }
}

pub type ToggleService = ComponentService<ToggleType>;

impl ComponentService<ToggleType> {
    pub async fn activate(&self, container: &Container, label: &str) -> Result<()> {
        self.component(None)?.activate(container, label).await
    }

    pub async fn activate_as(&self, ty: ToggleType, container: &Container, label: &str) -> Result<()> {
        self.get_or_create(ty).activate(container, label).await
    }

    pub async fn deactivate(&self, container: &Container, label: &str) -> Result<()> {
        self.component(None)?.deactivate(container, label).await
    }

    pub async fn deactivate_as(&self, ty: ToggleType, container: &Container, label: &str) -> Result<()> {
        self.get_or_create(ty).deactivate(container, label).await
    }

    pub async fn is_activated(&self, container: &Container, label: &str) -> Result<bool> {
        self.component(None)?.is_activated(container, label).await
    }

    pub async fn is_activated_as(&self, ty: ToggleType, container: &Container, label: &str) -> Result<bool> {
        self.get_or_create(ty).is_activated(container, label).await
    }

    pub async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool> {
        self.component(None)?.is_enabled(container, label).await
    }

    pub async fn is_enabled_as(&self, ty: ToggleType, container: &Container, label: &str) -> Result<bool> {
        self.get_or_create(ty).is_enabled(container, label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::browser;
    use quest_driver::Node;

    fn page() -> Node {
        Node::new("body").children([
            Node::new("div").class("form-check").class("form-switch").children([
                Node::new("input").attr("type", "checkbox").attr("role", "switch"),
                Node::new("label").text("Notifications"),
            ]),
            Node::new("mat-slide-toggle").children([
                Node::new("button")
                    .attr("role", "switch")
                    .attr("aria-checked", "true")
                    .toggles("aria-checked"),
                Node::new("label").text("Dark mode"),
            ]),
        ])
    }

    #[tokio::test]
    async fn test_bootstrap_activate_is_idempotent() {
        let (fake, driver) = browser(page());
        let toggle = BootstrapToggle::new(driver);

        toggle.activate(&Container::Page, "notifications").await.unwrap();
        toggle.activate(&Container::Page, "Notifications").await.unwrap();

        assert!(toggle.is_activated(&Container::Page, "Notifications").await.unwrap());
        assert_eq!(fake.clicked().len(), 1);

        toggle.deactivate(&Container::Page, "Notifications").await.unwrap();
        assert!(!toggle.is_activated(&Container::Page, "Notifications").await.unwrap());
    }

    #[tokio::test]
    async fn test_material_reads_aria_checked() {
        let (_, driver) = browser(page());
        let service = ToggleService::new(driver, &quest_common::QuestConfig::default());

        assert!(service
            .is_activated_as(ToggleType::Material, &Container::Page, "Dark mode")
            .await
            .unwrap());

        service
            .deactivate_as(ToggleType::Material, &Container::Page, "Dark mode")
            .await
            .unwrap();
        assert!(!service
            .is_activated_as(ToggleType::Material, &Container::Page, "Dark mode")
            .await
            .unwrap());
        assert!(service
            .is_enabled_as(ToggleType::Material, &Container::Page, "Dark mode")
            .await
            .unwrap());
    }
}
