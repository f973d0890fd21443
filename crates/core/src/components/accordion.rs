//! Accordions

use async_trait::async_trait;
use quest_common::{matches_text, Error, Result, Strategy};
use quest_driver::{By, SmartDriver, SmartElement};
use tracing::debug;

use super::{label_of, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Accordion: Send + Sync {
    /// Expand the panel titled `title`; no-op when already open
    async fn expand(&self, container: &Container, title: &str) -> Result<()>;

    /// Expand the panels picked by `strategy`; returns their titles
    async fn expand_strategy(&self, container: &Container, strategy: Strategy) -> Result<Vec<String>>;

    async fn collapse(&self, container: &Container, title: &str) -> Result<()>;

    async fn is_expanded(&self, container: &Container, title: &str) -> Result<bool>;

    /// Titles of the open panels
    async fn expanded(&self, container: &Container) -> Result<Vec<String>>;

    /// Body text of the panel titled `title`
    async fn content(&self, container: &Container, title: &str) -> Result<String>;
}

component_types! {
    pub enum AccordionType: dyn Accordion for Concept::Accordion {
        Bootstrap = "BOOTSTRAP_ACCORDION" in BOOTSTRAP => PanelAccordion::bootstrap,
        Material = "MATERIAL_ACCORDION" in MATERIAL => PanelAccordion::material,
    }
}

struct PanelMarkup {
    panel: &'static str,
    header: &'static str,
    title: &'static str,
    body: &'static str,
}

struct Panel {
    header: SmartElement,
    body: Option<SmartElement>,
    title: String,
}

/// Stack of panels whose headers carry `aria-expanded`
pub struct PanelAccordion {
    driver: SmartDriver,
    markup: PanelMarkup,
}

impl PanelAccordion {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: PanelMarkup {
                panel: ".accordion-item",
                header: ".accordion-button",
                title: ".accordion-button",
                body: ".accordion-body",
            },
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: PanelMarkup {
                panel: "mat-expansion-panel",
                header: "mat-expansion-panel-header",
                title: "mat-panel-title",
                body: ".mat-expansion-panel-body",
            },
        }
    }

    async fn panels(&self, container: &Container) -> Result<Vec<Panel>> {
        let items = container
            .find_all(&self.driver, &By::css(self.markup.panel))
            .await?;
        let header_by = By::css(self.markup.header);
        let body_by = By::css(self.markup.body);
        let title_by = By::css(self.markup.title);

        let mut panels = Vec::with_capacity(items.len());
        for item in items {
            let header = item.find_element(&header_by).await?;
            let body = item.scan(&body_by).await?.into_iter().next();
            let title = label_of(&item, &title_by).await?;
            panels.push(Panel { header, body, title });
        }
        Ok(panels)
    }

    async fn panel(&self, container: &Container, title: &str) -> Result<Panel> {
        self.panels(container)
            .await?
            .into_iter()
            .find(|p| matches_text(&p.title, title))
            .ok_or_else(|| Error::not_found(format!("accordion panel '{}'", title.trim())))
    }

    async fn is_open(panel: &Panel) -> Result<bool> {
        Ok(panel.header.attribute("aria-expanded").await?.as_deref() == Some("true"))
    }

    async fn set_open(panel: &Panel, open: bool) -> Result<()> {
        if Self::is_open(panel).await? == open {
            debug!("Accordion panel '{}' already in requested state", panel.title);
            return Ok(());
        }
        panel.header.click().await
    }
}

#[async_trait]
impl Accordion for PanelAccordion {
    async fn expand(&self, container: &Container, title: &str) -> Result<()> {
        let panel = self.panel(container, title).await?;
        Self::set_open(&panel, true).await
    }

    async fn expand_strategy(&self, container: &Container, strategy: Strategy) -> Result<Vec<String>> {
        let panels = self.panels(container).await?;
        let mut titles = Vec::new();
        for panel in strategy.pick_many(&panels)? {
            Self::set_open(panel, true).await?;
            titles.push(panel.title.clone());
        }
        Ok(titles)
    }

    async fn collapse(&self, container: &Container, title: &str) -> Result<()> {
        let panel = self.panel(container, title).await?;
        Self::set_open(&panel, false).await
    }

    async fn is_expanded(&self, container: &Container, title: &str) -> Result<bool> {
        let panel = self.panel(container, title).await?;
        Self::is_open(&panel).await
    }

    async fn expanded(&self, container: &Container) -> Result<Vec<String>> {
        let mut titles = Vec::new();
        for panel in self.panels(container).await? {
            if Self::is_open(&panel).await? {
                titles.push(panel.title);
            }
        }
        Ok(titles)
    }

    async fn content(&self, container: &Container, title: &str) -> Result<String> {
        let panel = self.panel(container, title).await?;
        match &panel.body {
            Some(body) => Ok(body.text().await?.trim().to_string()),
            None => Err(Error::not_found(format!(
                "body of accordion panel '{}'",
                panel.title
            ))),
        }
    }
}

pub type AccordionService = ComponentService<AccordionType>;

impl ComponentService<AccordionType> {
    pub async fn expand(&self, container: &Container, title: &str) -> Result<()> {
        self.component(None)?.expand(container, title).await
    }

    pub async fn expand_as(&self, ty: AccordionType, container: &Container, title: &str) -> Result<()> {
        self.get_or_create(ty).expand(container, title).await
    }

    pub async fn expand_strategy(&self, container: &Container, strategy: Strategy) -> Result<Vec<String>> {
        self.component(None)?
            .expand_strategy(container, strategy)
            .await
    }

    pub async fn expand_strategy_as(
        &self,
        ty: AccordionType,
        container: &Container,
        strategy: Strategy,
    ) -> Result<Vec<String>> {
        self.get_or_create(ty)
            .expand_strategy(container, strategy)
            .await
    }

    pub async fn collapse(&self, container: &Container, title: &str) -> Result<()> {
        self.component(None)?.collapse(container, title).await
    }

    pub async fn collapse_as(&self, ty: AccordionType, container: &Container, title: &str) -> Result<()> {
        self.get_or_create(ty).collapse(container, title).await
    }

    pub async fn is_expanded(&self, container: &Container, title: &str) -> Result<bool> {
        self.component(None)?.is_expanded(container, title).await
    }

    pub async fn is_expanded_as(&self, ty: AccordionType, container: &Container, title: &str) -> Result<bool> {
        self.get_or_create(ty).is_expanded(container, title).await
    }

    pub async fn expanded(&self, container: &Container) -> Result<Vec<String>> {
        self.component(None)?.expanded(container).await
    }

    pub async fn expanded_as(&self, ty: AccordionType, container: &Container) -> Result<Vec<String>> {
        self.get_or_create(ty).expanded(container).await
    }

    pub async fn content(&self, container: &Container, title: &str) -> Result<String> {
        self.component(None)?.content(container, title).await
    }

    pub async fn content_as(&self, ty: AccordionType, container: &Container, title: &str) -> Result<String> {
        self.get_or_create(ty).content(container, title).await
    }
}
