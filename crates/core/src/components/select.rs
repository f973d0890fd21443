//! Drop-down selects

use async_trait::async_trait;
use quest_common::{Error, Result, Strategy};
use quest_driver::{By, SmartDriver, SmartElement};
use tracing::debug;

use super::{by_label, by_text, texts, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Select: Send + Sync {
    /// Choose the option matching `option` in the select labelled `label`
    async fn select(&self, container: &Container, label: &str, option: &str) -> Result<()>;

    /// Choose one option picked by `strategy`; returns its text
    async fn select_strategy(&self, container: &Container, label: &str, strategy: Strategy) -> Result<String>;

    /// Choose the options picked by `strategy`; `All` needs a multi-select
    async fn select_many(&self, container: &Container, label: &str, strategy: Strategy) -> Result<Vec<String>>;

    async fn selected(&self, container: &Container, label: &str) -> Result<Vec<String>>;

    async fn options(&self, container: &Container, label: &str) -> Result<Vec<String>>;
}

component_types! {
    pub enum SelectType: dyn Select for Concept::Select {
        Bootstrap = "BOOTSTRAP_SELECT" in BOOTSTRAP => BootstrapSelect::new,
        Material = "MATERIAL_SELECT" in MATERIAL => MaterialSelect::new,
    }
}

fn single_only(label: &str) -> Error {
    Error::IllegalArgument(format!(
        "select '{}' accepts a single option, Strategy ALL is not allowed",
        label.trim()
    ))
}

/// Native `<select class="form-select">` inside a labelled form group
pub struct BootstrapSelect {
    driver: SmartDriver,
}

impl BootstrapSelect {
    const GROUP: &'static str = ".mb-3, .form-group, .form-floating, .input-group";

    pub fn new(driver: SmartDriver) -> Self {
        Self { driver }
    }

    async fn field(&self, container: &Container, label: &str) -> Result<SmartElement> {
        let groups = container.find_all(&self.driver, &By::css(Self::GROUP)).await?;
        let group = by_label(groups, &By::css("label"), label, "select").await?;
        group.find_element(&By::css("select")).await
    }

    async fn choose(option: &SmartElement) -> Result<()> {
        if !option.is_selected().await? {
            option.click().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Select for BootstrapSelect {
    async fn select(&self, container: &Container, label: &str, option: &str) -> Result<()> {
        let field = self.field(container, label).await?;
        let options = field.find_elements(&By::css("option")).await?;
        let target = by_text(options, option, "option").await?;
        Self::choose(&target).await
    }

    async fn select_strategy(&self, container: &Container, label: &str, strategy: Strategy) -> Result<String> {
        let field = self.field(container, label).await?;
        let options = field.find_elements(&By::css("option")).await?;
        let target = strategy.pick(&options)?;
        Self::choose(target).await?;
        Ok(target.text().await?.trim().to_string())
    }

    async fn select_many(&self, container: &Container, label: &str, strategy: Strategy) -> Result<Vec<String>> {
        let field = self.field(container, label).await?;
        if strategy == Strategy::All && field.attribute("multiple").await?.is_none() {
            return Err(single_only(label));
        }

        let options = field.find_elements(&By::css("option")).await?;
        let mut chosen = Vec::new();
        for option in strategy.pick_many(&options)? {
            Self::choose(option).await?;
            chosen.push(option.text().await?.trim().to_string());
        }
        Ok(chosen)
    }

    async fn selected(&self, container: &Container, label: &str) -> Result<Vec<String>> {
        let field = self.field(container, label).await?;
        let mut selected = Vec::new();
        for option in field.find_elements(&By::css("option")).await? {
            if option.is_selected().await? {
                selected.push(option.text().await?.trim().to_string());
            }
        }
        Ok(selected)
    }

    async fn options(&self, container: &Container, label: &str) -> Result<Vec<String>> {
        let field = self.field(container, label).await?;
        texts(&field.find_elements(&By::css("option")).await?).await
    }
}

/// `mat-select` whose options open in an overlay panel
pub struct MaterialSelect {
    driver: SmartDriver,
}

impl MaterialSelect {
    const FIELD: &'static str = "mat-form-field";
    const LABEL: &'static str = "mat-label";
    const TRIGGER: &'static str = "mat-select";
    const OPTION: &'static str = "mat-option";
    const BACKDROP: &'static str = ".cdk-overlay-backdrop";

    pub fn new(driver: SmartDriver) -> Self {
        Self { driver }
    }

    async fn trigger(&self, container: &Container, label: &str) -> Result<SmartElement> {
        let fields = container.find_all(&self.driver, &By::css(Self::FIELD)).await?;
        let field = by_label(fields, &By::css(Self::LABEL), label, "select").await?;
        field.find_element(&By::css(Self::TRIGGER)).await
    }

    async fn is_multiple(trigger: &SmartElement) -> Result<bool> {
        Ok(trigger.attribute("aria-multiselectable").await?.as_deref() == Some("true"))
    }

    /// Open the panel; options render at page level, outside the container
    async fn open(&self, trigger: &SmartElement) -> Result<Vec<SmartElement>> {
        trigger.click().await?;
        self.driver.find_elements(&By::css(Self::OPTION)).await
    }

    async fn close(&self) -> Result<()> {
        for backdrop in self.driver.scan(None, &By::css(Self::BACKDROP)).await? {
            if backdrop.is_displayed().await? {
                debug!("Closing select panel");
                backdrop.click().await?;
            }
        }
        Ok(())
    }

    async fn is_chosen(option: &SmartElement) -> Result<bool> {
        Ok(option.attribute("aria-selected").await?.as_deref() == Some("true"))
    }

    async fn choose(option: &SmartElement) -> Result<()> {
        if !Self::is_chosen(option).await? {
            option.click().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Select for MaterialSelect {
    async fn select(&self, container: &Container, label: &str, option: &str) -> Result<()> {
        let trigger = self.trigger(container, label).await?;
        let multiple = Self::is_multiple(&trigger).await?;
        let options = self.open(&trigger).await?;
        let target = by_text(options, option, "option").await?;
        Self::choose(&target).await?;
        if multiple {
            self.close().await?;
        }
        Ok(())
    }

    async fn select_strategy(&self, container: &Container, label: &str, strategy: Strategy) -> Result<String> {
        strategy.pick_index(1)?;
        let trigger = self.trigger(container, label).await?;
        let multiple = Self::is_multiple(&trigger).await?;
        let options = self.open(&trigger).await?;
        let target = strategy.pick(&options)?;
        let text = target.text().await?.trim().to_string();
        Self::choose(target).await?;
        if multiple {
            self.close().await?;
        }
        Ok(text)
    }

    async fn select_many(&self, container: &Container, label: &str, strategy: Strategy) -> Result<Vec<String>> {
        let trigger = self.trigger(container, label).await?;
        let multiple = Self::is_multiple(&trigger).await?;
        if strategy == Strategy::All && !multiple {
            return Err(single_only(label));
        }

        let options = self.open(&trigger).await?;
        let mut chosen = Vec::new();
        for option in strategy.pick_many(&options)? {
            chosen.push(option.text().await?.trim().to_string());
            Self::choose(option).await?;
        }
        if multiple {
            self.close().await?;
        }
        Ok(chosen)
    }

    async fn selected(&self, container: &Container, label: &str) -> Result<Vec<String>> {
        let trigger = self.trigger(container, label).await?;
        let mut selected = Vec::new();
        for option in self.open(&trigger).await? {
            if Self::is_chosen(&option).await? {
                selected.push(option.text().await?.trim().to_string());
            }
        }
        self.close().await?;
        Ok(selected)
    }

    async fn options(&self, container: &Container, label: &str) -> Result<Vec<String>> {
        let trigger = self.trigger(container, label).await?;
        let options = texts(&self.open(&trigger).await?).await?;
        self.close().await?;
        Ok(options)
    }
}

pub type SelectService = ComponentService<SelectType>;

impl ComponentService<SelectType> {
    pub async fn select(&self, container: &Container, label: &str, option: &str) -> Result<()> {
        self.component(None)?.select(container, label, option).await
    }

    pub async fn select_as(&self, ty: SelectType, container: &Container, label: &str, option: &str) -> Result<()> {
        self.get_or_create(ty).select(container, label, option).await
    }

    pub async fn select_strategy(&self, container: &Container, label: &str, strategy: Strategy) -> Result<String> {
        self.component(None)?
            .select_strategy(container, label, strategy)
            .await
    }

    pub async fn select_strategy_as(
        &self,
        ty: SelectType,
        container: &Container,
        label: &str,
        strategy: Strategy,
    ) -> Result<String> {
        self.get_or_create(ty)
            .select_strategy(container, label, strategy)
            .await
    }

    pub async fn select_many(&self, container: &Container, label: &str, strategy: Strategy) -> Result<Vec<String>> {
        self.component(None)?
            .select_many(container, label, strategy)
            .await
    }

    pub async fn select_many_as(
        &self,
        ty: SelectType,
        container: &Container,
        label: &str,
        strategy: Strategy,
    ) -> Result<Vec<String>> {
        self.get_or_create(ty)
            .select_many(container, label, strategy)
            .await
    }

    pub async fn selected(&self, container: &Container, label: &str) -> Result<Vec<String>> {
        self.component(None)?.selected(container, label).await
    }

    pub async fn selected_as(&self, ty: SelectType, container: &Container, label: &str) -> Result<Vec<String>> {
        self.get_or_create(ty).selected(container, label).await
    }

    pub async fn options(&self, container: &Container, label: &str) -> Result<Vec<String>> {
        self.component(None)?.options(container, label).await
    }

    pub async fn options_as(&self, ty: SelectType, container: &Container, label: &str) -> Result<Vec<String>> {
        self.get_or_create(ty).options(container, label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::{browser, config_with};
    use quest_common::ErrorKind;
    use quest_driver::Node;

    fn bootstrap_page() -> Node {
        Node::new("form").children([
            Node::new("div").class("mb-3").children([
                Node::new("label").text("Country"),
                Node::new("select").class("form-select").children([
                    Node::new("option").text("Option1").selected(),
                    Node::new("option").text("Option2"),
                    Node::new("option").text("Option3"),
                ]),
            ]),
            Node::new("div").class("mb-3").children([
                Node::new("label").text("Languages"),
                Node::new("select").class("form-select").attr("multiple", "").children([
                    Node::new("option").text("Rust"),
                    Node::new("option").text("Go"),
                ]),
            ]),
        ])
    }

    fn material_page(multiple: bool) -> Node {
        let mut trigger = Node::new("mat-select");
        if multiple {
            trigger = trigger.attr("aria-multiselectable", "true");
        }
        let option = |text: &str| {
            let option = Node::new("mat-option").text(text).attr("aria-selected", "false");
            if multiple {
                option.toggles("aria-selected")
            } else {
                option.activates("aria-selected")
            }
        };
        Node::new("body").children([
            Node::new("mat-form-field").children([Node::new("mat-label").text("Color"), trigger]),
            Node::new("div")
                .class("cdk-overlay-pane")
                .children([option("Red"), option("Green"), option("Blue")]),
            Node::new("div").class("cdk-overlay-backdrop"),
        ])
    }

    #[tokio::test]
    async fn test_bootstrap_select_trimmed_case_insensitive() {
        let (_, driver) = browser(bootstrap_page());
        let service = SelectService::new(driver, &config_with("select", "BOOTSTRAP_SELECT"));

        service.select(&Container::Page, "country", "option3 ").await.unwrap();

        assert_eq!(
            service.selected(&Container::Page, "Country").await.unwrap(),
            vec!["Option3"]
        );
        assert_eq!(
            service.options(&Container::Page, "Country").await.unwrap(),
            vec!["Option1", "Option2", "Option3"]
        );
    }

    #[tokio::test]
    async fn test_bootstrap_select_many_requires_multiple() {
        let (_, driver) = browser(bootstrap_page());
        let select = BootstrapSelect::new(driver);

        let err = select
            .select_many(&Container::Page, "Country", Strategy::All)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let chosen = select
            .select_many(&Container::Page, "Languages", Strategy::All)
            .await
            .unwrap();
        assert_eq!(chosen, vec!["Rust", "Go"]);
        assert_eq!(
            select.selected(&Container::Page, "Languages").await.unwrap(),
            vec!["Rust", "Go"]
        );
    }

    #[tokio::test]
    async fn test_strategy_last_is_stable() {
        let (_, driver) = browser(bootstrap_page());
        let select = BootstrapSelect::new(driver);

        for _ in 0..2 {
            let picked = select
                .select_strategy(&Container::Page, "Country", Strategy::Last)
                .await
                .unwrap();
            assert_eq!(picked, "Option3");
        }
    }

    #[tokio::test]
    async fn test_material_single_select() {
        let (fake, driver) = browser(material_page(false));
        let select = MaterialSelect::new(driver);

        select.select(&Container::Page, "Color", "green").await.unwrap();
        select.select(&Container::Page, "Color", "Blue").await.unwrap();

        assert_eq!(
            select.selected(&Container::Page, "Color").await.unwrap(),
            vec!["Blue"]
        );
        assert!(fake.clicked().contains(&"Green".to_string()));
    }

    #[tokio::test]
    async fn test_material_multi_select_all() {
        let (_, driver) = browser(material_page(true));
        let select = MaterialSelect::new(driver);

        let chosen = select
            .select_many(&Container::Page, "Color", Strategy::All)
            .await
            .unwrap();

        assert_eq!(chosen, vec!["Red", "Green", "Blue"]);
        assert_eq!(
            select.selected(&Container::Page, "Color").await.unwrap(),
            vec!["Red", "Green", "Blue"]
        );
    }

    #[tokio::test]
    async fn test_material_strategy_all_rejected_before_clicking() {
        let (fake, driver) = browser(material_page(false));
        let select = MaterialSelect::new(driver);

        let err = select
            .select_strategy(&Container::Page, "Color", Strategy::All)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
        assert!(fake.clicked().is_empty());
    }
}
