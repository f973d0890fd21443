//! Radio buttons

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
pub trait Radio: Send + Sync {
    /// Select the option whose label matches `text`
    async fn select(&self, container: &Container, text: &str) -> Result<()>;

    /// Select one option picked by `strategy`; returns its label
    async fn select_strategy(&self, container: &Container, strategy: Strategy) -> Result<String>;

    /// Label of the selected option
    async fn selected(&self, container: &Container) -> Result<Option<String>>;

    async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool>;

    /// Every option label, in page order
    async fn all(&self, container: &Container) -> Result<Vec<String>>;
}

component_types! {
    pub enum RadioType: dyn Radio for Concept::Radio {
        Bootstrap = "BOOTSTRAP_RADIO" in BOOTSTRAP => FormRadio::bootstrap,
        Material = "MATERIAL_RADIO" in MATERIAL => FormRadio::material,
    }
}

struct RadioMarkup {
    item: &'static str,
    input: &'static str,
    label: &'static str,
    disabled_class: &'static str,
}

const BOOTSTRAP_MARKUP: RadioMarkup = RadioMarkup {
    item: ".form-check",
    input: "input[type=radio]",
    label: "label",
    disabled_class: "disabled",
};

const MATERIAL_MARKUP: RadioMarkup = RadioMarkup {
    item: "mat-radio-button",
    input: "input[type=radio]",
    label: "label",
    disabled_class: "mat-mdc-radio-disabled",
};

/// One radio option: its wrapper, native input and label text
struct RadioOption {
    item: SmartElement,
    input: SmartElement,
    label: String,
}

/// Radio group rendered as wrapper elements around native inputs
pub struct FormRadio {
    driver: SmartDriver,
    markup: &'static RadioMarkup,
}

impl FormRadio {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: &BOOTSTRAP_MARKUP,
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: &MATERIAL_MARKUP,
        }
    }

    async fn options(&self, container: &Container) -> Result<Vec<RadioOption>> {
        let items = container
            .find_all(&self.driver, &By::css(self.markup.item))
            .await?;
        let input_by = By::css(self.markup.input);
        let label_by = By::css(self.markup.label);

        let mut options = Vec::with_capacity(items.len());
        for item in items {
            // .form-check also wraps checkboxes
            let Some(input) = item.scan(&input_by).await?.into_iter().next() else {
                continue;
            };
            let label = label_of(&item, &label_by).await?;
            options.push(RadioOption { item, input, label });
        }
        Ok(options)
    }

    async fn option(&self, container: &Container, text: &str) -> Result<RadioOption> {
        self.options(container)
            .await?
            .into_iter()
            .find(|o| matches_text(&o.label, text))
            .ok_or_else(|| Error::not_found(format!("radio '{}'", text.trim())))
    }

    async fn choose(&self, option: &RadioOption) -> Result<()> {
        if option.input.is_selected().await? {
            debug!("Radio '{}' already selected", option.label);
            return Ok(());
        }
        option.input.click().await
    }
}

#[async_trait]
impl Radio for FormRadio {
    async fn select(&self, container: &Container, text: &str) -> Result<()> {
        let option = self.option(container, text).await?;
        self.choose(&option).await
    }

    async fn select_strategy(&self, container: &Container, strategy: Strategy) -> Result<String> {
        let options = self.options(container).await?;
        let option = strategy.pick(&options)?;
        self.choose(option).await?;
        Ok(option.label.clone())
    }

    async fn selected(&self, container: &Container) -> Result<Option<String>> {
        for option in self.options(container).await? {
            if option.input.is_selected().await? {
                return Ok(Some(option.label));
            }
        }
        Ok(None)
    }

    async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool> {
        let option = self.option(container, text).await?;
        Ok(option.input.is_enabled().await?
            && !option.item.has_class(self.markup.disabled_class).await?)
    }

    async fn all(&self, container: &Container) -> Result<Vec<String>> {
        Ok(self
            .options(container)
            .await?
            .into_iter()
            .map(|o| o.label)
            .collect())
    }
}

pub type RadioService = ComponentService<RadioType>;

impl ComponentService<RadioType> {
    pub async fn select(&self, container: &Container, text: &str) -> Result<()> {
        self.component(None)?.select(container, text).await
    }

    pub async fn select_as(&self, ty: RadioType, container: &Container, text: &str) -> Result<()> {
        self.get_or_create(ty).select(container, text).await
    }

    pub async fn select_strategy(&self, container: &Container, strategy: Strategy) -> Result<String> {
        self.component(None)?
            .select_strategy(container, strategy)
            .await
    }

    pub async fn select_strategy_as(
        &self,
        ty: RadioType,
        container: &Container,
        strategy: Strategy,
    ) -> Result<String> {
        self.get_or_create(ty)
            .select_strategy(container, strategy)
            .await
    }

    pub async fn selected(&self, container: &Container) -> Result<Option<String>> {
        self.component(None)?.selected(container).await
    }

    pub async fn selected_as(&self, ty: RadioType, container: &Container) -> Result<Option<String>> {
        self.get_or_create(ty).selected(container).await
    }

    pub async fn is_enabled(&self, container: &Container, text: &str) -> Result<bool> {
        self.component(None)?.is_enabled(container, text).await
    }

    pub async fn is_enabled_as(&self, ty: RadioType, container: &Container, text: &str) -> Result<bool> {
        self.get_or_create(ty).is_enabled(container, text).await
    }

    pub async fn all(&self, container: &Container) -> Result<Vec<String>> {
        self.component(None)?.all(container).await
    }

    pub async fn all_as(&self, ty: RadioType, container: &Container) -> Result<Vec<String>> {
        self.get_or_create(ty).all(container).await
    }
}
