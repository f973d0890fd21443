//! Text inputs

use async_trait::async_trait;
use quest_common::{ErrorKind, Result, ResultExt};
use quest_driver::{By, SmartDriver, SmartElement};

use super::{by_label, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::container::Container;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Input: Send + Sync {
    /// Replace the value of the field labelled `label`
    async fn insert(&self, container: &Container, label: &str, value: &str) -> Result<()>;

    async fn insert_element(&self, element: &SmartElement, value: &str) -> Result<()>;

    async fn clear(&self, container: &Container, label: &str) -> Result<()>;

    async fn value(&self, container: &Container, label: &str) -> Result<String>;

    async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool>;

    /// Validation message shown for the field, if any
    async fn error_message(&self, container: &Container, label: &str) -> Result<Option<String>>;
}

component_types! {
    pub enum InputType: dyn Input for Concept::Input {
        Bootstrap = "BOOTSTRAP_INPUT" in BOOTSTRAP => FormInput::bootstrap,
        Material = "MATERIAL_INPUT" in MATERIAL => FormInput::material,
    }
}

struct FieldMarkup {
    group: &'static str,
    label: &'static str,
    field: &'static str,
    error: &'static str,
}

/// Labelled text field inside a framework form group
pub struct FormInput {
    driver: SmartDriver,
    markup: FieldMarkup,
}

impl FormInput {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: FieldMarkup {
                group: ".mb-3, .form-group, .form-floating",
                label: "label",
                field: "input, textarea",
                error: ".invalid-feedback",
            },
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: FieldMarkup {
                group: "mat-form-field",
                label: "mat-label",
                field: "input, textarea",
                error: "mat-error",
            },
        }
    }

    async fn group(&self, container: &Container, label: &str) -> Result<SmartElement> {
        let groups = container
            .find_all(&self.driver, &By::css(self.markup.group))
            .await?;
        by_label(groups, &By::css(self.markup.label), label, "input").await
    }

    async fn field(&self, container: &Container, label: &str) -> Result<SmartElement> {
        self.group(container, label)
            .await?
            .find_element(&By::css(self.markup.field))
            .await
    }
}

#[async_trait]
impl Input for FormInput {
    async fn insert(&self, container: &Container, label: &str, value: &str) -> Result<()> {
        let field = self.field(container, label).await?;
        self.insert_element(&field, value).await
    }

    async fn insert_element(&self, element: &SmartElement, value: &str) -> Result<()> {
        element.clear_and_send_keys(value).await
    }

    async fn clear(&self, container: &Container, label: &str) -> Result<()> {
        self.field(container, label).await?.clear().await
    }

    async fn value(&self, container: &Container, label: &str) -> Result<String> {
        self.field(container, label).await?.value().await
    }

    async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool> {
        let field = self.field(container, label).await?;
        Ok(field.is_enabled().await? && field.attribute("readonly").await?.is_none())
    }

    async fn error_message(&self, container: &Container, label: &str) -> Result<Option<String>> {
        let group = self.group(container, label).await?;
        for error in group.scan(&By::css(self.markup.error)).await? {
            let shown = error
                .is_displayed()
                .await
                .recover(ErrorKind::StaleElement, false)?;
            if shown {
                let text = error.text().await?.trim().to_string();
                if !text.is_empty() {
                    return Ok(Some(text));
                }
            }
        }
        Ok(None)
    }
}

pub type InputService = ComponentService<InputType>;

impl ComponentService<InputType> {
    pub async fn insert(&self, container: &Container, label: &str, value: &str) -> Result<()> {
        self.component(None)?.insert(container, label, value).await
    }

    pub async fn insert_as(&self, ty: InputType, container: &Container, label: &str, value: &str) -> Result<()> {
        self.get_or_create(ty).insert(container, label, value).await
    }

    pub async fn insert_element(&self, element: &SmartElement, value: &str) -> Result<()> {
        self.component(None)?.insert_element(element, value).await
    }

    pub async fn insert_element_as(&self, ty: InputType, element: &SmartElement, value: &str) -> Result<()> {
        self.get_or_create(ty).insert_element(element, value).await
    }

    pub async fn clear(&self, container: &Container, label: &str) -> Result<()> {
        self.component(None)?.clear(container, label).await
    }

    pub async fn clear_as(&self, ty: InputType, container: &Container, label: &str) -> Result<()> {
        self.get_or_create(ty).clear(container, label).await
    }

    pub async fn value(&self, container: &Container, label: &str) -> Result<String> {
        self.component(None)?.value(container, label).await
    }

    pub async fn value_as(&self, ty: InputType, container: &Container, label: &str) -> Result<String> {
        self.get_or_create(ty).value(container, label).await
    }

    pub async fn is_enabled(&self, container: &Container, label: &str) -> Result<bool> {
        self.component(None)?.is_enabled(container, label).await
    }

    pub async fn is_enabled_as(&self, ty: InputType, container: &Container, label: &str) -> Result<bool> {
        self.get_or_create(ty).is_enabled(container, label).await
    }

    pub async fn error_message(&self, container: &Container, label: &str) -> Result<Option<String>> {
        self.component(None)?.error_message(container, label).await
    }

    pub async fn error_message_as(
        &self,
        ty: InputType,
        container: &Container,
        label: &str,
    ) -> Result<Option<String>> {
        self.get_or_create(ty).error_message(container, label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::{browser, config_with};
    use quest_driver::Node;

    fn page() -> Node {
        Node::new("form").children([
            Node::new("div").class("mb-3").children([
                Node::new("label").text("Email"),
                Node::new("input").class("form-control").attr("value", "old@example.com"),
                Node::new("div").class("invalid-feedback").text("Email is required"),
            ]),
            Node::new("div").class("mb-3").children([
                Node::new("label").text("Nickname"),
                Node::new("input").class("form-control"),
                Node::new("div").class("invalid-feedback").text("Too short").hidden(),
            ]),
            Node::new("mat-form-field").children([
                Node::new("mat-label").text("City"),
                Node::new("input").class("mat-mdc-input-element").disabled(),
            ]),
        ])
    }

    #[tokio::test]
    async fn test_insert_replaces_value() {
        let (fake, driver) = browser(page());
        let service = InputService::new(driver, &config_with("input", "BOOTSTRAP_INPUT"));

        service.insert(&Container::Page, "email", "new@example.com").await.unwrap();

        assert_eq!(
            service.value(&Container::Page, "Email").await.unwrap(),
            "new@example.com"
        );
        assert_eq!(fake.value_of(".mb-3 input"), "new@example.com");
    }

    #[tokio::test]
    async fn test_error_message_only_when_displayed() {
        let (_, driver) = browser(page());
        let input = FormInput::bootstrap(driver);

        assert_eq!(
            input.error_message(&Container::Page, "Email").await.unwrap(),
            Some("Email is required".to_string())
        );
        assert_eq!(input.error_message(&Container::Page, "Nickname").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_material_disabled_field() {
        let (_, driver) = browser(page());
        let input = FormInput::material(driver);

        assert!(!input.is_enabled(&Container::Page, "City").await.unwrap());
        let err = input.insert(&Container::Page, "City", "Sofia").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotInteractable);
    }
}
