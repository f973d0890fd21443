//! Modal dialogs
//!
//! A page shows at most one modal at a time, so operations take no container.

use async_trait::async_trait;
use quest_common::{Error, ErrorKind, Result, ResultExt};
use quest_driver::{By, SmartDriver, SmartElement};

use super::{by_text, BOOTSTRAP, MATERIAL};
use crate::concept::Concept;
use crate::registry::component_types;
use crate::service::ComponentService;

#[async_trait]
pub trait Modal: Send + Sync {
    async fn is_opened(&self) -> Result<bool>;

    async fn title(&self) -> Result<String>;

    async fn body_text(&self) -> Result<String>;

    /// Click the footer button labelled `text`
    async fn click_button(&self, text: &str) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

component_types! {
    pub enum ModalType: dyn Modal for Concept::Modal {
        Bootstrap = "BOOTSTRAP_MODAL" in BOOTSTRAP => DialogModal::bootstrap,
        Material = "MATERIAL_MODAL" in MATERIAL => DialogModal::material,
    }
}

struct DialogMarkup {
    dialog: &'static str,
    title: &'static str,
    body: &'static str,
    buttons: &'static str,
    close: &'static str,
}

pub struct DialogModal {
    driver: SmartDriver,
    markup: DialogMarkup,
}

impl DialogModal {
    pub fn bootstrap(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: DialogMarkup {
                dialog: ".modal.show",
                title: ".modal-title",
                body: ".modal-body",
                buttons: ".modal-footer button",
                close: ".btn-close",
            },
        }
    }

    pub fn material(driver: SmartDriver) -> Self {
        Self {
            driver,
            markup: DialogMarkup {
                dialog: "mat-dialog-container",
                title: ".mat-mdc-dialog-title, [mat-dialog-title]",
                body: ".mat-mdc-dialog-content, mat-dialog-content",
                buttons: ".mat-mdc-dialog-actions button, mat-dialog-actions button",
                close: "[mat-dialog-close]",
            },
        }
    }

    async fn displayed(&self, candidates: Vec<SmartElement>) -> Result<Option<SmartElement>> {
        for dialog in candidates {
            if dialog
                .is_displayed()
                .await
                .recover(ErrorKind::StaleElement, false)?
            {
                return Ok(Some(dialog));
            }
        }
        Ok(None)
    }

    async fn dialog(&self) -> Result<SmartElement> {
        let candidates = self.driver.find_elements(&By::css(self.markup.dialog)).await?;
        self.displayed(candidates)
            .await?
            .ok_or_else(|| Error::not_found(format!("open modal ({})", self.markup.dialog)))
    }

    async fn part_text(&self, selector: &'static str) -> Result<String> {
        let part = self.dialog().await?.find_element(&By::css(selector)).await?;
        Ok(part.text().await?.trim().to_string())
    }
}

#[async_trait]
impl Modal for DialogModal {
    async fn is_opened(&self) -> Result<bool> {
        let candidates = self.driver.scan(None, &By::css(self.markup.dialog)).await?;
        Ok(self.displayed(candidates).await?.is_some())
    }

    async fn title(&self) -> Result<String> {
        self.part_text(self.markup.title).await
    }

    async fn body_text(&self) -> Result<String> {
        self.part_text(self.markup.body).await
    }

    async fn click_button(&self, text: &str) -> Result<()> {
        let buttons = self
            .dialog()
            .await?
            .find_elements(&By::css(self.markup.buttons))
            .await?;
        by_text(buttons, text, "modal button").await?.click().await
    }

    async fn close(&self) -> Result<()> {
        self.dialog()
            .await?
            .find_element(&By::css(self.markup.close))
            .await?
            .click()
            .await
    }
}

pub type ModalService = ComponentService<ModalType>;

impl ComponentService<ModalType> {
    pub async fn is_opened(&self) -> Result<bool> {
        self.component(None)?.is_opened().await
    }

    pub async fn is_opened_as(&self, ty: ModalType) -> Result<bool> {
        self.get_or_create(ty).is_opened().await
    }

    pub async fn title(&self) -> Result<String> {
        self.component(None)?.title().await
    }

    pub async fn title_as(&self, ty: ModalType) -> Result<String> {
        self.get_or_create(ty).title().await
    }

    pub async fn body_text(&self) -> Result<String> {
        self.component(None)?.body_text().await
    }

    pub async fn body_text_as(&self, ty: ModalType) -> Result<String> {
        self.get_or_create(ty).body_text().await
    }

    pub async fn click_button(&self, text: &str) -> Result<()> {
        self.component(None)?.click_button(text).await
    }

    pub async fn click_button_as(&self, ty: ModalType, text: &str) -> Result<()> {
        self.get_or_create(ty).click_button(text).await
    }

    pub async fn close(&self) -> Result<()> {
        self.component(None)?.close().await
    }

    pub async fn close_as(&self, ty: ModalType) -> Result<()> {
        self.get_or_create(ty).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::testing::{browser, config_with};
    use quest_driver::Node;

    fn bootstrap_modal() -> Node {
        Node::new("div").class("modal").class("show").child(
            Node::new("div").class("modal-dialog").child(
                Node::new("div").class("modal-content").children([
                    Node::new("div").class("modal-header").children([
                        Node::new("h5").class("modal-title").text("Delete order"),
                        Node::new("button").class("btn-close").dismisses(".modal"),
                    ]),
                    Node::new("div")
                        .class("modal-body")
                        .text(" This cannot be undone. "),
                    Node::new("div").class("modal-footer").children([
                        Node::new("button").class("btn").text("Cancel").dismisses(".modal"),
                        Node::new("button").class("btn").class("btn-danger").text("Delete"),
                    ]),
                ]),
            ),
        )
    }

    #[tokio::test]
    async fn test_bootstrap_modal_contents() {
        let (fake, driver) = browser(Node::new("body").child(bootstrap_modal()));
        let service = ModalService::new(driver, &config_with("modal", "BOOTSTRAP_MODAL"));

        assert!(service.is_opened().await.unwrap());
        assert_eq!(service.title().await.unwrap(), "Delete order");
        assert_eq!(service.body_text().await.unwrap(), "This cannot be undone.");

        service.click_button("delete").await.unwrap();
        assert_eq!(fake.clicked(), vec!["Delete"]);
        assert!(service.is_opened().await.unwrap());

        service.close().await.unwrap();
        assert!(!service.is_opened().await.unwrap());
    }

    #[tokio::test]
    async fn test_material_dialog_button_closes() {
        let (_, driver) = browser(Node::new("body").child(
            Node::new("mat-dialog-container").children([
                Node::new("h2").attr("mat-dialog-title", "").text("Share"),
                Node::new("mat-dialog-content").text("Invite collaborators"),
                Node::new("mat-dialog-actions").child(
                    Node::new("button")
                        .attr("mat-dialog-close", "")
                        .text("Done")
                        .dismisses("mat-dialog-container"),
                ),
            ]),
        ));
        let modal = DialogModal::material(driver);

        assert_eq!(modal.title().await.unwrap(), "Share");
        modal.click_button("Done").await.unwrap();
        assert!(!modal.is_opened().await.unwrap());

        let err = modal.title().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
