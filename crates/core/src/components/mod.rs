//! Concept traits, their component type enums and the Bootstrap and Material
//! implementations

pub mod accordion;
pub mod alert;
pub mod button;
pub mod input;
pub mod link;
pub mod loader;
pub mod modal;
pub mod radio;
pub mod select;
pub mod tab;
pub mod table;
pub mod toggle;

use quest_common::{matches_text, Error, Result};
use quest_driver::{By, SmartElement};

pub(crate) const BOOTSTRAP: &str = "quest.components.bootstrap";
pub(crate) const MATERIAL: &str = "quest.components.material";

/// Trimmed text of every element
pub(crate) async fn texts(elements: &[SmartElement]) -> Result<Vec<String>> {
    let mut texts = Vec::with_capacity(elements.len());
    for element in elements {
        texts.push(element.text().await?.trim().to_string());
    }
    Ok(texts)
}

/// First element whose text matches `text`
pub(crate) async fn by_text(elements: Vec<SmartElement>, text: &str, what: &str) -> Result<SmartElement> {
    for element in elements {
        if matches_text(&element.text().await?, text) {
            return Ok(element);
        }
    }
    Err(Error::not_found(format!("{} '{}'", what, text.trim())))
}

/// First group holding a `label` element whose text matches `text`
pub(crate) async fn by_label(
    groups: Vec<SmartElement>,
    label: &By,
    text: &str,
    what: &str,
) -> Result<SmartElement> {
    for group in groups {
        for candidate in group.scan(label).await? {
            if matches_text(&candidate.text().await?, text) {
                return Ok(group);
            }
        }
    }
    Err(Error::not_found(format!("{} labelled '{}'", what, text.trim())))
}

/// Text of the first `label` inside `group`, empty when there is none
pub(crate) async fn label_of(group: &SmartElement, label: &By) -> Result<String> {
    match group.scan(label).await?.first() {
        Some(label) => Ok(label.text().await?.trim().to_string()),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use quest_common::QuestConfig;
    use quest_driver::{FakeBrowser, Node, SmartDriver, SmartSettings};
    use std::sync::Arc;
    use std::time::Duration;

    /// Fake browser showing `page`, and a smart driver with short waits over it
    pub fn browser(page: Node) -> (Arc<FakeBrowser>, SmartDriver) {
        let fake = Arc::new(FakeBrowser::new(page));
        let driver = SmartDriver::new(
            fake.clone(),
            SmartSettings {
                wait: Duration::from_millis(20),
                poll: Duration::from_millis(1),
                ..Default::default()
            },
        );
        (fake, driver)
    }

    pub fn config_with(concept: &str, ty: &str) -> QuestConfig {
        let mut config = QuestConfig::default();
        config.defaults.insert(concept.to_string(), ty.to_string());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentType;
    use std::collections::HashSet;

    fn names<T: ComponentType>() -> Vec<&'static str> {
        T::variants().iter().map(|v| v.name()).collect()
    }

    #[test]
    fn test_family_names_are_unique() {
        let all: Vec<&str> = [
            names::<accordion::AccordionType>(),
            names::<alert::AlertType>(),
            names::<button::ButtonType>(),
            names::<input::InputType>(),
            names::<link::LinkType>(),
            names::<loader::LoaderType>(),
            names::<modal::ModalType>(),
            names::<radio::RadioType>(),
            names::<select::SelectType>(),
            names::<tab::TabType>(),
            names::<table::TableType>(),
            names::<toggle::ToggleType>(),
        ]
        .concat();

        let unique: HashSet<&str> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
        assert_eq!(all.len(), 24);
    }

    #[test]
    fn test_families_live_under_framework_packages() {
        for ty in radio::RadioType::variants() {
            assert!([BOOTSTRAP, MATERIAL].contains(&ty.package()));
        }
    }
}
