//! Lookup scope for component operations

use quest_common::{Error, Result};
use quest_driver::{By, SmartDriver, SmartElement};

/// Where a component operation looks for its elements
#[derive(Debug, Clone, Default)]
pub enum Container {
    /// The whole page
    #[default]
    Page,
    /// Below an element already in hand
    Element(SmartElement),
    /// Below the first element matching a locator
    Locator(By),
}

impl Container {
    /// The scoping element, if any
    pub async fn root(&self, driver: &SmartDriver) -> Result<Option<SmartElement>> {
        match self {
            Container::Page => Ok(None),
            Container::Element(element) => Ok(Some(element.clone())),
            Container::Locator(by) => driver.find_element(by).await.map(Some),
        }
    }

    /// Every match for `by` inside the scope, after the usual wait
    pub async fn find_all(&self, driver: &SmartDriver, by: &By) -> Result<Vec<SmartElement>> {
        match self.root(driver).await? {
            Some(root) => root.find_elements(by).await,
            None => driver.find_elements(by).await,
        }
    }

    /// First match for `by` inside the scope
    pub async fn find(&self, driver: &SmartDriver, by: &By) -> Result<SmartElement> {
        self.find_all(driver, by)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(by.to_string()))
    }

    /// Matches for `by` right now, without waiting
    pub async fn scan(&self, driver: &SmartDriver, by: &By) -> Result<Vec<SmartElement>> {
        match self.root(driver).await? {
            Some(root) => root.scan(by).await,
            None => driver.scan(None, by).await,
        }
    }
}

impl From<By> for Container {
    fn from(by: By) -> Self {
        Container::Locator(by)
    }
}

impl From<SmartElement> for Container {
    fn from(element: SmartElement) -> Self {
        Container::Element(element)
    }
}
