//! Component construction

use quest_driver::SmartDriver;
use std::sync::Arc;
use tracing::debug;

use crate::registry::ComponentType;

/// Builds a fresh implementation for a component type; no caching
pub trait ComponentFactory<T: ComponentType>: Send + Sync {
    fn create(&self, ty: T, driver: &SmartDriver) -> Arc<T::Component>;
}

/// Factory backed by [`ComponentType::build`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl<T: ComponentType> ComponentFactory<T> for DefaultFactory {
    fn create(&self, ty: T, driver: &SmartDriver) -> Arc<T::Component> {
        debug!("Constructing {} component {}", T::CONCEPT, ty.name());
        ty.build(driver.clone())
    }
}
