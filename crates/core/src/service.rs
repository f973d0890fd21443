//! Per-concept services
//!
//! A [`ComponentService`] routes concept operations to the implementation
//! for a component type, building each implementation at most once. The
//! concept modules add the operations themselves as inherent methods, each
//! as a pair: `op(..)` on the default type and `op_as(ty, ..)` on an
//! explicit one.

use parking_lot::Mutex;
use quest_common::{Error, QuestConfig, Result};
use quest_driver::SmartDriver;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

use crate::factory::{ComponentFactory, DefaultFactory};
use crate::registry::{self, ComponentType};

pub struct ComponentService<T: ComponentType> {
    driver: SmartDriver,
    default_type: Option<T>,
    factory: Arc<dyn ComponentFactory<T>>,
    cache: Mutex<HashMap<T, Arc<T::Component>>>,
}

impl<T: ComponentType> ComponentService<T> {
    /// Service with the default type taken from `config`
    pub fn new(driver: SmartDriver, config: &QuestConfig) -> Self {
        Self::with_factory(driver, config, Arc::new(DefaultFactory))
    }

    pub fn with_factory(
        driver: SmartDriver,
        config: &QuestConfig,
        factory: Arc<dyn ComponentFactory<T>>,
    ) -> Self {
        Self {
            driver,
            default_type: registry::default_type::<T>(config),
            factory,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_type(&self) -> Option<T> {
        self.default_type
    }

    pub fn driver(&self) -> &SmartDriver {
        &self.driver
    }

    /// Cached implementation for `ty`, built on first use
    pub fn get_or_create(&self, ty: T) -> Arc<T::Component> {
        let mut cache = self.cache.lock();
        if let Some(component) = cache.get(&ty) {
            trace!("Reusing {} component {}", T::CONCEPT, ty.name());
            return component.clone();
        }

        let component = self.factory.create(ty, &self.driver);
        cache.insert(ty, component.clone());
        component
    }

    /// Implementation for `ty`, or for the default type when `ty` is `None`
    pub fn component(&self, ty: Option<T>) -> Result<Arc<T::Component>> {
        let ty = ty.or(self.default_type).ok_or_else(|| {
            Error::IllegalState(format!(
                "no default type configured for concept {}",
                T::CONCEPT
            ))
        })?;
        Ok(self.get_or_create(ty))
    }

    /// Number of implementations built so far
    pub fn cached(&self) -> usize {
        self.cache.lock().len()
    }
}
