//! Component type registry
//!
//! Every concept has one closed enum of implementation families (for example
//! [`RadioType`](crate::components::radio::RadioType)). The enums implement
//! [`ComponentType`], which doubles as the registry: `variants()` lists the
//! candidates for name resolution and `build()` is the constructor table.

use quest_common::{Error, QuestConfig, Result};
use quest_driver::SmartDriver;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::concept::Concept;

/// Identity of one implementation family for one concept
pub trait ComponentType: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// The concept's operation trait, as a trait object
    type Component: ?Sized + Send + Sync;

    const CONCEPT: Concept;

    /// All variants, in declaration order
    fn variants() -> &'static [Self];

    /// Constant name, e.g. `BOOTSTRAP_RADIO`
    fn name(&self) -> &'static str;

    /// Package the variant lives in, e.g. `quest.components.bootstrap`
    fn package(&self) -> &'static str;

    /// Construct the implementation bound to `driver`
    fn build(self, driver: SmartDriver) -> Arc<Self::Component>;

    fn get_type(&self) -> Self {
        *self
    }
}

/// Whether `candidate` equals `package` or lies beneath it
fn in_package(candidate: &str, package: &str) -> bool {
    package.is_empty()
        || candidate == package
        || candidate
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('.'))
}

/// Find the variant of `T` called `name` under `package`.
///
/// Variants are scanned in declaration order and the first match wins.
pub fn resolve<T: ComponentType>(name: &str, package: &str) -> Option<T> {
    T::variants()
        .iter()
        .copied()
        .find(|v| v.name() == name && in_package(v.package(), package))
}

/// [`resolve`], with a miss reported as a configuration error
pub fn resolve_or_err<T: ComponentType>(name: &str, package: &str) -> Result<T> {
    resolve(name, package).ok_or_else(|| {
        Error::Configuration(format!(
            "No {} component type named {} under package {}",
            T::CONCEPT,
            name,
            package
        ))
    })
}

/// Default type for `T` from `<concept>.default.type` and `project.package`
pub fn default_type<T: ComponentType>(config: &QuestConfig) -> Option<T> {
    let concept = T::CONCEPT;
    let Some(name) = config.default_type_name(concept.key()) else {
        debug!("No default type configured for {}", concept);
        return None;
    };

    let package = &config.project.package;
    let resolved = resolve::<T>(name, package);
    match resolved {
        Some(ty) => debug!("Default {} type resolved to {:?}", concept, ty),
        None => warn!(
            "Default {} type {} not found under package {}; calls without an explicit type will fail",
            concept, name, package
        ),
    }
    resolved
}

/// Declare a concept's component type enum and its [`ComponentType`] impl
macro_rules! component_types {
    (
        $(#[$meta:meta])*
        pub enum $ty:ident: dyn $component:ident for $concept:path {
            $( $variant:ident = $name:literal in $package:expr => $ctor:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $ty {
            $( $variant ),+
        }

        impl $crate::registry::ComponentType for $ty {
            type Component = dyn $component;

            const CONCEPT: $crate::concept::Concept = $concept;

            fn variants() -> &'static [Self] {
                &[$( $ty::$variant ),+]
            }

            fn name(&self) -> &'static str {
                match self {
                    $( $ty::$variant => $name ),+
                }
            }

            fn package(&self) -> &'static str {
                match self {
                    $( $ty::$variant => $package ),+
                }
            }

            fn build(self, driver: quest_driver::SmartDriver) -> std::sync::Arc<dyn $component> {
                match self {
                    $( $ty::$variant => std::sync::Arc::new(($ctor)(driver)) ),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", $crate::registry::ComponentType::name(self))
            }
        }
    };
}

pub(crate) use component_types;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::radio::RadioType;
    use crate::components::select::SelectType;
    use test_case::test_case;

    #[test_case("BOOTSTRAP_RADIO", "quest", Some(RadioType::Bootstrap) ; "parent package")]
    #[test_case("MATERIAL_RADIO", "quest.components.material", Some(RadioType::Material) ; "exact package")]
    #[test_case("MATERIAL_RADIO", "quest.components.bootstrap", None ; "other package")]
    #[test_case("MATERIAL_RADIO", "quest.comp", None ; "package prefix is not a parent")]
    #[test_case("material_radio", "quest", None ; "names are case sensitive")]
    #[test_case("BOOTSTRAP_SELECT", "quest", None ; "other family")]
    fn test_resolve_radio(name: &str, package: &str, expected: Option<RadioType>) {
        assert_eq!(resolve::<RadioType>(name, package), expected);
    }

    #[test]
    fn test_resolve_never_crosses_families() {
        assert_eq!(
            resolve::<SelectType>("BOOTSTRAP_SELECT", "quest"),
            Some(SelectType::Bootstrap)
        );
        assert!(resolve::<SelectType>("BOOTSTRAP_RADIO", "quest").is_none());
    }

    #[test]
    fn test_resolve_or_err_names_request() {
        let err = resolve_or_err::<RadioType>("FANCY_RADIO", "quest").unwrap_err();
        assert!(err.to_string().contains("radio"));
        assert!(err.to_string().contains("FANCY_RADIO"));
    }

    #[test]
    fn test_default_type_from_config() {
        let mut config = QuestConfig::default();
        assert_eq!(default_type::<RadioType>(&config), None);

        config
            .defaults
            .insert("radio".to_string(), "BOOTSTRAP_RADIO".to_string());
        assert_eq!(default_type::<RadioType>(&config), Some(RadioType::Bootstrap));

        config.project.package = "acme".to_string();
        assert_eq!(default_type::<RadioType>(&config), None);
    }

    #[test]
    fn test_get_type_is_identity() {
        assert_eq!(RadioType::Material.get_type(), RadioType::Material);
        assert_eq!(RadioType::Material.to_string(), "MATERIAL_RADIO");
    }
}
