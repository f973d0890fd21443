//! Quest Core
//!
//! Component-typed UI automation: every UI concept (button, radio, select,
//! ...) has interchangeable implementations per design framework, chosen at
//! runtime from configuration or per call, and reached through the
//! [`Quest`] DSL.

pub mod components;
pub mod concept;
pub mod container;
pub mod extension;
pub mod factory;
pub mod login;
pub mod quest;
pub mod registry;
pub mod service;
pub mod table;

pub use concept::Concept;
pub use container::Container;
pub use extension::{LoginExtension, QuestExtension};
pub use factory::{ComponentFactory, DefaultFactory};
pub use login::{BaseLoginClient, FormLoginClient, LoginClient, LoginKey, LoginSession};
pub use quest::{Quest, SoftAssertions, Storage};
pub use registry::{default_type, resolve, resolve_or_err, ComponentType};
pub use service::ComponentService;
pub use table::{CellCriteria, TableAssertions, TableData};

pub use components::accordion::{Accordion, AccordionType};
pub use components::alert::{Alert, AlertType};
pub use components::button::{Button, ButtonType};
pub use components::input::{Input, InputType};
pub use components::link::{Link, LinkType};
pub use components::loader::{Loader, LoaderType};
pub use components::modal::{Modal, ModalType};
pub use components::radio::{Radio, RadioType};
pub use components::select::{Select, SelectType};
pub use components::tab::{Tab, TabType};
pub use components::table::{Table, TableType};
pub use components::toggle::{Toggle, ToggleType};
