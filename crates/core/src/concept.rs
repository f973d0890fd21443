//! UI concepts

use serde::{Deserialize, Serialize};

/// Abstract UI capability backed by interchangeable implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Concept {
    Button,
    Input,
    Select,
    Radio,
    Toggle,
    Tab,
    Link,
    Accordion,
    Alert,
    Loader,
    Modal,
    Table,
}

impl Concept {
    pub const ALL: [Concept; 12] = [
        Concept::Button,
        Concept::Input,
        Concept::Select,
        Concept::Radio,
        Concept::Toggle,
        Concept::Tab,
        Concept::Link,
        Concept::Accordion,
        Concept::Alert,
        Concept::Loader,
        Concept::Modal,
        Concept::Table,
    ];

    /// Configuration key, as in `radio.default.type`
    pub fn key(&self) -> &'static str {
        match self {
            Concept::Button => "button",
            Concept::Input => "input",
            Concept::Select => "select",
            Concept::Radio => "radio",
            Concept::Toggle => "toggle",
            Concept::Tab => "tab",
            Concept::Link => "link",
            Concept::Accordion => "accordion",
            Concept::Alert => "alert",
            Concept::Loader => "loader",
            Concept::Modal => "modal",
            Concept::Table => "table",
        }
    }
}

impl std::fmt::Display for Concept {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for Concept {
    type Err = quest_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Concept::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| quest_common::Error::Configuration(format!("Unknown concept: {}", s)))
    }
}
