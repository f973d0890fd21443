//! Element locators

use serde::{Deserialize, Serialize};

/// How to find an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum By {
    Css(String),
    XPath(String),
    Id(String),
    ClassName(String),
    Name(String),
    TagName(String),
    LinkText(String),
    PartialLinkText(String),
}

impl By {
    pub fn css(selector: impl Into<String>) -> Self {
        By::Css(selector.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        By::XPath(expr.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        By::Id(id.into())
    }

    pub fn class_name(class: impl Into<String>) -> Self {
        By::ClassName(class.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        By::Name(name.into())
    }

    pub fn tag_name(tag: impl Into<String>) -> Self {
        By::TagName(tag.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        By::LinkText(text.into())
    }

    /// W3C location strategy and value.
    ///
    /// WebDriver only knows css, xpath, tag name and link text; the
    /// id/class/name locators are rewritten as CSS.
    pub fn to_w3c(&self) -> (&'static str, String) {
        match self {
            By::XPath(x) => ("xpath", x.clone()),
            By::TagName(t) => ("tag name", t.clone()),
            By::LinkText(t) => ("link text", t.clone()),
            By::PartialLinkText(t) => ("partial link text", t.clone()),
            other => (
                "css selector",
                other.as_css().unwrap_or_default(),
            ),
        }
    }

    /// Equivalent CSS selector, when one exists
    pub fn as_css(&self) -> Option<String> {
        match self {
            By::Css(s) => Some(s.clone()),
            By::Id(id) => Some(format!("#{}", id)),
            By::ClassName(c) => Some(format!(".{}", c)),
            By::Name(n) => Some(format!("[name=\"{}\"]", n)),
            By::TagName(t) => Some(t.clone()),
            By::XPath(_) | By::LinkText(_) | By::PartialLinkText(_) => None,
        }
    }
}

impl std::fmt::Display for By {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            By::Css(s) => write!(f, "By.css: {}", s),
            By::XPath(s) => write!(f, "By.xpath: {}", s),
            By::Id(s) => write!(f, "By.id: {}", s),
            By::ClassName(s) => write!(f, "By.className: {}", s),
            By::Name(s) => write!(f, "By.name: {}", s),
            By::TagName(s) => write!(f, "By.tagName: {}", s),
            By::LinkText(s) => write!(f, "By.linkText: {}", s),
            By::PartialLinkText(s) => write!(f, "By.partialLinkText: {}", s),
        }
    }
}

impl From<&str> for By {
    fn from(selector: &str) -> Self {
        By::Css(selector.to_string())
    }
}
