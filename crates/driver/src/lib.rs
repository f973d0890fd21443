//! Quest browser driver layer
//!
//! A raw [`Driver`] seam (W3C WebDriver in production, an in-memory browser
//! behind the `fake` feature for tests) and the [`SmartDriver`] /
//! [`SmartElement`] decorators that add waiting and recovery on top of it.

pub mod by;
pub mod driver;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod shadow;
pub mod smart;
pub mod wait;
pub mod webdriver;

pub use by::By;
pub use driver::{Cookie, Driver, ElementId, W3C_ELEMENT_KEY};
#[cfg(any(test, feature = "fake"))]
pub use fake::{FakeBrowser, Node};
pub use smart::{SmartDriver, SmartElement, SmartSettings};
pub use wait::{best_effort, wait_until};
pub use webdriver::WebDriverClient;
