//! Search inside open shadow roots
//!
//! Plain WebDriver queries stop at shadow boundaries. The injected script
//! walks every shadow root below the start node, including the start node's
//! own, and runs the selector in each.

use quest_common::Result;
use serde_json::Value;
use tracing::debug;

use crate::by::By;
use crate::driver::{Driver, ElementId};

pub const SHADOW_SEARCH_SCRIPT: &str = r#"
const selector = arguments[0];
const start = arguments[1] || document;
const found = [];
const visit = (host) => {
  if (host.shadowRoot) {
    host.shadowRoot.querySelectorAll(selector).forEach((match) => found.push(match));
    search(host.shadowRoot);
  }
};
const search = (root) => {
  root.querySelectorAll('*').forEach(visit);
};
visit(start);
search(start);
return found;
"#;

/// Find elements matching `by` inside shadow roots below `root` (or the document).
///
/// Only CSS-expressible locators can cross shadow boundaries; anything else
/// yields no matches.
pub async fn find_in_shadow(
    driver: &dyn Driver,
    root: Option<&ElementId>,
    by: &By,
) -> Result<Vec<ElementId>> {
    let Some(selector) = by.as_css() else {
        debug!("Shadow search skipped for non-CSS locator {}", by);
        return Ok(Vec::new());
    };

    let args = vec![
        Value::String(selector),
        root.map(ElementId::to_json).unwrap_or(Value::Null),
    ];
    let result = driver.execute_script(SHADOW_SEARCH_SCRIPT, args).await?;

    let found: Vec<ElementId> = result
        .as_array()
        .map(|items| items.iter().filter_map(ElementId::from_json).collect())
        .unwrap_or_default();

    debug!("Shadow search for {} found {} element(s)", by, found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeBrowser, Node};

    #[test]
    fn test_script_checks_start_node_shadow_root() {
        let visit_start = SHADOW_SEARCH_SCRIPT.find("visit(start)").unwrap();
        let search_start = SHADOW_SEARCH_SCRIPT.find("search(start)").unwrap();
        assert!(visit_start < search_start);
    }

    #[tokio::test]
    async fn test_search_scoped_to_shadow_host() {
        let fake = FakeBrowser::new(Node::new("body").children([
            Node::new("app-card").id("first").shadow_child(Node::new("span").class("title").text("One")),
            Node::new("app-card").id("second").shadow_child(Node::new("span").class("title").text("Two")),
        ]));
        let host = fake.find_elements(None, &By::id("second")).await.unwrap();

        let found = find_in_shadow(&fake, Some(&host[0]), &By::css(".title")).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(fake.text(&found[0]).await.unwrap(), "Two");
        assert!(fake.scripts()[0].contains("visit(start)"));
    }

    #[tokio::test]
    async fn test_non_css_locator_skips_script() {
        let fake = FakeBrowser::blank();
        let found = find_in_shadow(&fake, None, &By::link_text("Home")).await.unwrap();
        assert!(found.is_empty());
        assert!(fake.scripts().is_empty());
    }
}
