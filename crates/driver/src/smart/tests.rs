//! Smart driver behaviour against the in-memory browser

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::*;
use crate::fake::{FakeBrowser, Node};

fn settings() -> SmartSettings {
    SmartSettings {
        wait: Duration::from_millis(200),
        poll: Duration::from_millis(1),
        ..Default::default()
    }
}

fn smart(fake: &Arc<FakeBrowser>, settings: SmartSettings) -> SmartDriver {
    SmartDriver::new(fake.clone(), settings)
}

#[tokio::test]
async fn test_lookup_waits_for_late_element() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").child(Node::new("button").class("btn").text("Late").appears_on_lookup(3)),
    ));
    let driver = smart(&fake, settings());

    let button = driver.find_element(&By::css(".btn")).await.unwrap();

    assert_eq!(button.text().await.unwrap(), "Late");
    assert!(fake.lookup_count() >= 3);
}

#[tokio::test]
async fn test_missing_element_names_locator() {
    let fake = Arc::new(FakeBrowser::blank());
    let driver = smart(
        &fake,
        SmartSettings {
            wait: Duration::from_millis(10),
            ..settings()
        },
    );

    let err = driver.find_element(&By::css("#nope")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("By.css: #nope"));
}

#[tokio::test]
async fn test_unwrapped_lookup_does_not_wait() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").child(Node::new("span").appears_on_lookup(2)),
    ));
    let driver = smart(
        &fake,
        SmartSettings {
            wrapped: false,
            ..settings()
        },
    );

    assert!(driver.find_elements(&By::css("span")).await.unwrap().is_empty());
    assert_eq!(fake.lookup_count(), 1);
}

#[tokio::test]
async fn test_intercepted_click_falls_back_to_script() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").child(Node::new("button").text("Submit").intercept_clicks(2)),
    ));
    let driver = smart(&fake, settings());

    driver
        .find_element(&By::css("button"))
        .await
        .unwrap()
        .click()
        .await
        .unwrap();

    assert_eq!(fake.clicked(), vec!["Submit"]);
    let scripts = fake.scripts();
    assert!(scripts[0].contains("scrollIntoView"));
    assert_eq!(scripts[1], "arguments[0].click();");
}

#[tokio::test]
async fn test_intercepted_click_without_script_support_fails() {
    let fake = Arc::new(
        FakeBrowser::new(Node::new("body").child(Node::new("button").text("Submit").intercept_clicks(1)))
            .without_script(),
    );
    let driver = smart(&fake, settings());

    let err = driver
        .find_element(&By::css("button"))
        .await
        .unwrap()
        .click()
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ClickIntercepted);
}

#[tokio::test]
async fn test_stale_element_is_located_again() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").children([
            Node::new("p").class("note").text("first"),
            Node::new("p").class("note").text("second"),
        ]),
    ));
    let driver = smart(&fake, settings());
    let notes = driver.find_elements(&By::css(".note")).await.unwrap();

    fake.refresh();

    assert_eq!(notes[1].text().await.unwrap(), "second");
}

#[tokio::test]
async fn test_stale_element_unwrapped_surfaces_error() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").child(Node::new("p").text("only")),
    ));
    let driver = smart(
        &fake,
        SmartSettings {
            wrapped: false,
            ..settings()
        },
    );
    let p = driver.find_element(&By::css("p")).await.unwrap();

    fake.refresh();

    assert_eq!(p.text().await.unwrap_err().kind(), ErrorKind::StaleElement);
}

#[tokio::test]
async fn test_shadow_root_fallback() {
    let page = Node::new("body")
        .child(Node::new("app-shell").shadow_child(Node::new("button").class("inner").text("Deep")));

    let fake = Arc::new(FakeBrowser::new(page.clone()));
    let plain = smart(
        &fake,
        SmartSettings {
            wait: Duration::from_millis(5),
            ..settings()
        },
    );
    assert!(plain.find_elements(&By::css(".inner")).await.unwrap().is_empty());

    let fake = Arc::new(FakeBrowser::new(page));
    let shadowed = smart(
        &fake,
        SmartSettings {
            wait: Duration::from_millis(5),
            shadow_root: true,
            ..settings()
        },
    );
    let found = shadowed.find_element(&By::css(".inner")).await.unwrap();
    assert_eq!(found.text().await.unwrap(), "Deep");
}

#[tokio::test]
async fn test_shadow_match_ends_wait_early() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").child(Node::new("app-shell").shadow_child(Node::new("button").class("inner").text("Deep"))),
    ));
    let driver = smart(
        &fake,
        SmartSettings {
            wait: Duration::from_millis(1500),
            shadow_root: true,
            ..settings()
        },
    );

    let started = Instant::now();
    let found = driver.find_element(&By::css(".inner")).await.unwrap();

    assert_eq!(found.text().await.unwrap(), "Deep");
    assert!(started.elapsed() < Duration::from_millis(500), "{:?}", started.elapsed());
}

#[tokio::test]
async fn test_failed_wait_falls_through_to_lookup() {
    let fake = Arc::new(
        FakeBrowser::new(Node::new("body").child(Node::new("button").class("btn").text("Save"))).fail_lookups(1),
    );
    let driver = smart(&fake, settings());

    let button = driver.find_element(&By::css(".btn")).await.unwrap();

    assert_eq!(button.text().await.unwrap(), "Save");
    assert_eq!(fake.lookup_count(), 2);
}

#[tokio::test]
async fn test_script_without_support_is_illegal_state() {
    let fake = Arc::new(FakeBrowser::blank().without_script());
    let driver = smart(&fake, settings());

    let err = driver.execute_script("return 1;", vec![]).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::IllegalState);
}

#[tokio::test]
async fn test_navigate_joins_base_url() {
    let fake = Arc::new(FakeBrowser::blank());
    let driver = smart(
        &fake,
        SmartSettings {
            base_url: Some("https://shop.test/".to_string()),
            ..settings()
        },
    );

    driver.navigate("/cart").await.unwrap();
    assert_eq!(fake.url(), "https://shop.test/cart");

    driver.navigate("https://other.test/").await.unwrap();
    assert_eq!(fake.url(), "https://other.test/");
}

#[tokio::test]
async fn test_wait_until_gone() {
    let fake = Arc::new(FakeBrowser::new(
        Node::new("body").child(Node::new("div").class("spinner").vanishes_on_lookup(4)),
    ));
    let driver = smart(&fake, settings());

    driver
        .wait_until_gone(None, &By::css(".spinner"), Duration::from_secs(1))
        .await
        .unwrap();
    assert!(fake.lookup_count() >= 4);
}
