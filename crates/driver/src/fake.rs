//! In-memory browser for tests
//!
//! [`FakeBrowser`] implements [`Driver`] over a small DOM built from [`Node`]s.
//! Selectors support tags, `*`, `.class`, `#id`, `:scope`, `[attr]`,
//! `[attr=value]`, `[attr*=value]`, descendant and child combinators, and
//! selector lists. Anything else is rejected with `IllegalArgument`.
//!
//! Besides native radio, checkbox and option clicks, nodes can be scripted to
//! intercept clicks, appear or vanish after a number of lookups, flip
//! attributes or classes when clicked, or hide an ancestor (close buttons).
//! Replacing the page invalidates every element id handed out before.

use async_trait::async_trait;
use parking_lot::Mutex;
use quest_common::{Error, Result};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::by::By;
use crate::driver::{Cookie, Driver, ElementId};

/// Handler for scripts the fake does not interpret itself
pub type ScriptHandler = Arc<dyn Fn(&str, &[Value]) -> Result<Value> + Send + Sync>;

const SCRIPT_CLICK: &str = "arguments[0].click();";

#[derive(Debug, Clone)]
enum Effect {
    Toggle(String),
    ToggleClass(String),
    Activate(String),
    ActivateClass(String),
    Dismiss(String),
}

/// Page node description
#[derive(Debug, Clone, Default)]
pub struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    children: Vec<Node>,
    shadow: Vec<Node>,
    hidden: bool,
    intercepts: usize,
    appears_on: usize,
    vanishes_on: Option<usize>,
    effects: Vec<Effect>,
    group: Option<String>,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            ..Default::default()
        }
    }

    pub fn class(mut self, class: &str) -> Self {
        let classes = self.attrs.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        self
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Child attached inside this node's shadow root
    pub fn shadow_child(mut self, child: Node) -> Self {
        self.shadow.push(child);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn disabled(self) -> Self {
        self.attr("disabled", "true")
    }

    pub fn checked(self) -> Self {
        self.attr("checked", "true")
    }

    pub fn selected(self) -> Self {
        self.attr("selected", "true")
    }

    /// The next `times` driver clicks fail as intercepted
    pub fn intercept_clicks(mut self, times: usize) -> Self {
        self.intercepts = times;
        self
    }

    /// Absent from the page until the `lookup`th element lookup
    pub fn appears_on_lookup(mut self, lookup: usize) -> Self {
        self.appears_on = lookup;
        self
    }

    /// Removed from the page from the `lookup`th element lookup on
    pub fn vanishes_on_lookup(mut self, lookup: usize) -> Self {
        self.vanishes_on = Some(lookup);
        self
    }

    /// Clicking flips `attr` between "true" and "false"
    pub fn toggles(mut self, attr: &str) -> Self {
        self.effects.push(Effect::Toggle(attr.to_string()));
        self
    }

    pub fn toggles_class(mut self, class: &str) -> Self {
        self.effects.push(Effect::ToggleClass(class.to_string()));
        self
    }

    /// Clicking sets `attr` to "true" here and "false" on every peer
    pub fn activates(mut self, attr: &str) -> Self {
        self.effects.push(Effect::Activate(attr.to_string()));
        self
    }

    /// Clicking moves `class` from the peers to this node
    pub fn activates_class(mut self, class: &str) -> Self {
        self.effects.push(Effect::ActivateClass(class.to_string()));
        self
    }

    /// Clicking hides the closest ancestor matching `selector`
    pub fn dismisses(mut self, selector: &str) -> Self {
        self.effects.push(Effect::Dismiss(selector.to_string()));
        self
    }

    /// Peers for `activates`; defaults to same-tag siblings
    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

#[derive(Debug)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<usize>,
    children: Vec<usize>,
    in_shadow: bool,
    hidden: bool,
    intercepts: usize,
    appears_on: usize,
    vanishes_on: Option<usize>,
    effects: Vec<Effect>,
    group: Option<String>,
}

impl Element {
    fn has_class(&self, class: &str) -> bool {
        self.attrs
            .get("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    fn set_class(&mut self, class: &str, on: bool) {
        let mut classes: Vec<String> = self
            .attrs
            .get("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        classes.retain(|c| c != class);
        if on {
            classes.push(class.to_string());
        }
        self.attrs.insert("class".to_string(), classes.join(" "));
    }

    fn flag(&self, name: &str) -> bool {
        self.attrs.get(name).map(|v| v != "false").unwrap_or(false)
    }
}

struct Dom {
    generation: u64,
    elements: Vec<Element>,
}

impl Dom {
    fn build(page: Node, generation: u64) -> Self {
        let mut dom = Dom {
            generation,
            elements: Vec::new(),
        };
        let root = dom.insert(Node::new("html"), None, false);
        let body = dom.insert(page, Some(root), false);
        dom.elements[root].children.push(body);
        dom
    }

    fn insert(&mut self, node: Node, parent: Option<usize>, in_shadow: bool) -> usize {
        let idx = self.elements.len();
        let Node {
            tag,
            attrs,
            text,
            children,
            shadow,
            hidden,
            intercepts,
            appears_on,
            vanishes_on,
            effects,
            group,
        } = node;

        self.elements.push(Element {
            tag,
            attrs,
            text,
            parent,
            children: Vec::new(),
            in_shadow,
            hidden,
            intercepts,
            appears_on,
            vanishes_on,
            effects,
            group,
        });

        for child in children {
            let c = self.insert(child, Some(idx), in_shadow);
            self.elements[idx].children.push(c);
        }
        for child in shadow {
            let c = self.insert(child, Some(idx), true);
            self.elements[idx].children.push(c);
        }
        idx
    }

    fn ancestors(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.elements[idx].parent, move |&i| self.elements[i].parent)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AttrOp {
    Exists,
    Equals(String),
    Contains(String),
}

#[derive(Debug, Clone, Default)]
struct Compound {
    scope: bool,
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attrs: Vec<(String, AttrOp)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

/// Compounds left to right; the first combinator is unused
type Complex = Vec<(Combinator, Compound)>;

fn invalid(selector: &str) -> Error {
    Error::IllegalArgument(format!("unsupported selector '{}'", selector))
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_selector(selector: &str) -> Result<Vec<Complex>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    for c in selector.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            ',' if depth == 0 => {
                groups.push(parse_complex(&current, selector)?);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    groups.push(parse_complex(&current, selector)?);
    Ok(groups)
}

fn parse_complex(group: &str, selector: &str) -> Result<Complex> {
    let mut parts = Vec::new();
    let mut combinator = Combinator::Descendant;
    let mut chars = group.trim().chars().peekable();
    let mut token = String::new();

    while let Some(c) = chars.next() {
        match c {
            '[' => {
                token.push(c);
                for c in chars.by_ref() {
                    token.push(c);
                    if c == ']' {
                        break;
                    }
                }
            }
            '>' if token.is_empty() && parts.is_empty() => return Err(invalid(selector)),
            ' ' | '>' => {
                if !token.is_empty() {
                    parts.push((combinator, parse_compound(&token, selector)?));
                    token.clear();
                    combinator = Combinator::Descendant;
                }
                if c == '>' {
                    combinator = Combinator::Child;
                }
            }
            _ => token.push(c),
        }
    }
    if !token.is_empty() {
        parts.push((combinator, parse_compound(&token, selector)?));
    }
    if parts.is_empty() {
        return Err(invalid(selector));
    }
    Ok(parts)
}

fn parse_compound(token: &str, selector: &str) -> Result<Compound> {
    let mut compound = Compound::default();
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;

    let read_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && is_ident(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        match chars[i] {
            '*' => i += 1,
            '.' => {
                i += 1;
                compound.classes.push(read_ident(&mut i));
            }
            '#' => {
                i += 1;
                compound.ids.push(read_ident(&mut i));
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == ']')
                    .map(|p| p + i)
                    .ok_or_else(|| invalid(selector))?;
                let inner: String = chars[i + 1..end].iter().collect();
                compound.attrs.push(parse_attr(&inner, selector)?);
                i = end + 1;
            }
            ':' => {
                i += 1;
                if read_ident(&mut i) != "scope" {
                    return Err(invalid(selector));
                }
                compound.scope = true;
            }
            c if is_ident(c) => compound.tag = Some(read_ident(&mut i).to_lowercase()),
            _ => return Err(invalid(selector)),
        }
    }
    Ok(compound)
}

fn parse_attr(inner: &str, selector: &str) -> Result<(String, AttrOp)> {
    let unquote = |v: &str| v.trim().trim_matches('"').trim_matches('\'').to_string();
    let (name, op) = if let Some((name, value)) = inner.split_once("*=") {
        (name, AttrOp::Contains(unquote(value)))
    } else if let Some((name, value)) = inner.split_once('=') {
        (name, AttrOp::Equals(unquote(value)))
    } else {
        (inner, AttrOp::Exists)
    };
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident) {
        return Err(invalid(selector));
    }
    Ok((name.to_string(), op))
}

fn matches_compound(element: &Element, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if &element.tag != tag {
            return false;
        }
    }
    compound
        .ids
        .iter()
        .all(|id| element.attrs.get("id") == Some(id))
        && compound.classes.iter().all(|c| element.has_class(c))
        && compound.attrs.iter().all(|(name, op)| {
            match (element.attrs.get(name), op) {
                (Some(_), AttrOp::Exists) => true,
                (Some(v), AttrOp::Equals(expected)) => v == expected,
                (Some(v), AttrOp::Contains(part)) => v.contains(part.as_str()),
                (None, _) => false,
            }
        })
}

/// `scope` is the element `:scope` refers to, if any
fn matches_complex(
    dom: &Dom,
    idx: usize,
    parts: &[(Combinator, Compound)],
    scope: Option<usize>,
) -> bool {
    let Some(((combinator, last), rest)) = parts.split_last() else {
        return true;
    };
    if last.scope && scope != Some(idx) {
        return false;
    }
    if !matches_compound(&dom.elements[idx], last) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => dom.elements[idx]
            .parent
            .map(|p| matches_complex(dom, p, rest, scope))
            .unwrap_or(false),
        Combinator::Descendant => dom
            .ancestors(idx)
            .any(|a| matches_complex(dom, a, rest, scope)),
    }
}

struct State {
    dom: Dom,
    url: String,
    title: String,
    routes: HashMap<String, Node>,
    alert: Option<String>,
    cookies: Vec<Cookie>,
    clicks: Vec<String>,
    scripts: Vec<String>,
    lookups: usize,
    failing_lookups: usize,
}

impl State {
    fn present(&self, idx: usize) -> bool {
        std::iter::once(idx)
            .chain(self.dom.ancestors(idx))
            .all(|i| {
                let e = &self.dom.elements[i];
                self.lookups >= e.appears_on && e.vanishes_on.map_or(true, |n| self.lookups < n)
            })
    }

    fn displayed(&self, idx: usize) -> bool {
        self.present(idx)
            && std::iter::once(idx)
                .chain(self.dom.ancestors(idx))
                .all(|i| !self.dom.elements[i].hidden)
    }

    fn element_id(&self, idx: usize) -> ElementId {
        ElementId::new(format!("fake-{}-{}", self.dom.generation, idx))
    }

    fn resolve(&self, id: &ElementId) -> Result<usize> {
        let stale = || Error::StaleElement(format!("{} is no longer attached to the page", id));
        let (generation, idx) = id
            .as_str()
            .strip_prefix("fake-")
            .and_then(|rest| rest.split_once('-'))
            .and_then(|(g, i)| Some((g.parse::<u64>().ok()?, i.parse::<usize>().ok()?)))
            .ok_or_else(|| Error::not_found(id.to_string()))?;

        if generation != self.dom.generation || idx >= self.dom.elements.len() || !self.present(idx) {
            return Err(stale());
        }
        Ok(idx)
    }

    fn query(&self, root: usize, selector: &[Complex], shadow: bool, out: &mut Vec<usize>) {
        self.collect(root, root, selector, shadow, out);
    }

    fn collect(&self, scope: usize, node: usize, selector: &[Complex], shadow: bool, out: &mut Vec<usize>) {
        for &child in &self.dom.elements[node].children {
            if !self.present(child) {
                continue;
            }
            let in_shadow = self.dom.elements[child].in_shadow;
            if in_shadow && !shadow {
                continue;
            }
            if in_shadow == shadow
                && selector
                    .iter()
                    .any(|c| matches_complex(&self.dom, child, c, Some(scope)))
            {
                out.push(child);
            }
            self.collect(scope, child, selector, shadow, out);
        }
    }

    fn text(&self, idx: usize) -> String {
        if !self.displayed(idx) {
            return String::new();
        }
        let element = &self.dom.elements[idx];
        let mut parts = Vec::new();
        if !element.text.trim().is_empty() {
            parts.push(element.text.trim().to_string());
        }
        for &child in &element.children {
            let text = self.text(child);
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join(" ")
    }

    fn describe(&self, idx: usize) -> String {
        let element = &self.dom.elements[idx];
        let text = self.text(idx);
        if !text.is_empty() {
            text
        } else if let Some(id) = element.attrs.get("id") {
            format!("#{}", id)
        } else if let Some(value) = element.attrs.get("value") {
            value.clone()
        } else {
            element.tag.clone()
        }
    }

    fn find(&self, root: Option<usize>, by: &By) -> Result<Vec<usize>> {
        let root = root.unwrap_or(0);
        let mut found = Vec::new();
        match by {
            By::XPath(_) => {
                return Err(Error::IllegalArgument(
                    "xpath is not supported by the fake browser".to_string(),
                ))
            }
            By::LinkText(text) | By::PartialLinkText(text) => {
                let partial = matches!(by, By::PartialLinkText(_));
                let anchors = parse_selector("a")?;
                let mut candidates = Vec::new();
                self.query(root, &anchors, false, &mut candidates);
                found.extend(candidates.into_iter().filter(|&i| {
                    let own = self.text(i);
                    if partial {
                        own.contains(text.as_str())
                    } else {
                        own == *text
                    }
                }));
            }
            other => {
                let css = other.as_css().unwrap_or_default();
                self.query(root, &parse_selector(&css)?, false, &mut found);
            }
        }
        Ok(found)
    }

    fn peers(&self, idx: usize) -> Vec<usize> {
        let element = &self.dom.elements[idx];
        match &element.group {
            Some(group) => (0..self.dom.elements.len())
                .filter(|&i| i != idx && self.dom.elements[i].group.as_ref() == Some(group))
                .collect(),
            None => element
                .parent
                .map(|p| {
                    self.dom.elements[p]
                        .children
                        .iter()
                        .copied()
                        .filter(|&i| i != idx && self.dom.elements[i].tag == element.tag)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn click(&mut self, idx: usize, scripted: bool) -> Result<()> {
        if !scripted {
            if !self.displayed(idx) {
                return Err(Error::NotInteractable(format!("{} is not displayed", self.describe(idx))));
            }
            if self.dom.elements[idx].intercepts > 0 {
                self.dom.elements[idx].intercepts -= 1;
                return Err(Error::ClickIntercepted(format!(
                    "another element would receive the click on {}",
                    self.describe(idx)
                )));
            }
        }
        if self.dom.elements[idx].flag("disabled") {
            return Ok(());
        }

        let description = self.describe(idx);
        self.clicks.push(description);
        self.native_click(idx);

        for effect in self.dom.elements[idx].effects.clone() {
            match effect {
                Effect::Toggle(attr) => {
                    let on = self.dom.elements[idx].attrs.get(&attr).map(String::as_str) == Some("true");
                    self.dom.elements[idx]
                        .attrs
                        .insert(attr, (!on).to_string());
                }
                Effect::ToggleClass(class) => {
                    let on = self.dom.elements[idx].has_class(&class);
                    self.dom.elements[idx].set_class(&class, !on);
                }
                Effect::Activate(attr) => {
                    for peer in self.peers(idx) {
                        self.dom.elements[peer]
                            .attrs
                            .insert(attr.clone(), "false".to_string());
                    }
                    self.dom.elements[idx].attrs.insert(attr, "true".to_string());
                }
                Effect::ActivateClass(class) => {
                    for peer in self.peers(idx) {
                        self.dom.elements[peer].set_class(&class, false);
                    }
                    self.dom.elements[idx].set_class(&class, true);
                }
                Effect::Dismiss(selector) => {
                    let selector = parse_selector(&selector)?;
                    let target = self
                        .dom
                        .ancestors(idx)
                        .find(|&a| selector.iter().any(|c| matches_complex(&self.dom, a, c, None)));
                    if let Some(target) = target {
                        self.dom.elements[target].hidden = true;
                    }
                }
            }
        }
        Ok(())
    }

    fn native_click(&mut self, idx: usize) {
        let tag = self.dom.elements[idx].tag.clone();
        let kind = self.dom.elements[idx].attrs.get("type").cloned();
        match (tag.as_str(), kind.as_deref()) {
            ("input", Some("radio")) => {
                let name = self.dom.elements[idx].attrs.get("name").cloned();
                if let Some(name) = name {
                    for other in self.dom.elements.iter_mut() {
                        if other.tag == "input" && other.attrs.get("name") == Some(&name) {
                            other.attrs.remove("checked");
                        }
                    }
                }
                self.dom.elements[idx]
                    .attrs
                    .insert("checked".to_string(), "true".to_string());
            }
            ("input", Some("checkbox")) => {
                if self.dom.elements[idx].attrs.remove("checked").is_none() {
                    self.dom.elements[idx]
                        .attrs
                        .insert("checked".to_string(), "true".to_string());
                }
            }
            ("option", _) => {
                let Some(select) = self
                    .dom
                    .ancestors(idx)
                    .find(|&a| self.dom.elements[a].tag == "select")
                else {
                    return;
                };
                if self.dom.elements[select].attrs.contains_key("multiple") {
                    if self.dom.elements[idx].attrs.remove("selected").is_none() {
                        self.dom.elements[idx]
                            .attrs
                            .insert("selected".to_string(), "true".to_string());
                    }
                } else {
                    let mut options = Vec::new();
                    let selector = parse_selector("option").unwrap_or_default();
                    self.query(select, &selector, false, &mut options);
                    for option in options {
                        self.dom.elements[option].attrs.remove("selected");
                    }
                    self.dom.elements[idx]
                        .attrs
                        .insert("selected".to_string(), "true".to_string());
                }
            }
            _ => {}
        }
    }
}

/// In-memory [`Driver`] for tests
pub struct FakeBrowser {
    state: Mutex<State>,
    scripts_enabled: bool,
    handler: Option<ScriptHandler>,
}

impl FakeBrowser {
    pub fn new(page: Node) -> Self {
        Self {
            state: Mutex::new(State {
                dom: Dom::build(page, 1),
                url: "about:blank".to_string(),
                title: String::new(),
                routes: HashMap::new(),
                alert: None,
                cookies: Vec::new(),
                clicks: Vec::new(),
                scripts: Vec::new(),
                lookups: 0,
                failing_lookups: 0,
            }),
            scripts_enabled: true,
            handler: None,
        }
    }

    pub fn blank() -> Self {
        Self::new(Node::new("body"))
    }

    /// Report no script support and reject scripts
    pub fn without_script(mut self) -> Self {
        self.scripts_enabled = false;
        self
    }

    pub fn with_script_handler(
        mut self,
        handler: impl Fn(&str, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Fail the next `count` lookups with a transport error
    pub fn fail_lookups(mut self, count: usize) -> Self {
        self.state.get_mut().failing_lookups = count;
        self
    }

    /// Page served when navigating to `url`
    pub fn with_route(mut self, url: &str, page: Node) -> Self {
        self.state.get_mut().routes.insert(url.to_string(), page);
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.state.get_mut().title = title.to_string();
        self
    }

    /// Replace the page; earlier element ids become stale
    pub fn set_page(&self, page: Node) {
        let mut state = self.state.lock();
        let generation = state.dom.generation + 1;
        state.dom = Dom::build(page, generation);
    }

    /// Re-render the same page; earlier element ids become stale
    pub fn refresh(&self) {
        self.state.lock().dom.generation += 1;
    }

    pub fn set_alert(&self, text: &str) {
        self.state.lock().alert = Some(text.to_string());
    }

    /// Descriptions of clicked elements, in order
    pub fn clicked(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().scripts.clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.state.lock().lookups
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    fn first(&self, css: &str) -> Option<usize> {
        let state = self.state.lock();
        state.find(None, &By::css(css)).ok()?.into_iter().next()
    }

    pub fn attribute_of(&self, css: &str, name: &str) -> Option<String> {
        let idx = self.first(css)?;
        self.state.lock().dom.elements[idx].attrs.get(name).cloned()
    }

    pub fn value_of(&self, css: &str) -> String {
        self.attribute_of(css, "value").unwrap_or_default()
    }

    /// Whether the first match is checked or selected
    pub fn is_checked(&self, css: &str) -> bool {
        self.first(css)
            .map(|idx| {
                let state = self.state.lock();
                let e = &state.dom.elements[idx];
                e.attrs.contains_key("checked") || e.attrs.contains_key("selected")
            })
            .unwrap_or(false)
    }

    pub fn has_class(&self, css: &str, class: &str) -> bool {
        self.first(css)
            .map(|idx| self.state.lock().dom.elements[idx].has_class(class))
            .unwrap_or(false)
    }

    pub fn is_hidden(&self, css: &str) -> bool {
        self.first(css)
            .map(|idx| !self.state.lock().displayed(idx))
            .unwrap_or(true)
    }

    fn element_arg(state: &State, args: &[Value]) -> Result<usize> {
        let id = args
            .first()
            .and_then(ElementId::from_json)
            .ok_or_else(|| Error::IllegalArgument("script expects an element argument".to_string()))?;
        state.resolve(&id)
    }
}

#[async_trait]
impl Driver for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.url = url.to_string();
        if let Some(page) = state.routes.get(url).cloned() {
            let generation = state.dom.generation + 1;
            state.dom = Dom::build(page, generation);
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().url.clone())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.state.lock().title.clone())
    }

    async fn find_elements(&self, root: Option<&ElementId>, by: &By) -> Result<Vec<ElementId>> {
        let mut state = self.state.lock();
        state.lookups += 1;
        if state.failing_lookups > 0 {
            state.failing_lookups -= 1;
            return Err(Error::Transport("connection reset by browser".to_string()));
        }
        let root = root.map(|id| state.resolve(id)).transpose()?;
        let found = state.find(root, by)?;
        Ok(found.into_iter().map(|idx| state.element_id(idx)).collect())
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.resolve(element)?;
        state.click(idx, false)
    }

    async fn clear(&self, element: &ElementId) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.resolve(element)?;
        if !state.displayed(idx) || state.dom.elements[idx].flag("disabled") {
            return Err(Error::NotInteractable(state.describe(idx)));
        }
        state.dom.elements[idx]
            .attrs
            .insert("value".to_string(), String::new());
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.resolve(element)?;
        if !state.displayed(idx) || state.dom.elements[idx].flag("disabled") {
            return Err(Error::NotInteractable(state.describe(idx)));
        }
        state.dom.elements[idx]
            .attrs
            .entry("value".to_string())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        let state = self.state.lock();
        let idx = state.resolve(element)?;
        Ok(state.text(idx))
    }

    async fn attribute(&self, element: &ElementId, name: &str) -> Result<Option<String>> {
        let state = self.state.lock();
        let idx = state.resolve(element)?;
        let e = &state.dom.elements[idx];
        Ok(match name {
            "checked" | "selected" | "disabled" => e.flag(name).then(|| "true".to_string()),
            "value" if matches!(e.tag.as_str(), "input" | "textarea") => {
                Some(e.attrs.get("value").cloned().unwrap_or_default())
            }
            _ => e.attrs.get(name).cloned(),
        })
    }

    async fn tag_name(&self, element: &ElementId) -> Result<String> {
        let state = self.state.lock();
        let idx = state.resolve(element)?;
        Ok(state.dom.elements[idx].tag.clone())
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        let state = self.state.lock();
        let idx = state.resolve(element)?;
        Ok(state.displayed(idx))
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        let state = self.state.lock();
        let idx = state.resolve(element)?;
        Ok(!state.dom.elements[idx].flag("disabled"))
    }

    async fn is_selected(&self, element: &ElementId) -> Result<bool> {
        let state = self.state.lock();
        let idx = state.resolve(element)?;
        let e = &state.dom.elements[idx];
        Ok(e.flag("checked") || e.flag("selected"))
    }

    fn supports_script(&self) -> bool {
        self.scripts_enabled
    }

    async fn execute_script(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        if !self.scripts_enabled {
            return Err(Error::Script("script execution is disabled".to_string()));
        }
        {
            let mut state = self.state.lock();
            state.scripts.push(script.trim().to_string());

            if script.contains("shadowRoot") {
                let selector = args.first().and_then(Value::as_str).unwrap_or_default();
                let root = match args.get(1).and_then(ElementId::from_json) {
                    Some(id) => state.resolve(&id)?,
                    None => 0,
                };
                let mut found = Vec::new();
                state.query(root, &parse_selector(selector)?, true, &mut found);
                return Ok(Value::Array(
                    found
                        .into_iter()
                        .map(|idx| state.element_id(idx).to_json())
                        .collect(),
                ));
            }
            if script.contains("scrollIntoView") {
                Self::element_arg(&state, &args)?;
                return Ok(Value::Null);
            }
            if script.trim() == SCRIPT_CLICK {
                let idx = Self::element_arg(&state, &args)?;
                state.click(idx, true)?;
                return Ok(Value::Null);
            }
        }

        match &self.handler {
            Some(handler) => handler(script, &args),
            None => Ok(Value::Null),
        }
    }

    async fn alert_text(&self) -> Result<String> {
        self.state
            .lock()
            .alert
            .clone()
            .ok_or_else(|| Error::from_webdriver("no such alert", "no alert is open"))
    }

    async fn accept_alert(&self) -> Result<()> {
        self.state
            .lock()
            .alert
            .take()
            .map(|_| ())
            .ok_or_else(|| Error::from_webdriver("no such alert", "no alert is open"))
    }

    async fn dismiss_alert(&self) -> Result<()> {
        self.accept_alert().await
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.state.lock().cookies.clone())
    }

    async fn add_cookie(&self, cookie: &Cookie) -> Result<()> {
        let mut state = self.state.lock();
        state.cookies.retain(|c| c.name != cookie.name);
        state.cookies.push(cookie.clone());
        Ok(())
    }

    async fn delete_cookies(&self) -> Result<()> {
        self.state.lock().cookies.clear();
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        Ok(())
    }
}
