//! Scripted in-memory pages for driving the pipelines without a browser.
//!
//! Selectors are matched by exact string equality against each node's tag,
//! which is all the pipelines need: they only ever query by configured
//! selector strings.

#![allow(dead_code)]

use async_trait::async_trait;
use postgrab::config::SiteProfile;
use postgrab::error::{BrowseError, BrowseResult};
use postgrab::renderer::{ElementId, PageNavigator};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One element of a scripted page.
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub selector: String,
    pub attrs: HashMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }
}

/// A feed link with a nested title element, as the default profile expects.
pub fn post_link(href: &str, title: &str) -> Node {
    let site = SiteProfile::default();
    Node::new(&site.link_selector)
        .attr("href", href)
        .child(Node::new(&site.title_selector).text(title))
}

pub fn image(src: &str) -> Node {
    Node::new("img").attr("src", src)
}

/// A page: nodes shown on load plus batches revealed by load-more clicks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub nodes: Vec<Node>,
    pub batches: Vec<Vec<Node>>,
}

impl ScriptedPage {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            batches: Vec::new(),
        }
    }

    pub fn batch(mut self, nodes: Vec<Node>) -> Self {
        self.batches.push(nodes);
        self
    }
}

/// Navigator calls in the order they happened.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub struct ScriptedNavigator {
    pages: HashMap<String, ScriptedPage>,
    failing: HashSet<String>,
    load_more_selector: String,
    /// Upcoming clicks that fail with a non-timeout error.
    glitches: usize,
    current: Option<String>,
    revealed: usize,
    handles: Vec<Node>,
    log: CallLog,
}

impl Default for ScriptedNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedNavigator {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            failing: HashSet::new(),
            load_more_selector: SiteProfile::default().load_more_selector,
            glitches: 0,
            current: None,
            revealed: 0,
            handles: Vec::new(),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn page(mut self, url: &str, page: ScriptedPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Make navigation to `url` fail.
    pub fn fail_navigation(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// Make the next `n` clicks fail without timing out.
    pub fn glitch_clicks(mut self, n: usize) -> Self {
        self.glitches = n;
        self
    }

    pub fn log(&self) -> CallLog {
        Arc::clone(&self.log)
    }

    fn record(&self, call: String) {
        if let Ok(mut log) = self.log.lock() {
            log.push(call);
        }
    }

    fn visible(&self) -> Vec<&Node> {
        let Some(page) = self.current.as_ref().and_then(|url| self.pages.get(url)) else {
            return Vec::new();
        };
        page.nodes
            .iter()
            .chain(page.batches.iter().take(self.revealed).flatten())
            .collect()
    }

    fn has_more(&self) -> bool {
        self.current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .is_some_and(|page| self.revealed < page.batches.len())
    }

    fn node(&self, element: ElementId) -> BrowseResult<&Node> {
        self.handles
            .get(element.0)
            .ok_or(BrowseError::StaleElement(element.0))
    }

    fn register(&mut self, found: Vec<Node>) -> Vec<ElementId> {
        found
            .into_iter()
            .map(|node| {
                self.handles.push(node);
                ElementId(self.handles.len() - 1)
            })
            .collect()
    }
}

fn collect_matches(nodes: &[&Node], selector: &str, out: &mut Vec<Node>) {
    for node in nodes {
        if node.selector == selector {
            out.push((*node).clone());
        }
        let children: Vec<&Node> = node.children.iter().collect();
        collect_matches(&children, selector, out);
    }
}

#[async_trait]
impl PageNavigator for ScriptedNavigator {
    async fn navigate(&mut self, url: &str) -> BrowseResult<()> {
        self.record(format!("navigate {url}"));
        self.handles.clear();
        self.revealed = 0;
        self.current = None;

        if self.failing.contains(url) {
            return Err(BrowseError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        if !self.pages.contains_key(url) {
            return Err(BrowseError::Navigation {
                url: url.to_string(),
                reason: "no scripted page".to_string(),
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, timeout: Duration) -> BrowseResult<()> {
        let mut found = Vec::new();
        collect_matches(&self.visible(), selector, &mut found);
        if found.is_empty() {
            return Err(BrowseError::Timeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str, timeout: Duration) -> BrowseResult<()> {
        self.record(format!("click {selector}"));
        if self.glitches > 0 {
            self.glitches -= 1;
            return Err(BrowseError::Interaction {
                selector: selector.to_string(),
                reason: "element is detached".to_string(),
            });
        }
        if selector == self.load_more_selector && self.has_more() {
            self.revealed += 1;
            return Ok(());
        }
        Err(BrowseError::Timeout {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })
    }

    async fn wait(&mut self, _duration: Duration) {}

    async fn query_all(&mut self, selector: &str) -> BrowseResult<Vec<ElementId>> {
        let mut found = Vec::new();
        collect_matches(&self.visible(), selector, &mut found);
        Ok(self.register(found))
    }

    async fn query_within(
        &mut self,
        parent: ElementId,
        selector: &str,
    ) -> BrowseResult<Vec<ElementId>> {
        let parent = self.node(parent)?;
        let children: Vec<&Node> = parent.children.iter().collect();
        let mut found = Vec::new();
        collect_matches(&children, selector, &mut found);
        Ok(self.register(found))
    }

    async fn attribute(&self, element: ElementId, name: &str) -> BrowseResult<Option<String>> {
        Ok(self.node(element)?.attrs.get(name).cloned())
    }

    async fn text(&self, element: ElementId) -> BrowseResult<Option<String>> {
        Ok(self.node(element)?.text.clone())
    }

    async fn close(self: Box<Self>) -> BrowseResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}

/// Count logged calls starting with `prefix`.
pub fn count_calls(log: &CallLog, prefix: &str) -> usize {
    log.lock()
        .map(|calls| calls.iter().filter(|c| c.starts_with(prefix)).count())
        .unwrap_or(0)
}
