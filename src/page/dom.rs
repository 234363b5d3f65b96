//! Minimal document tree for injected overlays and download anchors.
//!
//! Nodes live in a generational arena. Detaching keeps a node alive so it can
//! be re-attached; [`Document::remove`] detaches and frees the whole subtree,
//! after which stale [`NodeId`]s read as empty, disconnected nodes. Lookups by
//! id only see nodes connected to the body, which matches
//! `document.getElementById`.

use super::Page;
use std::collections::BTreeMap;
use std::rc::Rc;

pub type Listener = Rc<dyn Fn(&mut Page)>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReadyState {
    Loading,
    #[default]
    Complete,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct StyleValue {
    value: String,
    important: bool,
}

/// Inline style declarations, keyed by property name.
#[derive(Clone, Debug, Default)]
pub struct Style {
    props: BTreeMap<String, StyleValue>,
}

static EMPTY_STYLE: Style = Style {
    props: BTreeMap::new(),
};

impl Style {
    /// Replace every declaration with the ones parsed from `css`.
    pub fn set_css_text(&mut self, css: &str) {
        self.props.clear();
        for declaration in css.split(';') {
            let Some((name, value)) = declaration.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim();
            let (value, important) = match value.strip_suffix("!important") {
                Some(rest) => (rest.trim_end(), true),
                None => (value, false),
            };
            self.set_property(name, value, important);
        }
    }

    pub fn set_property(&mut self, name: &str, value: &str, important: bool) {
        self.props.insert(
            name.to_string(),
            StyleValue {
                value: value.to_string(),
                important,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props.get(name).map(|v| v.value.as_str())
    }

    pub fn is_important(&self, name: &str) -> bool {
        self.props.get(name).is_some_and(|v| v.important)
    }
}

struct Node {
    tag: String,
    id: Option<String>,
    attributes: BTreeMap<String, String>,
    style: Style,
    text: Option<String>,
    inner_html: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, Listener)>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            attributes: BTreeMap::new(),
            style: Style::default(),
            text: None,
            inner_html: None,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    body: NodeId,
    ready_state: ReadyState,
    title: String,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node::new("body")),
            }],
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            ready_state: ReadyState::Complete,
            title: String::new(),
        }
    }
}

impl Document {
    pub fn loading() -> Self {
        Self {
            ready_state: ReadyState::Loading,
            ..Self::default()
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub(crate) fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let node = Some(Node::new(tag));
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = node;
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node,
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    pub fn tag(&self, node: NodeId) -> &str {
        self.node(node).map_or("", |n| n.tag.as_str())
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        if let Some(n) = self.node_mut(node) {
            n.id = Some(id.to_string());
        }
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let node = slot.node.as_ref()?;
                (node.id.as_deref() == Some(id)).then_some(NodeId {
                    index,
                    generation: slot.generation,
                })
            })
            .find(|&node| self.is_connected(node))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        if let Some(n) = self.node_mut(child) {
            n.parent = Some(parent);
        }
        if let Some(n) = self.node_mut(parent) {
            n.children.push(child);
        }
    }

    /// Detach `node` from its parent. Returns false if it was not attached.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node_mut(node).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&child| child != node);
        }
        true
    }

    /// `element.remove()`: detach `node` and free it with its descendants and
    /// their listeners. The body is never removed.
    pub fn remove(&mut self, node: NodeId) -> bool {
        if node == self.body || !self.contains(node) {
            return false;
        }
        self.detach(node);
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let slot = &mut self.slots[current.index];
            if let Some(freed) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                pending.extend(freed.children);
            }
        }
        true
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.body {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn style(&self, node: NodeId) -> &Style {
        self.node(node).map_or(&EMPTY_STYLE, |n| &n.style)
    }

    pub fn style_mut(&mut self, node: NodeId) -> Option<&mut Style> {
        self.node_mut(node).map(|n| &mut n.style)
    }

    pub fn set_css_text(&mut self, node: NodeId, css: &str) {
        if let Some(style) = self.style_mut(node) {
            style.set_css_text(css);
        }
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(n) = self.node_mut(node) {
            n.attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_text_content(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.node_mut(node) {
            n.text = Some(text.to_string());
        }
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, node: NodeId) -> String {
        let Some(n) = self.node(node) else {
            return String::new();
        };
        let mut out = n.text.clone().unwrap_or_default();
        for &child in &n.children {
            out.push_str(&self.text_content(child));
        }
        out
    }

    pub fn set_inner_html(&mut self, node: NodeId, html: &str) {
        if let Some(n) = self.node_mut(node) {
            n.inner_html = Some(html.to_string());
        }
    }

    pub fn inner_html(&self, node: NodeId) -> Option<&str> {
        self.node(node)?.inner_html.as_deref()
    }

    pub fn add_event_listener(&mut self, node: NodeId, event: &str, listener: Listener) {
        if let Some(n) = self.node_mut(node) {
            n.listeners.push((event.to_string(), listener));
        }
    }

    pub(crate) fn listeners(&self, node: NodeId, event: &str) -> Vec<Listener> {
        self.node(node)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|(name, _)| name == event)
                    .map(|(_, listener)| Rc::clone(listener))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_text_parses_important_flags() {
        let mut style = Style::default();
        style.set_css_text(
            "\n  position: fixed !important;\n  top: 20px;\n  font-family: -apple-system, \"Segoe UI\" !important;\n",
        );
        assert_eq!(style.get("position"), Some("fixed"));
        assert!(style.is_important("position"));
        assert_eq!(style.get("top"), Some("20px"));
        assert!(!style.is_important("top"));
        assert_eq!(style.get("font-family"), Some("-apple-system, \"Segoe UI\""));
    }

    #[test]
    fn lookup_by_id_ignores_detached_nodes() {
        let mut doc = Document::default();
        let div = doc.create_element("DIV");
        doc.set_id(div, "overlay");
        assert_eq!(doc.tag(div), "div");
        assert_eq!(doc.get_element_by_id("overlay"), None);

        let body = doc.body();
        doc.append_child(body, div);
        assert_eq!(doc.get_element_by_id("overlay"), Some(div));

        assert!(doc.detach(div));
        assert!(!doc.detach(div));
        assert_eq!(doc.get_element_by_id("overlay"), None);
        assert!(doc.children(body).is_empty());
    }

    #[test]
    fn text_content_walks_descendants() {
        let mut doc = Document::default();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.set_text_content(inner, "saved");
        doc.append_child(outer, inner);
        assert_eq!(doc.text_content(outer), "saved");
    }

    #[test]
    fn removed_subtrees_are_freed_and_slots_reused() {
        let mut doc = Document::default();
        let body = doc.body();
        let outer = doc.create_element("div");
        let inner = doc.create_element("span");
        doc.set_text_content(inner, "gone");
        doc.append_child(outer, inner);
        doc.append_child(body, outer);
        assert_eq!(doc.node_count(), 3);

        assert!(doc.remove(outer));
        assert!(!doc.remove(outer));
        assert_eq!(doc.node_count(), 1);
        assert!(doc.children(body).is_empty());
        assert!(!doc.is_connected(inner));
        assert_eq!(doc.text_content(outer), "");
        assert_eq!(doc.style(inner).get("color"), None);

        let reused = doc.create_element("p");
        assert_ne!(reused, outer);
        assert_ne!(reused, inner);
        assert_eq!(doc.tag(outer), "");
        assert_eq!(doc.node_count(), 2);
        assert!(!doc.remove(body));
    }
}
