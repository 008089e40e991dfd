//! Owned, mutable HTML tree.
//!
//! `scraper` (html5ever) does the parsing; the result is copied into an
//! `ego_tree::Tree<DomNode>` that the sanitizer, renderer and page model can
//! restructure freely. Nodes the reader builds itself carry a typed [`Role`]
//! so they can be found again by identity instead of by class-name strings.

use std::collections::HashMap;

use ego_tree::{NodeId, NodeRef, Tree};
use scraper::{Html, Node};

const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 8] = [
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// The parser drops one newline right after these opening tags, so the
/// serializer writes it back when the content starts with one.
const NEWLINE_STRIPPING_ELEMENTS: [&str; 3] = ["pre", "textarea", "listing"];

/// Reader-owned control buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlButton {
    Outline,
    Summary,
    MarkdownCopy,
    ImageToggle,
    Settings,
    Close,
    ErrorClose,
    ImagePrev,
    ImageNext,
}

/// What a reader-built element is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    ReaderContainer,
    ReaderContent,
    ReaderTitle,
    ArticleBody,
    LoadingOverlay,
    ErrorBanner,
    Toast,
    ImageOverlay,
    ImageControls,
    ZoomInfo,
    SettingsPanel,
    ButtonGroup,
    Button(ControlButton),
    OutlinePanel,
    OutlineItem,
    ProgressBar,
    SummaryPanel,
}

impl Role {
    /// Class emitted for the role when the tree is serialized.
    pub fn class_name(self) -> &'static str {
        match self {
            Role::ReaderContainer => "reader-mode",
            Role::ReaderContent => "reader-content",
            Role::ReaderTitle => "reader-title",
            Role::ArticleBody => "reader-article",
            Role::LoadingOverlay => "reader-loading",
            Role::ErrorBanner => "reader-error-message",
            Role::Toast => "selection-toast",
            Role::ImageOverlay => "image-overlay",
            Role::ImageControls => "image-controls",
            Role::ZoomInfo => "zoom-info",
            Role::SettingsPanel => "settings-panel",
            Role::ButtonGroup => "reader-button-group",
            Role::Button(button) => match button {
                ControlButton::Outline => "reader-button outline-toggle-button",
                ControlButton::Summary => "reader-button ai-summary-button",
                ControlButton::MarkdownCopy => "reader-button markdown-copy-button",
                ControlButton::ImageToggle => "reader-button image-toggle-button",
                ControlButton::Settings => "reader-button settings-button",
                ControlButton::Close => "reader-button close-button",
                ControlButton::ErrorClose => "error-close-btn",
                ControlButton::ImagePrev => "image-control prev-image",
                ControlButton::ImageNext => "image-control next-image",
            },
            Role::OutlinePanel => "article-outline",
            Role::OutlineItem => "outline-item",
            Role::ProgressBar => "reading-progress",
            Role::SummaryPanel => "ai-summary-panel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementData {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Classes added by the reader on top of any `class` attribute.
    pub classes: Vec<String>,
    pub role: Option<Role>,
}

impl ElementData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_role(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn attr_value(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attrs
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    fn class_list(&self) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(role) = self.role {
            parts.push(role.class_name());
        }
        if let Some(existing) = self.attr("class") {
            parts.extend(existing.split_whitespace());
        }
        parts.extend(self.classes.iter().map(String::as_str));
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Root,
    Element(ElementData),
    Text(String),
    Comment(String),
}

impl DomNode {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            DomNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree<DomNode>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(DomNode::Root),
        }
    }

    /// Parses an HTML fragment; top-level nodes become children of the root.
    pub fn parse_fragment(html: &str) -> Self {
        let parsed = Html::parse_fragment(html);
        let mut doc = Self::new();
        let root = doc.root_id();
        for child in parsed.root_element().children() {
            doc.copy_from_scraper(root, child);
        }
        doc
    }

    /// Parses a full page; the `<html>` element becomes the only root child.
    pub fn parse_document(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut doc = Self::new();
        let root = doc.root_id();
        for child in parsed.tree.root().children() {
            doc.copy_from_scraper(root, child);
        }
        doc
    }

    fn copy_from_scraper(&mut self, parent: NodeId, node: NodeRef<'_, Node>) {
        let value = match node.value() {
            Node::Element(element) => DomNode::Element(ElementData {
                name: element.name().to_string(),
                attrs: element
                    .attrs()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
                ..ElementData::default()
            }),
            Node::Text(text) => DomNode::Text(String::from(&**text)),
            Node::Comment(comment) => DomNode::Comment(String::from(&**comment)),
            // Doctype and processing instructions are not carried over.
            _ => return,
        };
        let Some(id) = self.append(parent, value) else {
            return;
        };
        for child in node.children() {
            self.copy_from_scraper(id, child);
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.tree.get(id).map(|node| node.value())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.node(id).and_then(DomNode::as_element)
    }

    /// Runs `f` against the element at `id`, if it is one.
    pub fn update_element<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut ElementData) -> R,
    ) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        match node.value() {
            DomNode::Element(element) => Some(f(element)),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.node(id)? {
            DomNode::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(mut node) = self.tree.get_mut(id) {
            if let DomNode::Text(slot) = node.value() {
                *slot = text.into();
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|parent| parent.id())
    }

    /// Snapshot of the child list; safe to hold while the tree is mutated.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    /// Every node below `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.descendants().skip(1).map(|d| d.id()).collect())
            .unwrap_or_default()
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        node.id() == self.root_id() || node.ancestors().any(|a| a.id() == self.root_id())
    }

    pub fn find_tag(&self, within: NodeId, tag: &str) -> Option<NodeId> {
        self.find_tags(within, &[tag]).into_iter().next()
    }

    /// Descendant elements of `within` whose tag is one of `tags`.
    pub fn find_tags(&self, within: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(within)
            .into_iter()
            .filter(|id| {
                self.element(*id)
                    .is_some_and(|element| tags.iter().any(|tag| element.is(tag)))
            })
            .collect()
    }

    pub fn find_role(&self, role: Role) -> Option<NodeId> {
        self.find_roles(role).into_iter().next()
    }

    pub fn find_roles(&self, role: Role) -> Vec<NodeId> {
        self.tree
            .root()
            .descendants()
            .filter(|node| {
                node.value()
                    .as_element()
                    .is_some_and(|element| element.role == Some(role))
            })
            .map(|node| node.id())
            .collect()
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        node.descendants()
            .filter_map(|d| match d.value() {
                DomNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn append(&mut self, parent: NodeId, value: DomNode) -> Option<NodeId> {
        let mut parent = self.tree.get_mut(parent)?;
        Some(parent.append(value).id())
    }

    pub fn append_element(&mut self, parent: NodeId, element: ElementData) -> Option<NodeId> {
        self.append(parent, DomNode::Element(element))
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Option<NodeId> {
        self.append(parent, DomNode::Text(text.into()))
    }

    /// Unlinks `id` (and its subtree) from the tree.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root_id() {
            return;
        }
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.detach(child);
        }
    }

    /// Nodes held by the arena, detached ones included.
    pub fn arena_len(&self) -> usize {
        self.tree.nodes().count()
    }

    /// Nodes reachable from the root, the root included.
    pub fn live_len(&self) -> usize {
        self.tree.root().descendants().count()
    }

    /// Rebuilds the arena from the nodes still reachable from the root,
    /// dropping everything detached. Ids change; the returned map takes each
    /// kept node's old id to its new one.
    pub fn compact(&mut self) -> HashMap<NodeId, NodeId> {
        let mut tree = Tree::new(DomNode::Root);
        let mut ids = HashMap::new();
        let new_root = tree.root().id();
        let root = self.tree.root();
        ids.insert(root.id(), new_root);
        copy_live(root, &mut tree, new_root, &mut ids);
        self.tree = tree;
        ids
    }

    /// Copies `source_id` and its subtree from another document under `parent`.
    pub fn graft(
        &mut self,
        parent: NodeId,
        source: &Document,
        source_id: NodeId,
    ) -> Option<NodeId> {
        let node = source.tree.get(source_id)?;
        let id = match node.value() {
            DomNode::Root => parent,
            value => self.append(parent, value.clone())?,
        };
        for child in node.children() {
            self.graft(id, source, child.id());
        }
        Some(id)
    }

    /// Copies every top-level node of `source` under `parent`.
    pub fn graft_all(&mut self, parent: NodeId, source: &Document) {
        self.graft(parent, source, source.root_id());
    }

    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serializes the whole tree.
    pub fn html(&self) -> String {
        self.inner_html(self.root_id())
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        match node {
            DomNode::Root => {
                for child in self.children(id) {
                    self.write_node(child, out);
                }
            }
            DomNode::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                let classes = element.class_list();
                let mut class_written = false;
                for (key, value) in &element.attrs {
                    if key.eq_ignore_ascii_case("class") {
                        if let Some(classes) = &classes {
                            write_attr(out, "class", classes);
                        }
                        class_written = true;
                    } else {
                        write_attr(out, key, value);
                    }
                }
                if !class_written {
                    if let Some(classes) = &classes {
                        write_attr(out, "class", classes);
                    }
                }
                out.push('>');
                if VOID_ELEMENTS.iter().any(|tag| element.is(tag)) {
                    return;
                }
                let children = self.children(id);
                let leading_newline = children
                    .first()
                    .and_then(|first| self.text(*first))
                    .is_some_and(|text| text.starts_with('\n'));
                if leading_newline && NEWLINE_STRIPPING_ELEMENTS.iter().any(|tag| element.is(tag)) {
                    out.push('\n');
                }
                for child in children {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
            DomNode::Text(text) => {
                let raw = self
                    .parent(id)
                    .and_then(|parent| self.element(parent))
                    .is_some_and(|parent| RAW_TEXT_ELEMENTS.iter().any(|tag| parent.is(tag)));
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(out, text, false);
                }
            }
            DomNode::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
        }
    }
}

fn copy_live(
    source: NodeRef<'_, DomNode>,
    tree: &mut Tree<DomNode>,
    parent: NodeId,
    ids: &mut HashMap<NodeId, NodeId>,
) {
    for child in source.children() {
        let Some(mut slot) = tree.get_mut(parent) else {
            return;
        };
        let id = slot.append(child.value().clone()).id();
        ids.insert(child.id(), id);
        copy_live(child, tree, id, ids);
    }
}

fn write_attr(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    escape_into(out, value, true);
    out.push('"');
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_round_trips_through_serializer() {
        let html = r#"<div id="a"><p>one &amp; two</p><img src="x.png" alt="x"><br></div>"#;
        let doc = Document::parse_fragment(html);
        assert_eq!(doc.html(), html);
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let doc = Document::parse_fragment("<script>if (a < b) {}</script>");
        assert_eq!(doc.html(), "<script>if (a < b) {}</script>");
    }

    #[test]
    fn roles_emit_classes_and_are_found_by_identity() {
        let mut doc = Document::new();
        let root = doc.root_id();
        let panel = doc
            .append_element(root, ElementData::with_role("div", Role::SettingsPanel))
            .unwrap();
        doc.update_element(panel, |el| el.add_class("collapsed")).unwrap();

        assert_eq!(doc.find_role(Role::SettingsPanel), Some(panel));
        assert_eq!(
            doc.html(),
            r#"<div class="settings-panel collapsed"></div>"#
        );
    }

    #[test]
    fn detached_nodes_are_unreachable() {
        let mut doc = Document::parse_fragment("<p>a</p><p>b</p>");
        let first = doc.children(doc.root_id())[0];
        doc.detach(first);
        assert!(!doc.is_attached(first));
        assert_eq!(doc.html(), "<p>b</p>");
    }

    #[test]
    fn leading_newline_in_pre_survives_a_reparse() {
        let doc = Document::parse_fragment("<pre>\n\nkept</pre><textarea>\n\nnote</textarea>");
        let html = doc.html();
        assert_eq!(html, "<pre>\n\nkept</pre><textarea>\n\nnote</textarea>");
        assert_eq!(Document::parse_fragment(&html).html(), html);
    }

    #[test]
    fn compact_drops_detached_nodes_and_maps_ids() {
        let mut doc = Document::parse_fragment("<div><p>a</p><p>b</p></div><span>c</span>");
        let root = doc.root_id();
        let div = doc.children(root)[0];
        let span = doc.children(root)[1];
        doc.clear_children(div);
        doc.append_text(div, "fresh");
        assert!(doc.arena_len() > doc.live_len());

        let ids = doc.compact();
        assert_eq!(doc.arena_len(), doc.live_len());
        assert_eq!(doc.html(), "<div>fresh</div><span>c</span>");
        let span = ids[&span];
        assert_eq!(doc.text_content(span), "c");
    }

    #[test]
    fn graft_copies_subtree_between_documents() {
        let source = Document::parse_fragment("<ul><li>x</li></ul>");
        let mut target = Document::parse_fragment("<section></section>");
        let section = target.children(target.root_id())[0];
        target.graft_all(section, &source);
        assert_eq!(target.html(), "<section><ul><li>x</li></ul></section>");
    }

    #[test]
    fn document_parse_keeps_head_and_body() {
        let doc = Document::parse_document(
            "<!DOCTYPE html><html><head><title>T</title></head><body><p>x</p></body></html>",
        );
        let body = doc.find_tag(doc.root_id(), "body").unwrap();
        let title = doc.find_tag(doc.root_id(), "title").unwrap();
        assert_eq!(doc.inner_html(body), "<p>x</p>");
        assert_eq!(doc.text_content(title), "T");
    }
}
