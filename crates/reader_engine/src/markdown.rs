use std::sync::OnceLock;

use regex_lite::Regex;

use crate::dom::{Document, DomNode, Role};

pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Html2MdConverter;

impl Converter for Html2MdConverter {
    fn to_markdown(&self, html: &str) -> String {
        html2md::parse_html(html)
    }
}

/// Title plus paragraph text, for when no HTML converter is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextConverter;

impl Converter for PlainTextConverter {
    fn to_markdown(&self, html: &str) -> String {
        let doc = Document::parse_fragment(html);
        let root = doc.root_id();
        let mut out = String::new();
        if let Some(title) = doc.find_tag(root, "h1") {
            out.push_str(&format!("# {}\n\n", doc.text_content(title).trim()));
        }
        for paragraph in doc.find_tags(root, &["p"]) {
            let text = doc.text_content(paragraph);
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(text);
                out.push_str("\n\n");
            }
        }
        out
    }
}

/// Reader content ready for conversion: a copy of the `reader-content` node
/// without scripts, styles and comments.
pub fn export_html(doc: &Document) -> Option<String> {
    let content = doc.find_role(Role::ReaderContent)?;
    let mut copy = Document::new();
    let root = copy.root_id();
    copy.graft(root, doc, content)?;
    for id in copy.descendants(root) {
        let drop = match copy.node(id) {
            Some(DomNode::Comment(_)) => true,
            Some(DomNode::Element(el)) => el.is("script") || el.is("style"),
            _ => false,
        };
        if drop {
            copy.detach(id);
        }
    }
    let top = copy.children(root).into_iter().next()?;
    Some(copy.inner_html(top))
}

fn escaped_punctuation() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\\([*_`~\[\](){}])").ok())
        .as_ref()
}

fn blank_runs() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n{3,}").ok()).as_ref()
}

/// Collapses blank-line runs, trims, and drops needless backslash escapes.
pub fn clean_markdown(markdown: &str) -> String {
    let collapsed = match blank_runs() {
        Some(re) => re.replace_all(markdown, "\n\n").into_owned(),
        None => markdown.to_string(),
    };
    let trimmed = collapsed.trim();
    match escaped_punctuation() {
        Some(re) => re.replace_all(trimmed, "$1").into_owned(),
        None => trimmed.to_string(),
    }
}

/// Markdown of the mounted reader content.
pub fn export_markdown(doc: &Document, converter: &dyn Converter) -> Option<String> {
    let html = export_html(doc)?;
    Some(clean_markdown(&converter.to_markdown(&html)))
}
