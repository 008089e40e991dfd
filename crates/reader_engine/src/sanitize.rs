//! Two-pass content sanitizer.
//!
//! Pass A normalizes text and prunes empty wrappers; pass B strips every
//! attribute outside the allow-list and re-checks emptiness. Both passes walk a
//! snapshot of each child list so detaching nodes never disturbs the walk.

use ego_tree::NodeId;
use reader_logging::reader_debug;

use crate::dom::Document;
use crate::error::SanitizeError;
use crate::typography::{collapse_whitespace, is_space, normalize_text};

/// Elements that count as content even without text.
const MEDIA_ELEMENTS: [&str; 6] = ["img", "br", "hr", "iframe", "video", "audio"];
const ALLOWED_ATTRIBUTES: [&str; 5] = ["src", "href", "alt", "target", "rel"];
const BLOCK_ELEMENTS: [&str; 22] = [
    "p", "div", "article", "section", "main", "aside", "header", "footer", "blockquote", "pre",
    "ul", "ol", "li", "dl", "table", "figure", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Sanitizes a fragment in place.
///
/// Fails when nothing block-level with content survives.
pub fn sanitize(fragment: &mut Document) -> Result<(), SanitizeError> {
    let root = fragment.root_id();
    normalize_children(fragment, root);
    strip_children(fragment, root);

    let has_block = fragment
        .find_tags(root, &BLOCK_ELEMENTS)
        .into_iter()
        .any(|id| !is_empty(fragment, id));
    if !has_block {
        return Err(SanitizeError::NoBlockContent);
    }
    Ok(())
}

/// Parses, sanitizes and re-serializes an HTML fragment.
pub fn sanitize_html(html: &str) -> Result<String, SanitizeError> {
    let mut fragment = Document::parse_fragment(html);
    sanitize(&mut fragment)?;
    Ok(fragment.html())
}

/// An element with no visible text and no media is a decorative wrapper.
fn is_empty(doc: &Document, id: NodeId) -> bool {
    let Some(element) = doc.element(id) else {
        return false;
    };
    if MEDIA_ELEMENTS.iter().any(|tag| element.is(tag)) {
        return false;
    }
    let has_text = doc.text_content(id).chars().any(|c| !is_space(c));
    !has_text && doc.find_tags(id, &MEDIA_ELEMENTS).is_empty()
}

/// Prunes empty elements first, then joins the text runs that pruning left
/// side by side, then normalizes each run. A reparse would merge adjacent
/// runs anyway, so spacing has to be decided on the joined text.
fn normalize_children(doc: &mut Document, parent: NodeId) {
    for child in doc.children(parent) {
        if doc.element(child).is_none() {
            continue;
        }
        normalize_children(doc, child);
        if is_empty(doc, child) {
            if let Some(element) = doc.element(child) {
                reader_debug!("sanitize: dropping empty <{}>", element.name);
            }
            doc.detach(child);
        }
    }
    merge_adjacent_text(doc, parent);
    for child in doc.children(parent) {
        let Some(text) = doc.text(child) else {
            continue;
        };
        let cleaned = collapse_whitespace(&normalize_text(text));
        if cleaned.is_empty() {
            doc.detach(child);
        } else {
            doc.set_text(child, cleaned);
        }
    }
}

fn merge_adjacent_text(doc: &mut Document, parent: NodeId) {
    let mut run: Option<NodeId> = None;
    for child in doc.children(parent) {
        let Some(text) = doc.text(child).map(str::to_string) else {
            run = None;
            continue;
        };
        let joined =
            run.and_then(|head| doc.text(head).map(|head_text| (head, head_text.to_string())));
        match joined {
            Some((head, mut head_text)) => {
                head_text.push_str(&text);
                doc.set_text(head, head_text);
                doc.detach(child);
            }
            None => run = Some(child),
        }
    }
}

fn strip_children(doc: &mut Document, parent: NodeId) {
    for child in doc.children(parent) {
        if doc.element(child).is_none() {
            continue;
        }
        if is_empty(doc, child) {
            doc.detach(child);
            continue;
        }
        doc.update_element(child, |element| {
            element
                .attrs
                .retain(|(key, _)| ALLOWED_ATTRIBUTES.iter().any(|a| key.eq_ignore_ascii_case(a)));
            element.classes.clear();
            element.role = None;
        });
        strip_children(doc, child);
        if is_empty(doc, child) {
            doc.detach(child);
            continue;
        }
        let wraps_image = doc
            .element(child)
            .is_some_and(|e| e.is("a") && e.attr("href").is_some())
            && doc.find_tag(child, "img").is_some();
        if wraps_image {
            doc.update_element(child, |element| {
                element.set_attr("target", "_blank");
                element.set_attr("rel", "noopener noreferrer");
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_whitespace_is_trimmed_and_collapsed() {
        let out = sanitize_html("<p>\n   first\t\tline   </p>").unwrap();
        assert_eq!(out, "<p>first line</p>");
    }

    #[test]
    fn nested_empty_wrappers_are_removed() {
        let out = sanitize_html("<div><p>kept text</p><div><span> </span></div></div>").unwrap();
        assert_eq!(out, "<div><p>kept text</p></div>");
    }

    #[test]
    fn media_only_blocks_survive() {
        let out = sanitize_html("<figure><img src=\"a.png\"></figure>").unwrap();
        assert_eq!(out, "<figure><img src=\"a.png\"></figure>");
    }

    #[test]
    fn image_links_open_in_new_tab() {
        let html = r#"<p><a href="/big.png" class="zoom"><img src="s.png" width="9"></a></p>"#;
        let out = sanitize_html(html).unwrap();
        assert_eq!(
            out,
            r#"<p><a href="/big.png" target="_blank" rel="noopener noreferrer"><img src="s.png"></a></p>"#
        );
    }

    #[test]
    fn inline_only_content_is_rejected() {
        assert_eq!(
            sanitize_html("<span>just inline</span>"),
            Err(SanitizeError::NoBlockContent)
        );
        assert_eq!(sanitize_html("<div>   </div>"), Err(SanitizeError::NoBlockContent));
    }

    #[test]
    fn text_joined_by_pruning_is_spaced_once() {
        let once = sanitize_html("<p>中文<span></span>abc</p>").unwrap();
        assert_eq!(once, "<p>中文 abc</p>");
        assert_eq!(sanitize_html(&once).unwrap(), once);
    }

    #[test]
    fn whitespace_between_pruned_wrappers_is_kept_as_one_space() {
        let out = sanitize_html("<p>left<em></em> <b></b>right</p>").unwrap();
        assert_eq!(out, "<p>left right</p>");
    }

    #[test]
    fn non_breaking_spaces_collapse() {
        let out = sanitize_html("<div>a&nbsp;&nbsp; b</div>").unwrap();
        assert_eq!(out, "<div>a b</div>");
    }
}
