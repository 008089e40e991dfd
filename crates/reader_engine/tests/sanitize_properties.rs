use pretty_assertions::assert_eq;
use reader_engine::{sanitize_html, Document, SuitabilityClassifier, SuitabilityError};

const FRAGMENTS: [&str; 8] = [
    "<p>　你好  world　</p>",
    "<div><span></span><img src=\"a.png\"></div>",
    "<p class=\"x\" onclick=\"y\" style=\"z\">text</p>",
    "<section><div><p>  nested   words  </p><p> </p></div><a href=\"/x\" class=\"c\"><img src=\"b.png\" alt=\"b\"></a></section>",
    "<article><h2 id=\"t\">标题Title</h2><p>中文English混排，继续(测试)</p><ul><li></li><li>item</li></ul></article>",
    "<div>a&nbsp;&nbsp;b<br><em></em></div>",
    "<p>中文<span></span>abc</p>",
    "<p>word<b> </b>字<!-- note --><i></i>next</p>",
];

#[test]
fn sanitizing_twice_changes_nothing() {
    reader_logging::initialize_for_tests();
    for fragment in FRAGMENTS {
        let once = sanitize_html(fragment).unwrap();
        let twice = sanitize_html(&once).unwrap();
        assert_eq!(twice, once, "fragment: {fragment}");
    }
}

#[test]
fn full_width_padding_is_trimmed_and_scripts_spaced() {
    reader_logging::initialize_for_tests();
    assert_eq!(sanitize_html(FRAGMENTS[0]).unwrap(), "<p>你好 world</p>");
}

#[test]
fn empty_inline_is_pruned_but_media_kept() {
    reader_logging::initialize_for_tests();
    assert_eq!(
        sanitize_html(FRAGMENTS[1]).unwrap(),
        "<div><img src=\"a.png\"></div>"
    );
}

#[test]
fn runs_joined_by_pruning_are_spaced_before_serializing() {
    reader_logging::initialize_for_tests();
    assert_eq!(sanitize_html(FRAGMENTS[6]).unwrap(), "<p>中文 abc</p>");
}

#[test]
fn presentational_and_script_attributes_are_stripped() {
    reader_logging::initialize_for_tests();
    assert_eq!(sanitize_html(FRAGMENTS[2]).unwrap(), "<p>text</p>");
}

fn body_of(html: &str) -> (Document, ego_tree::NodeId) {
    let doc = Document::parse_document(html);
    let body = doc.find_tag(doc.root_id(), "body").unwrap();
    (doc, body)
}

fn wrap(inner: &str, depth: usize, tag: &str) -> String {
    let mut html = inner.to_string();
    for _ in 0..depth {
        html = format!("<{tag}>{html}</{tag}>");
    }
    format!("<html><body>{html}</body></html>")
}

#[test]
fn short_pages_are_rejected_at_any_depth() {
    reader_logging::initialize_for_tests();
    let classifier = SuitabilityClassifier::default();
    let inner = format!("<p>{}</p><p>{}</p>", "a".repeat(90), "b".repeat(90));
    for depth in 0..8 {
        let (doc, body) = body_of(&wrap(&inner, depth, "div"));
        let err = classifier
            .check("https://example.com/post", &doc, body)
            .unwrap_err();
        assert!(
            matches!(err, SuitabilityError::TooLittleText { chars: 180, min: 200 }),
            "depth {depth}: {err:?}"
        );
    }
}

#[test]
fn too_few_blocks_are_rejected_at_any_depth() {
    reader_logging::initialize_for_tests();
    let classifier = SuitabilityClassifier::default();
    let filler: String = (0..30).map(|i| format!("<span>w{i} </span>")).collect();
    let inner = format!(
        "<ul><li>{filler}</li></ul><p>{}</p><p>{}</p>",
        "long text ".repeat(8),
        "more text ".repeat(8)
    );
    for depth in 0..8 {
        let (doc, body) = body_of(&wrap(&inner, depth, "blockquote"));
        let err = classifier
            .check("https://example.com/post", &doc, body)
            .unwrap_err();
        assert!(
            matches!(err, SuitabilityError::TooFewBlocks { found: 2, min: 3 }),
            "depth {depth}: {err:?}"
        );
    }
}

#[test]
fn unsuitable_urls_are_rejected_before_content() {
    reader_logging::initialize_for_tests();
    let classifier = SuitabilityClassifier::default();
    let paragraphs = "<p>This paragraph is long enough to count as a block of real prose.</p>".repeat(6);
    let (doc, body) = body_of(&wrap(&paragraphs, 1, "article"));
    assert!(classifier.is_suitable("https://example.com/post", &doc, body));
    assert!(!classifier.is_suitable("https://example.com/search?q=x", &doc, body));
    assert!(!classifier.is_suitable("https://example.com/files/report.PDF", &doc, body));
}
