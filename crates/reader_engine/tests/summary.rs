use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use reader_engine::{
    ChannelSummarySink, MemoryStore, NullSummarySink, Page, ReaderConfig, ReqwestSummaryClient,
    Role, SessionController, Summarizer, SummaryConfig, SummaryError, SummaryInput, API_KEY_KEY,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event(content: &str) -> String {
    let chunk = serde_json::json!({ "choices": [{ "delta": { "content": content } }] });
    format!("data: {chunk}\n\n")
}

fn stream_body(parts: &[&str]) -> String {
    let mut body: String = parts.iter().map(|part| event(part)).collect();
    body.push_str(": keep-alive\n\ndata: not json\n\ndata: [DONE]\n\n");
    body
}

fn config(server: &MockServer) -> SummaryConfig {
    SummaryConfig {
        endpoint: format!("{}/v1/chat/completions", server.uri()),
        ..SummaryConfig::default()
    }
}

fn input() -> SummaryInput {
    SummaryInput {
        title: "Title".to_string(),
        content: "Some article text.".to_string(),
    }
}

#[tokio::test]
async fn streamed_json_is_accumulated_and_parsed() {
    reader_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-chat",
            "stream": true,
            "response_format": { "type": "json_object" },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            stream_body(&[r#"{"summary":"Short","#, r#""tags":"a、b","key_points":["k1"]}"#]),
            "text/event-stream",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Box::new(ReqwestSummaryClient::new(config(&server))));
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSummarySink::new(tx);

    let summary = summarizer
        .summarize(Some("sk-test"), &input(), false, &sink)
        .await
        .unwrap();
    assert_eq!(summary.summary, "Short");
    assert_eq!(summary.tag_list(), ["a", "b"]);
    assert_eq!(summary.key_points, ["k1"]);

    let partials: Vec<String> = rx.try_iter().collect();
    assert_eq!(partials.len(), 2);
    assert_eq!(partials[0], r#"{"summary":"Short","#);

    // Served from the cache: the mock expects a single request.
    let again = summarizer
        .summarize(Some("sk-test"), &input(), false, &NullSummarySink)
        .await
        .unwrap();
    assert_eq!(again, summary);
}

#[tokio::test]
async fn plain_text_output_becomes_overview() {
    reader_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body(&["Just ", "words"]), "text/event-stream"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Box::new(ReqwestSummaryClient::new(config(&server))));
    let summary = summarizer
        .summarize(Some("k"), &input(), false, &NullSummarySink)
        .await
        .unwrap();
    assert_eq!(summary.summary, "Just words");

    let forced = summarizer
        .summarize(Some("k"), &input(), true, &NullSummarySink)
        .await
        .unwrap();
    assert_eq!(forced, summary);
}

#[tokio::test]
async fn api_errors_carry_status_and_message() {
    reader_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_raw(
            r#"{"error":{"message":"Authentication Fails"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Box::new(ReqwestSummaryClient::new(config(&server))));
    let err = summarizer
        .summarize(Some("bad"), &input(), false, &NullSummarySink)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SummaryError::HttpStatus {
            status: 401,
            message: "Authentication Fails".to_string()
        }
    );
    assert!(!summarizer.is_generating());
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    reader_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let summarizer = Summarizer::new(Box::new(ReqwestSummaryClient::new(SummaryConfig {
        timeout: Duration::from_millis(50),
        ..config(&server)
    })));
    let err = summarizer
        .summarize(Some("k"), &input(), false, &NullSummarySink)
        .await
        .unwrap_err();
    assert_eq!(err, SummaryError::Timeout);
}

#[tokio::test]
async fn missing_key_and_empty_content_fail_fast() {
    reader_logging::initialize_for_tests();
    let summarizer = Summarizer::new(Box::new(ReqwestSummaryClient::new(SummaryConfig {
        endpoint: "http://127.0.0.1:9/unused".to_string(),
        ..SummaryConfig::default()
    })));
    assert_eq!(
        summarizer.summarize(None, &input(), false, &NullSummarySink).await,
        Err(SummaryError::MissingApiKey)
    );
    assert_eq!(
        summarizer.summarize(Some("  "), &input(), false, &NullSummarySink).await,
        Err(SummaryError::MissingApiKey)
    );
    let empty = SummaryInput {
        title: "t".to_string(),
        content: " ".to_string(),
    };
    assert_eq!(
        summarizer.summarize(Some("k"), &empty, false, &NullSummarySink).await,
        Err(SummaryError::NoContent)
    );
}

#[tokio::test]
async fn session_mounts_summary_panel() {
    reader_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            stream_body(&[r#"{"summary":"An overview","conclusion":"Done"}"#]),
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let paragraphs: String = (0..5)
        .map(|i| format!("<p>Paragraph {i} keeps going long enough to be a real block of text.</p>"))
        .collect();
    let page = Page::parse(
        "https://example.com/story",
        &format!("<html><head><title>Story</title></head><body><article>{paragraphs}</article></body></html>"),
    );
    let store = Arc::new(MemoryStore::new().with_entry(API_KEY_KEY, "sk-test"));
    let mut config = ReaderConfig::default().without_preload_delay();
    config.summary = self::config(&server);
    let mut controller = SessionController::new(page, config).with_store(store);

    assert_eq!(
        controller.summarize(false, &NullSummarySink).await,
        Err(SummaryError::NoContent)
    );
    controller.toggle().await.unwrap();
    let summary = controller.summarize(false, &NullSummarySink).await.unwrap();
    assert_eq!(summary.conclusion, "Done");

    let doc = controller.page().document();
    let panel = doc.find_role(Role::SummaryPanel).unwrap();
    let html = doc.outer_html(panel);
    assert!(html.contains("<h4>Overview</h4><p>An overview</p>"));
    assert!(html.contains("<h4>Conclusion</h4><p>Done</p>"));
}
