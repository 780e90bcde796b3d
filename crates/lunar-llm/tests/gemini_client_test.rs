use futures::StreamExt;
use lunar_llm::{
    ChatMessage, CompletionClient, CompletionRequest, GeminiClient, StreamEvent,
};

fn request() -> CompletionRequest {
    CompletionRequest::new(
        "gemini-2.5-flash-lite",
        "You are a test persona.",
        vec![ChatMessage::user("Will I get a new job?")],
    )
}

#[tokio::test]
async fn generate_parses_text_and_finish_reason() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/models/gemini-2.5-flash-lite:generateContent")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "candidates": [{
                    "content": { "parts": [{"text": "Saturn says yes."}], "role": "model" },
                    "finishReason": "STOP"
                }],
                "usageMetadata": { "promptTokenCount": 20, "candidatesTokenCount": 5, "totalTokenCount": 25 }
            }"#,
        )
        .create_async()
        .await;

    let client = GeminiClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());

    let completion = client.generate(request()).await.unwrap();
    assert_eq!(completion.text, "Saturn says yes.");
    assert_eq!(completion.finish_reason.as_deref(), Some("STOP"));
    assert_eq!(completion.usage.unwrap().total_tokens, 25);

    mock.assert_async().await;
}

#[tokio::test]
async fn generate_propagates_upstream_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash-lite:generateContent")
        .with_status(429)
        .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
        .create_async()
        .await;

    let client = GeminiClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());

    let err = client.generate(request()).await.unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("429"), "unexpected error: {}", msg);
    assert!(msg.contains("quota exceeded"), "unexpected error: {}", msg);
}

#[tokio::test]
async fn generate_stream_yields_deltas_then_done() {
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"The \"}],\"role\":\"model\"}}]}\n\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"stars align.\"}],\"role\":\"model\"},\"finishReason\":\"STOP\"}],",
        "\"usageMetadata\":{\"promptTokenCount\":10,\"candidatesTokenCount\":4,\"totalTokenCount\":14}}\n\n",
    );

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash-lite:streamGenerateContent")
        .match_query(mockito::Matcher::UrlEncoded("alt".into(), "sse".into()))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = GeminiClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());

    let mut stream = client.generate_stream(request()).await.unwrap();

    let mut text = String::new();
    let mut finish_reason = None;
    while let Some(event) = stream.next().await {
        match event.unwrap() {
            StreamEvent::Delta { text: chunk } => text.push_str(&chunk),
            StreamEvent::Done { finish_reason: fr, usage } => {
                finish_reason = fr;
                assert_eq!(usage.unwrap().total_tokens, 14);
                break;
            }
        }
    }

    assert_eq!(text, "The stars align.");
    assert_eq!(finish_reason.as_deref(), Some("STOP"));
}

#[tokio::test]
async fn generate_stream_synthesizes_done_on_truncated_stream() {
    let body =
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"partial\"}],\"role\":\"model\"}}]}\n\n";

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/models/gemini-2.5-flash-lite:streamGenerateContent")
        .match_query(mockito::Matcher::UrlEncoded("alt".into(), "sse".into()))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let client = GeminiClient::new("test-key")
        .unwrap()
        .with_base_url(server.url());

    let mut stream = client.generate_stream(request()).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event.unwrap());
    }

    assert!(matches!(events.first(), Some(StreamEvent::Delta { text }) if text == "partial"));
    assert!(matches!(
        events.last(),
        Some(StreamEvent::Done { finish_reason: None, .. })
    ));
}
