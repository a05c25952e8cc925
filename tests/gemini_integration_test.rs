//! Integration tests for the Gemini client
//!
//! These tests make real API calls. To run them:
//! 1. Put `GEMINI_API_KEY` (and optionally `GEMINI_MODEL_NAME`) in `.env`
//! 2. Run: `cargo test --test gemini_integration_test -- --ignored`

use futures::StreamExt;
use std::env;
use std::sync::Arc;

use healthstake::gateway::{Gateway, GatewayConfig, InMemorySessionStore};
use healthstake::llm::gemini::GeminiClient;
use healthstake::llm::{ContentGenerator, GenerateRequest, GenerationConfig, Message, StreamEvent};

/// Helper to create a test client
fn create_test_client() -> GeminiClient {
    dotenvy::dotenv().ok();

    let api_key = env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY required in .env");
    let model = env::var("GEMINI_MODEL_NAME").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

    GeminiClient::with_api_key(api_key, model).expect("Failed to create Gemini client")
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_simple_generation() {
    let client = create_test_client();

    let request = GenerateRequest::new(vec![Message::user(
        "What is 2+2? Answer with just the number.",
    )])
    .with_config(GenerationConfig::default().with_max_tokens(100));

    let mut stream = client
        .stream_generate(request)
        .await
        .expect("Failed to start stream");

    let mut text = String::new();
    let mut token_count = 0;

    while let Some(event) = stream.next().await {
        match event.expect("Stream error") {
            StreamEvent::TextDelta { text: t } => text.push_str(&t),
            StreamEvent::MessageEnd { usage, .. } => token_count = usage.total_tokens,
            StreamEvent::MessageStart { .. } => {}
        }
    }

    println!("Response: {}", text);
    println!("Total tokens: {}", token_count);

    assert!(text.contains('4'));
    assert!(token_count > 0);
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gemini_system_instruction() {
    let client = create_test_client();

    let request = GenerateRequest::new(vec![Message::user("Who are you?")])
        .with_system(Some(
            "You are a diabetes assistant. Always mention glucose.".to_string(),
        ))
        .with_config(GenerationConfig::default().with_temperature(0.2));

    let response = client.generate(request).await.expect("Generation failed");

    println!("Response: {}", response.text);
    assert!(response.text.to_lowercase().contains("glucose"));
}

#[tokio::test]
#[ignore] // Run with --ignored flag
async fn test_gateway_conversation_memory() {
    let gateway = Gateway::new(
        Arc::new(create_test_client()),
        Arc::new(InMemorySessionStore::new()),
        GatewayConfig::new("gemini-2.5-flash"),
    );

    let first = gateway
        .send_message("My name is Priya. Just say ok.", None)
        .await
        .expect("First turn failed");
    let second = gateway
        .send_message("What is my name?", Some(&first.session_id))
        .await
        .expect("Second turn failed");

    println!("Response: {}", second.text);
    assert_eq!(second.session_id, first.session_id);
    assert!(second.text.contains("Priya"));

    let history = gateway.get_history(&first.session_id).await.unwrap();
    assert_eq!(history.len(), 4);
}
