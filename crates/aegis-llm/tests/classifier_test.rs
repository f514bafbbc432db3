use aegis_llm::{ClassifyRequest, LlmClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chat_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            { "message": { "content": content } }
        ]
    })
}

#[tokio::test]
async fn classify_parses_valid_route_response() {
    let server = MockServer::start().await;
    let body = chat_response(
        r#"{"category":"Software","subcategory":"Login","priority":"3","assignment_group":"L2-Apps","resolution_notes":"reset session","action":"route","tool":null,"target":null,"confidence":0.82}"#,
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = LlmClient::new("test-key".to_owned(), server.uri());
    let req = ClassifyRequest {
        scrubbed_short_description: "user cannot log in",
        scrubbed_description: "login fails with timeout",
        priority: "3",
        kb_articles: &[],
        user_info: None,
        ci_info: None,
    };

    let classification = client.classify(&req).await.unwrap();
    assert_eq!(classification.category, "Software");
    assert_eq!(classification.confidence, 0.82);
}

#[tokio::test]
async fn classify_strips_markdown_code_fence() {
    let server = MockServer::start().await;
    let fenced = "```json\n{\"category\":\"Network\",\"subcategory\":null,\"priority\":\"1\",\"assignment_group\":\"NOC\",\"resolution_notes\":null,\"action\":\"escalate\",\"tool\":null,\"target\":null,\"confidence\":0.6}\n```";
    let body = chat_response(fenced);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = LlmClient::new("test-key".to_owned(), server.uri());
    let req = ClassifyRequest {
        scrubbed_short_description: "vpn down",
        scrubbed_description: "cannot reach vpn gateway",
        priority: "1",
        kb_articles: &[],
        user_info: None,
        ci_info: None,
    };

    let classification = client.classify(&req).await.unwrap();
    assert_eq!(classification.assignment_group, "NOC");
}

#[tokio::test]
async fn classify_rejects_auto_heal_without_tool() {
    let server = MockServer::start().await;
    let body = chat_response(
        r#"{"category":"Software","subcategory":null,"priority":"3","assignment_group":"L2-Apps","resolution_notes":null,"action":"auto_heal","tool":null,"target":null,"confidence":0.9}"#,
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let client = LlmClient::new("test-key".to_owned(), server.uri());
    let req = ClassifyRequest {
        scrubbed_short_description: "iis down",
        scrubbed_description: "app pool crashed",
        priority: "2",
        kb_articles: &[],
        user_info: None,
        ci_info: None,
    };

    let err = client.classify(&req).await.unwrap_err();
    assert!(matches!(err, aegis_llm::LlmError::SchemaViolation(_)));
}

#[tokio::test]
async fn classify_propagates_non_2xx_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = LlmClient::new("test-key".to_owned(), server.uri());
    let req = ClassifyRequest {
        scrubbed_short_description: "x",
        scrubbed_description: "y",
        priority: "4",
        kb_articles: &[],
        user_info: None,
        ci_info: None,
    };

    let err = client.classify(&req).await.unwrap_err();
    assert!(matches!(err, aegis_llm::LlmError::HttpStatus { code: 503, .. }));
}
