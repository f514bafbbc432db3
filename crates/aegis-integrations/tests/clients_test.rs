use aegis_core::RemediationTool;
use aegis_integrations::{
    ChatClient, HttpItsmClient, HttpRemediationClient, ItsmClient, RemediationClient, RemediationRequest,
    TriageNotification, WebhookChatClient,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn search_kb_parses_result_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/table/kb_knowledge"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [
                {"doc_id": "KB001", "title": "Fix login", "snippet": "restart the app pool", "score": 0.0}
            ]
        })))
        .mount(&server)
        .await;

    let client = HttpItsmClient::new(reqwest::Client::new(), server.uri(), "user".to_owned(), "pw".to_owned());
    let hits = client.search_kb("login", 3).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, "KB001");
}

#[tokio::test]
async fn get_user_returns_none_when_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/table/sys_user/ghost"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": null })))
        .mount(&server)
        .await;

    let client = HttpItsmClient::new(reqwest::Client::new(), server.uri(), "user".to_owned(), "pw".to_owned());
    assert!(client.get_user("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn update_incident_propagates_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/table/incident/INC0012345"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = HttpItsmClient::new(reqwest::Client::new(), server.uri(), "user".to_owned(), "pw".to_owned());
    let update = aegis_integrations::IncidentUpdate {
        category: "Software",
        subcategory: None,
        priority: "3",
        assignment_group: "L2-Apps",
        resolution_notes: None,
    };
    let err = client.update_incident("INC0012345", update).await.unwrap_err();
    assert!(matches!(err, aegis_integrations::IntegrationError::Status { status: 500, .. }));
}

#[tokio::test]
async fn notify_posts_adaptive_card_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = WebhookChatClient::new(reqwest::Client::new(), format!("{}/webhook", server.uri()));
    let notification = TriageNotification {
        triage_id: "t-1",
        incident_number: "INC0012345",
        category: "Software",
        priority: "3",
        assignment_group: "L2-Apps",
        confidence: 0.88,
        feedback_up_url: Some("https://aegis.example/feedback/t-1/up"),
        feedback_down_url: Some("https://aegis.example/feedback/t-1/down"),
    };
    client.notify(notification).await.unwrap();
}

#[tokio::test]
async fn dispatch_returns_command_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "command_id": "cmd-123",
            "status": "Pending",
        })))
        .mount(&server)
        .await;

    let client = HttpRemediationClient::new(reqwest::Client::new(), server.uri());
    let request = RemediationRequest {
        tool: RemediationTool::RestartIis,
        target: "i-0abc123",
        command: "Restart-Service -Name 'W3SVC' -Force",
    };
    let result = client.dispatch(request).await.unwrap();
    assert_eq!(result.command_id, "cmd-123");
}
