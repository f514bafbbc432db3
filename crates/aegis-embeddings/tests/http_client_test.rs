use aegis_embeddings::{Collection, EmbeddingClient, HttpEmbeddingClient, HttpVectorIndexClient, VectorDocument, VectorIndexClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn embed_posts_text_and_parses_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": vec![0.1_f32; 1024],
        })))
        .mount(&server)
        .await;

    let client = HttpEmbeddingClient::new(reqwest::Client::new(), server.uri());
    let vector = client.embed("unable to login").await.unwrap();
    assert_eq!(vector.len(), 1024);
}

#[tokio::test]
async fn embed_propagates_non_2xx_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/embed"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = HttpEmbeddingClient::new(reqwest::Client::new(), server.uri());
    let err = client.embed("x").await.unwrap_err();
    assert!(matches!(err, aegis_embeddings::EmbeddingError::Status { status: 500, .. }));
}

#[tokio::test]
async fn upsert_and_query_round_trip_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/ingest"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "matches": [
                {"doc_id": "KB001", "title": "Fix login", "content": "...", "score": 0.95, "created_at": null}
            ]
        })))
        .mount(&server)
        .await;

    let client = HttpVectorIndexClient::new(reqwest::Client::new(), server.uri());
    client
        .upsert(
            VectorDocument {
                collection: Collection::Ticket,
                doc_id: "INC0012345".to_owned(),
                title: "Unable to login".to_owned(),
                content: "...".to_owned(),
                category: Some("Software".to_owned()),
                created_at: "2026-07-27T00:00:00Z".to_owned(),
                ttl_secs: Some(90 * 24 * 3600),
            },
            &[0.1; 1024],
        )
        .await
        .unwrap();

    let matches = client.query(Collection::Knowledge, &[0.1; 1024], 3).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].doc_id, "KB001");
}
