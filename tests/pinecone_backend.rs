use docsearch_rs::backends::{
    IndexDirectory, Pinecone, RerankCandidate, RerankModel, Reranker, VectorQuery, VectorStore,
};
use docsearch_rs::config::Settings;
use docsearch_rs::network::{HttpClient, RetryPolicy};
use docsearch_rs::SearchError;
use serde_json::json;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.backend.api_key = Some("test-key".to_string());
    settings.backend.control_url = server.uri();
    settings.backend.request_timeout = 0.5;
    settings.backend.rerank_timeout = 0.5;
    settings
        .backend
        .index_hosts
        .insert("verkada-docs".to_string(), server.uri());
    settings
}

fn pinecone(settings: &Settings) -> Pinecone {
    let client = HttpClient::with_settings(&settings.backend, &settings.retry)
        .unwrap()
        .with_retry(RetryPolicy::none());
    Pinecone::new(client, settings)
}

fn query(top_k: u32) -> VectorQuery {
    VectorQuery {
        text: "camera setup".to_string(),
        index_name: "verkada-docs".to_string(),
        namespace: "verkada-docs".to_string(),
        top_k,
    }
}

#[tokio::test]
async fn test_search_records_request_and_hits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .and(header("Api-Key", "test-key"))
        .and(header("X-Pinecone-API-Version", "2025-01"))
        .and(body_json(json!({
            "query": {"inputs": {"text": "camera setup"}, "top_k": 3},
            "fields": ["text", "url", "description"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"hits": [
                {"_id": "doc-1", "_score": 0.91, "fields": {
                    "text": "Mount the camera", "url": "https://docs.example.com/mount"
                }},
                {"_id": "doc-2", "_score": 0.72, "fields": {"text": ["Power over Ethernet"]}}
            ]},
            "usage": {"read_units": 6, "embed_total_tokens": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = assert_ok!(pinecone(&settings(&server)).query(&query(3)).await);

    assert_eq!(outcome.hits.len(), 2);
    assert_eq!(outcome.hits[0].id, "doc-1");
    assert_eq!(outcome.hits[0].url(), Some("https://docs.example.com/mount"));
    assert_eq!(outcome.hits[1].text(), Some("Power over Ethernet"));
    assert_eq!(outcome.usage.get("read_units"), Some(6.0));
    assert_eq!(outcome.usage.get("embed_total_tokens"), Some(4.0));
}

#[tokio::test]
async fn test_search_rejection_is_not_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": "INVALID_ARGUMENT", "message": "top_k too large"}
        })))
        .mount(&server)
        .await;

    let err = assert_err!(pinecone(&settings(&server)).query(&query(3)).await);
    assert_eq!(
        err,
        SearchError::BackendRejected {
            status: 400,
            detail: "top_k too large".to_string()
        }
    );
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = assert_err!(pinecone(&settings(&server)).query(&query(3)).await);
    assert_eq!(err.kind(), "backend_unavailable");
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": {"hits": []}}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = assert_err!(pinecone(&settings(&server)).query(&query(3)).await);
    assert_eq!(err.kind(), "backend_unavailable");
}

#[tokio::test]
async fn test_retry_recovers_from_throttling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"hits": [{"_id": "doc-1", "_score": 0.5, "fields": {}}]}
        })))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.retry.initial_delay = 0.01;
    settings.retry.jitter = false;
    let client = HttpClient::with_settings(&settings.backend, &settings.retry).unwrap();
    let outcome = Pinecone::new(client, &settings).query(&query(1)).await.unwrap();

    assert_eq!(outcome.hits.len(), 1);
    assert!(outcome.usage.is_empty());
}

#[tokio::test]
async fn test_rerank_maps_indexes_to_candidate_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rerank"))
        .and(body_json(json!({
            "model": "bge-reranker-v2-m3",
            "query": "camera setup",
            "documents": [
                {"id": "doc-1", "text": "Mount the camera"},
                {"id": "doc-2", "text": "Power over Ethernet"}
            ],
            "top_n": 2,
            "rank_fields": ["text"],
            "return_documents": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"index": 1, "score": 0.98}, {"index": 0, "score": 0.12}],
            "usage": {"rerank_units": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let candidates = vec![
        RerankCandidate::new("doc-1", "Mount the camera"),
        RerankCandidate::new("doc-2", "Power over Ethernet"),
    ];
    let outcome = pinecone(&settings(&server))
        .rerank("camera setup", RerankModel::BgeRerankerV2M3, &candidates)
        .await
        .unwrap();

    let ids: Vec<&str> = outcome.ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["doc-2", "doc-1"]);
    assert_eq!(outcome.ranked[0].index, 1);
    assert_eq!(outcome.ranked[0].score, 0.98);
    assert_eq!(outcome.usage.get("rerank_units"), Some(1.0));
}

#[tokio::test]
async fn test_rerank_failure_is_rerank_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rerank"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "model cohere-rerank-3.5 is not available"}
        })))
        .mount(&server)
        .await;

    let candidates = vec![RerankCandidate::new("doc-1", "Mount the camera")];
    let err = pinecone(&settings(&server))
        .rerank("camera setup", RerankModel::CohereRerank35, &candidates)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "rerank_unavailable");
}

#[tokio::test]
async fn test_rerank_without_candidates_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rerank"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let outcome = pinecone(&settings(&server))
        .rerank("camera setup", RerankModel::PineconeRerankV0, &[])
        .await
        .unwrap();
    assert!(outcome.ranked.is_empty());
}

#[tokio::test]
async fn test_directory_discovers_hosts_and_namespaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "indexes": [{"name": "webpage-english-chunks", "host": server.uri()}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "namespaces": {"": {"vector_count": 3}, "english": {"vector_count": 12}},
            "dimension": 1024
        })))
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.backend.index_hosts.clear();
    let pinecone = pinecone(&settings);

    let indexes = pinecone.list_indexes().await.unwrap();
    assert_eq!(indexes, ["webpage-english-chunks"]);

    let namespaces = pinecone.list_namespaces("webpage-english-chunks").await.unwrap();
    assert_eq!(namespaces, ["english"]);
}

#[tokio::test]
async fn test_unknown_host_is_resolved_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/verkada-docs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "verkada-docs", "host": server.uri()
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/records/namespaces/verkada-docs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"hits": []}})))
        .expect(2)
        .mount(&server)
        .await;

    let mut settings = settings(&server);
    settings.backend.index_hosts.clear();
    let pinecone = pinecone(&settings);

    assert!(pinecone.query(&query(2)).await.unwrap().hits.is_empty());
    assert!(pinecone.query(&query(2)).await.unwrap().hits.is_empty());
}
