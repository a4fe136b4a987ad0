//! End-to-end tests for the HTTP API

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt; // for oneshot
use txrisk_analyzer::{Analyzer, AnalyzerConfig, AnalyzerContext};
use txrisk_api::handlers::{create_router, AppState, ErrorResponse, StatusResponse};
use txrisk_domain::{StoredAnalysis, TransactionRecord};
use txrisk_llm::{MockProvider, SharedProvider};
use txrisk_retrieval::{
    ChunkStrategy, InstructionsRetriever, SanctionsRetriever, SharedRetriever, TextChunker,
};
use txrisk_store::{HashingEmbeddingModel, SqliteStore};

const GUIDANCE: &str = "Screen every counterparty against consolidated sanctions lists.\n\n\
Wire transfers to individuals on the OFAC list must be blocked and reported.\n\n\
Unusual routing through shell companies raises the risk score.";

const REPLY: &str = "<think>The receiver matches guidance on blocked wires.</think>\n```json\n{\"sender\": \"Acme Ltd\", \"receiver\": \"Ivan Petrov\", \"amount\": \"5000\", \"currency\": \"USD\", \"transactionType\": \"Wire Transfer\", \"transactionDate\": \"N/A\", \"riskScore\": 85, \"riskLevel\": \"High Risk\", \"confidenceScore\": 0.8, \"category\": \"Individual\", \"notes\": [\"Reason: blocked wire\"]}\n```";

async fn guidance_retriever() -> SharedRetriever {
    let chunker = TextChunker::new(ChunkStrategy::ByParagraph, 80);
    let retriever = InstructionsRetriever::build(
        GUIDANCE,
        "guidance.md",
        Arc::new(HashingEmbeddingModel::new(64)),
        &chunker,
        5,
    )
    .await
    .unwrap();
    Arc::new(retriever)
}

fn app(retrievers: Vec<SharedRetriever>, provider: MockProvider) -> Router {
    let provider: SharedProvider = Arc::new(provider);
    let context = AnalyzerContext::new(retrievers, provider, AnalyzerConfig::default()).unwrap();
    let state = AppState::new(
        Analyzer::new(Arc::new(context)),
        SqliteStore::new(":memory:").unwrap(),
    );
    create_router(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_analyze(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_root_is_operational() {
    let app = app(vec![guidance_retriever().await], MockProvider::new(REPLY));

    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    let body: StatusResponse = serde_json::from_value(body).unwrap();
    assert_eq!(body.status, "operational");
}

#[tokio::test]
async fn test_analyze_then_fetch() {
    let provider = MockProvider::new(REPLY);
    let app = app(vec![guidance_retriever().await], provider.clone());

    let (status, body) = send(
        &app,
        post_analyze(r#"{"description": "Wire of $5000 from Acme Ltd to Ivan Petrov"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["riskScore"], 85);
    assert_eq!(body["degraded"], false);
    assert_eq!(body["sources"]["instructions"], 3);
    let notes = body["analysis"]["notes"].as_array().unwrap();
    assert_eq!(
        notes.last().unwrap(),
        "Thought process: The receiver matches guidance on blocked wires."
    );

    // The model saw case-folded text and the retrieved guidance
    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("wire of $5000 from acme ltd to ivan petrov"));
    assert!(prompt.contains("OFAC list"));

    let id = body["transaction"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/transaction/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let stored: StoredAnalysis = serde_json::from_value(body).unwrap();
    assert_eq!(stored.transaction.id, id);
    assert_eq!(stored.analysis.receiver, "Ivan Petrov");
    assert!(!stored.degraded);

    let (status, body) = send(&app, get("/transactions")).await;
    assert_eq!(status, StatusCode::OK);
    let listed: Vec<TransactionRecord> = serde_json::from_value(body).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
}

#[tokio::test]
async fn test_file_upload_description() {
    let app = app(vec![guidance_retriever().await], MockProvider::new(REPLY));

    let (status, body) = send(
        &app,
        post_analyze(r#"{"description": "", "file_content": "PAYMENT TO IVAN PETROV"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["transaction"]["description"],
        "File upload: payment to ivan petrov..."
    );
    assert_eq!(
        body["transaction"]["original_content"],
        "PAYMENT TO IVAN PETROV"
    );
}

#[tokio::test]
async fn test_degraded_reply_is_stored() {
    let app = app(
        vec![guidance_retriever().await],
        MockProvider::new("<think>no verdict</think> I could not decide."),
    );

    let (status, body) = send(&app, post_analyze(r#"{"description": "payment"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["analysis"]["riskScore"], 0);

    let id = body["transaction"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, get(&format!("/transaction/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn test_blank_request_is_rejected() {
    let provider = MockProvider::new(REPLY);
    let app = app(vec![guidance_retriever().await], provider.clone());

    let (status, body) = send(&app, post_analyze(r#"{"description": "   "}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error: ErrorResponse = serde_json::from_value(body).unwrap();
    assert_eq!(error.kind, "bad_request");
    assert_eq!(provider.call_count(), 0);

    let (_, body) = send(&app, get("/transactions")).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let app = app(vec![guidance_retriever().await], MockProvider::new(REPLY));

    let (status, body) = send(&app, get("/transaction/does-not-exist")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn test_sanctions_outage_is_bad_gateway() {
    // Nothing listens on the discard port
    let sanctions = SanctionsRetriever::new(
        "http://127.0.0.1:9",
        "default",
        "test-key",
        Duration::from_secs(2),
    )
    .unwrap();
    let provider = MockProvider::new(REPLY);
    let app = app(
        vec![Arc::new(sanctions), guidance_retriever().await],
        provider.clone(),
    );

    let (status, body) = send(&app, post_analyze(r#"{"description": "pay ivan petrov"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "remote_service");
    assert_eq!(provider.call_count(), 0);

    let (_, body) = send(&app, get("/transactions")).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_model_failure_is_bad_gateway() {
    let provider = MockProvider::new(REPLY);
    provider.push_error("backend down");
    let app = app(vec![guidance_retriever().await], provider);

    let (status, body) = send(&app, post_analyze(r#"{"description": "pay ivan petrov"}"#)).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "inference");
}
