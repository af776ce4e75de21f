use std::sync::Arc;

use ragpipe_eval::{EvalSettings, Evaluator};
use ragpipe_rag::testing::{RecordingGenerator, VocabularyEmbedder};
use ragpipe_rag::{EmbeddingProvider, InMemoryVectorStore, RagConfig, RagPipeline};
use ragpipe_server::{ApiResponse, AppState, app_router};
use reqwest::StatusCode;
use reqwest::multipart::Form;
use serde_json::json;
use tempfile::TempDir;

const VOCABULARY: [&str; 5] = ["the", "cat", "sat", "dog", "ran"];
const STORY: &str = "The cat sat. The dog ran.";

fn pipeline(collection: &str, generator: Arc<RecordingGenerator>) -> RagPipeline {
    let embedder = Arc::new(VocabularyEmbedder::new(VOCABULARY));
    let config = RagConfig::builder()
        .chunk_size(2)
        .chunk_overlap(0)
        .dimensions(embedder.dimensions())
        .build()
        .expect("config");

    RagPipeline::builder()
        .config(config)
        .collection(collection)
        .embedding_provider(embedder)
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .generator(generator)
        .build()
        .expect("pipeline")
}

async fn spawn_server() -> (String, TempDir, tokio::task::JoinHandle<()>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = dir.path().join("source.txt");
    let retrieval = dir.path().join("retrieval.json");
    let generation = dir.path().join("generation.json");
    std::fs::write(&source, STORY).expect("write corpus");
    std::fs::write(&retrieval, r#"[{"question": "cat", "relevant_chunks": [{"id": 0}]}]"#)
        .expect("write retrieval dataset");
    std::fs::write(&generation, r#"[{"question": "what sat?", "answer": "the cat sat"}]"#)
        .expect("write generation dataset");

    let generator = Arc::new(RecordingGenerator::fixed("a cat"));
    let settings = EvalSettings {
        source_data_path: source,
        retrieval_data_path: retrieval,
        generation_data_path: generation,
        top_k: 1,
    };
    let evaluator = Evaluator::new(Arc::new(pipeline("eval", generator.clone())), settings)
        .expect("evaluator");
    let state = AppState {
        pipeline: Arc::new(pipeline("documents", generator)),
        evaluator: Arc::new(evaluator),
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app_router(state)).await.expect("server run");
    });

    (format!("http://{}", addr), dir, handle)
}

#[tokio::test]
async fn ping_reports_success() {
    let (base, _dir, handle) = spawn_server().await;

    let response = reqwest::get(format!("{base}/api/ping")).await.expect("ping response");
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse = response.json().await.expect("envelope");
    assert!(body.success);
    assert!(body.message.is_some());

    handle.abort();
}

#[tokio::test]
async fn store_then_ask_returns_answer_and_contexts() {
    let (base, _dir, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let stored = client
        .post(format!("{base}/api/store"))
        .multipart(Form::new().text("file", STORY))
        .send()
        .await
        .expect("store");
    assert_eq!(stored.status(), StatusCode::OK);
    let stored: ApiResponse = stored.json().await.expect("envelope");
    assert_eq!(stored.data.expect("report")["chunk_count"], 3);

    let asked = client
        .post(format!("{base}/api/ask"))
        .json(&json!({"query": "cat"}))
        .send()
        .await
        .expect("ask");
    assert_eq!(asked.status(), StatusCode::OK);
    let asked: ApiResponse = asked.json().await.expect("envelope");
    assert_eq!(asked.query.as_deref(), Some("cat"));
    assert_eq!(asked.answer.as_deref(), Some("a cat"));
    let contexts = asked.data.expect("contexts");
    assert_eq!(contexts.as_array().map(Vec::len), Some(3));
    assert_eq!(contexts[0], "The cat");

    handle.abort();
}

#[tokio::test]
async fn ask_direct_has_no_contexts() {
    let (base, _dir, handle) = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/ask-direct"))
        .json(&json!({"query": "Who sat?"}))
        .send()
        .await
        .expect("ask-direct");
    assert_eq!(response.status(), StatusCode::OK);
    let body: ApiResponse = response.json().await.expect("envelope");
    assert_eq!(body.answer.as_deref(), Some("a cat"));
    assert!(body.data.is_none());

    handle.abort();
}

#[tokio::test]
async fn bad_requests_get_an_error_envelope() {
    let (base, _dir, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let malformed = client
        .post(format!("{base}/api/ask"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("malformed ask");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = malformed.json().await.expect("envelope");
    assert!(!body.success);

    let empty = client
        .post(format!("{base}/api/ask"))
        .json(&json!({"query": "  "}))
        .send()
        .await
        .expect("empty ask");
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

    let blank_store = client
        .post(format!("{base}/api/store"))
        .multipart(Form::new().text("file", "   "))
        .send()
        .await
        .expect("blank store");
    assert_eq!(blank_store.status(), StatusCode::BAD_REQUEST);

    handle.abort();
}

#[tokio::test]
async fn store_requires_a_multipart_file_field() {
    let (base, _dir, handle) = spawn_server().await;
    let client = reqwest::Client::new();

    let plain = client
        .post(format!("{base}/api/store"))
        .header("content-type", "text/plain")
        .body(STORY)
        .send()
        .await
        .expect("plain-text store");
    assert_eq!(plain.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = plain.json().await.expect("envelope");
    assert!(!body.success);
    assert!(body.message.expect("message").contains("multipart"));

    let wrong_field = client
        .post(format!("{base}/api/store"))
        .multipart(Form::new().text("document", STORY))
        .send()
        .await
        .expect("wrong-field store");
    assert_eq!(wrong_field.status(), StatusCode::BAD_REQUEST);
    let body: ApiResponse = wrong_field.json().await.expect("envelope");
    assert!(body.message.expect("message").contains("'file'"));

    // Other fields before the document are skipped.
    let with_extra = client
        .post(format!("{base}/api/store"))
        .multipart(Form::new().text("note", "ignored").text("file", STORY))
        .send()
        .await
        .expect("store with extra field");
    assert_eq!(with_extra.status(), StatusCode::OK);
    let stored: ApiResponse = with_extra.json().await.expect("envelope");
    assert_eq!(stored.data.expect("report")["chunk_count"], 3);

    handle.abort();
}

#[tokio::test]
async fn pipeline_failure_is_a_server_error() {
    let (base, _dir, handle) = spawn_server().await;

    // Nothing stored yet, so the search has no collection to query.
    let response = reqwest::Client::new()
        .post(format!("{base}/api/ask"))
        .json(&json!({"query": "cat"}))
        .send()
        .await
        .expect("ask");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiResponse = response.json().await.expect("envelope");
    assert!(!body.success);
    assert!(body.message.expect("message").contains("search"));

    handle.abort();
}

#[tokio::test]
async fn evaluation_endpoints_return_cached_results() {
    let (base, _dir, handle) = spawn_server().await;

    let index: ApiResponse = reqwest::get(format!("{base}/api/evaluation"))
        .await
        .expect("index")
        .json()
        .await
        .expect("envelope");
    assert!(index.message.expect("message").contains("/api/evaluation/retrieval"));

    let first: ApiResponse = reqwest::get(format!("{base}/api/evaluation/retrieval"))
        .await
        .expect("retrieval")
        .json()
        .await
        .expect("envelope");
    let second: ApiResponse = reqwest::get(format!("{base}/api/evaluation/retrieval"))
        .await
        .expect("retrieval again")
        .json()
        .await
        .expect("envelope");
    let data = first.data.expect("retrieval result");
    assert_eq!(data["avg_precision"], 1.0);
    assert_eq!(Some(data), second.data);

    let generation: ApiResponse = reqwest::get(format!("{base}/api/evaluation/generation"))
        .await
        .expect("generation")
        .json()
        .await
        .expect("envelope");
    assert!(generation.success);
    let cases = &generation.data.expect("generation result")["test_cases"];
    assert_eq!(cases[0]["generated_answer"], "a cat");

    handle.abort();
}
