// tests/vendor_http.rs
//
// Vendor clients against a local axum server standing in for the vendor API.
// Binds 127.0.0.1:0, so no external network is touched.

use std::time::Duration;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

use text_humanizer::scoring::{
    BackendError, Category, CategoryScorer, HttpBackend, ScoringBackend, Vendor,
};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

fn fake_vendor() -> Router {
    Router::new()
        .route(
            "/gptzero",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("gz-key") {
                    return (StatusCode::UNAUTHORIZED, Json(json!({})));
                }
                assert!(body["document"].is_string());
                (
                    StatusCode::OK,
                    Json(json!({ "documents": [{ "completely_generated_prob": 0.73 }] })),
                )
            }),
        )
        .route(
            "/copyleaks",
            post(|headers: HeaderMap| async move {
                let bearer = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                assert_eq!(bearer, "Bearer cl-key");
                Json(json!({ "results": { "plagiarism": 12.5 } }))
            }),
        )
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
        .route("/shape", post(|| async { Json(json!({ "unexpected": true })) }))
}

fn backend(vendor: Vendor, category: Category, key: &str, url: String) -> HttpBackend {
    HttpBackend::new(vendor, category, key.to_string(), url, Duration::from_secs(5))
        .expect("build client")
}

#[tokio::test]
async fn gptzero_detection_score_is_read_from_documents() {
    let base = spawn(fake_vendor()).await;
    let b = backend(Vendor::GptZero, Category::Detection, "gz-key", format!("{base}/gptzero"));
    assert_eq!(b.name(), "gptzero:detection");
    let v = b.call("some text").await.expect("score");
    assert!((v - 0.73).abs() < 1e-12);
}

#[tokio::test]
async fn copyleaks_plagiarism_percent_is_normalized() {
    let base = spawn(fake_vendor()).await;
    let b = backend(Vendor::CopyLeaks, Category::Plagiarism, "cl-key", format!("{base}/copyleaks"));
    let v = b.call("some text").await.expect("score");
    assert!((v - 0.125).abs() < 1e-12);
}

#[tokio::test]
async fn non_success_and_bad_shapes_are_errors() {
    let base = spawn(fake_vendor()).await;

    let wrong_key = backend(Vendor::GptZero, Category::Detection, "nope", format!("{base}/gptzero"));
    assert!(matches!(wrong_key.call("x").await, Err(BackendError::Status(401))));

    let broken = backend(Vendor::Originality, Category::Detection, "k", format!("{base}/broken"));
    assert!(matches!(broken.call("x").await, Err(BackendError::Status(500))));

    let shape = backend(Vendor::Grammarly, Category::Plagiarism, "k", format!("{base}/shape"));
    assert!(matches!(shape.call("x").await, Err(BackendError::Decode(_))));

    let no_key = backend(Vendor::Turnitin, Category::Detection, "", format!("{base}/broken"));
    assert!(matches!(no_key.call("x").await, Err(BackendError::MissingKey)));
}

#[tokio::test]
async fn scorer_mixes_live_vendor_with_failures() {
    let base = spawn(fake_vendor()).await;
    let backends: Vec<text_humanizer::scoring::DynBackend> = vec![
        std::sync::Arc::new(backend(
            Vendor::GptZero,
            Category::Detection,
            "gz-key",
            format!("{base}/gptzero"),
        )),
        std::sync::Arc::new(backend(
            Vendor::Originality,
            Category::Detection,
            "k",
            format!("{base}/broken"),
        )),
    ];
    let scorer = CategoryScorer::new(Category::Detection, backends, Duration::from_secs(5));
    let out = scorer.score("some text to check").await;
    assert!(!out.used_fallback);
    assert_eq!(out.samples.len(), 1);
    assert!((out.value - 0.73).abs() < 1e-12);
}
