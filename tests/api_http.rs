// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use text_humanizer::humanize::Humanizer;
use text_humanizer::{router, ConversionEngine};

const BODY_LIMIT: usize = 1024 * 1024;

const AI_TEXT: &str = "Furthermore, organizations utilize advanced systems. Moreover, teams leverage \
data to facilitate outcomes. In conclusion, the approach optimizes every process.";

fn test_router() -> Router {
    let engine = ConversionEngine::new().with_humanizer(Humanizer::with_seed(11));
    router(Arc::new(engine))
}

async fn post_json(app: Router, uri: &str, payload: Json) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v: Json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn health_returns_ok() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("body");
    assert_eq!(String::from_utf8(bytes.to_vec()).expect("utf8"), "ok");
}

#[tokio::test]
async fn convert_returns_all_scores() {
    let (status, v) = post_json(
        test_router(),
        "/api/convert",
        json!({ "text": AI_TEXT, "tone": "casual" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{v}");
    for field in [
        "original_text",
        "corrected_text",
        "mutated_text",
        "grammar_corrections",
        "humanization_score",
        "detection_score",
        "plagiarism_score",
        "confidence",
        "processing_ms",
    ] {
        assert!(v.get(field).is_some(), "missing {field} in {v}");
    }
    let c = v["confidence"].as_f64().expect("confidence number");
    assert!((0.0..=1.0).contains(&c));
}

#[tokio::test]
async fn convert_with_checks_off_reports_zero_scores() {
    let (status, v) = post_json(
        test_router(),
        "/api/convert",
        json!({ "text": AI_TEXT, "check_ai_detection": false, "check_plagiarism": false }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["detection_score"].as_f64(), Some(0.0));
    assert_eq!(v["plagiarism_score"].as_f64(), Some(0.0));
}

#[tokio::test]
async fn blank_text_is_422_with_error_body() {
    for uri in [
        "/api/convert",
        "/api/grammar",
        "/api/humanize",
        "/api/detect",
        "/api/plagiarism",
        "/api/detect/details",
        "/api/plagiarism/details",
        "/api/grammar/suggestions",
        "/api/grammar/quality",
        "/api/plagiarism/sentences",
    ] {
        let (status, v) = post_json(test_router(), uri, json!({ "text": "   " })).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert!(v["error"].is_string(), "{uri}: {v}");
    }
}

#[tokio::test]
async fn detect_flags_formal_ai_like_text() {
    let (status, v) = post_json(test_router(), "/api/detect", json!({ "text": AI_TEXT })).await;
    assert_eq!(status, StatusCode::OK);
    let score = v["score"].as_f64().expect("score");
    assert_eq!(v["is_ai_detected"].as_bool(), Some(score > 0.5));
    assert!(score > 0.3, "{score}");
}

#[tokio::test]
async fn plagiarism_reports_flag() {
    let text = "According to Smith (Smith, 2020), the effect holds [1]. Research shows it again (2). \
                The data indicates a clear trend. The study suggests more work is needed here.";
    let (status, v) = post_json(test_router(), "/api/plagiarism", json!({ "text": text })).await;
    assert_eq!(status, StatusCode::OK);
    let score = v["score"].as_f64().expect("score");
    assert_eq!(v["is_plagiarized"].as_bool(), Some(score > 0.3));
}

#[tokio::test]
async fn details_show_heuristic_fallback() {
    let (status, v) = post_json(
        test_router(),
        "/api/detect/details",
        json!({ "text": AI_TEXT }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["category"], "detection");
    assert_eq!(v["used_fallback"], true);
    assert_eq!(v["backends"].as_array().map(Vec::len), Some(0));
    assert_eq!(v["score"], v["heuristic_score"]);
}

#[tokio::test]
async fn humanize_unknown_tone_resolves_to_balanced() {
    let (status, v) = post_json(
        test_router(),
        "/api/humanize",
        json!({ "text": "We do not know what happens next.", "tone": "nonexistent_tone" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["tone"], "balanced");
    assert!(v["humanized_text"].as_str().unwrap_or_default().to_lowercase().contains("don't"));
}

#[tokio::test]
async fn grammar_reports_corrections() {
    let (status, v) = post_json(
        test_router(),
        "/api/grammar",
        json!({ "text": "i think the the plan works." }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["corrected_text"], "I think the plan works.");
    assert_eq!(v["corrections"], 2);
}

#[tokio::test]
async fn grammar_suggestions_and_quality() {
    let text = "The plan is ready. i think the the plan works.";
    let (status, v) = post_json(test_router(), "/api/grammar/suggestions", json!({ "text": text })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = v.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sentence_index"], 1);
    assert_eq!(rows[0]["corrected"], "I think the plan works.");

    let (status, v) = post_json(test_router(), "/api/grammar/quality", json!({ "text": text })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["suggestions_count"], 1);
    assert_eq!(v["error_rate"].as_f64(), Some(0.5));
    assert_eq!(v["grammar_score"].as_f64(), Some(0.5));
}

#[tokio::test]
async fn plagiarism_sentences_flag_stock_phrasing() {
    let text = "Quantum sparrows debate jazz. The plan failed due to the cost, because of the delay, \
                and as a result the team left in order to regroup.";
    let (status, v) = post_json(test_router(), "/api/plagiarism/sentences", json!({ "text": text })).await;
    assert_eq!(status, StatusCode::OK);
    let rows = v.as_array().expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["needs_improvement"], false);
    assert_eq!(rows[1]["needs_improvement"], true);
    assert_eq!(rows[1]["sentence_index"], 1);
}

#[tokio::test]
async fn cache_stats_after_repeat_detect() {
    let app = test_router();
    for _ in 0..2 {
        let (status, _) = post_json(app.clone(), "/api/detect", json!({ "text": AI_TEXT })).await;
        assert_eq!(status, StatusCode::OK);
    }
    let req = Request::builder()
        .uri("/api/cache/stats")
        .body(Body::empty())
        .expect("build");
    let resp = app.oneshot(req).await.expect("oneshot");
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("body");
    let v: Json = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(v["hits"], 1);
    assert_eq!(v["misses"], 1);
    assert_eq!(v["store"], "memory");
}
