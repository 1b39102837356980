use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shuttle_axum::axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::cache::CacheStats;
use crate::engine::{ConversionEngine, ConversionRequest, ConversionResult, EngineError};
use crate::grammar::{GrammarQuality, GrammarSuggestion};
use crate::humanize::Tone;
use crate::scoring::{Category, CategoryReport, SentenceUniqueness};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<ConversionEngine>,
}

impl AppState {
    pub fn new(engine: Arc<ConversionEngine>) -> Self {
        Self { engine }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/convert", post(convert))
        .route("/api/grammar", post(grammar))
        .route("/api/grammar/suggestions", post(grammar_suggestions))
        .route("/api/grammar/quality", post(grammar_quality))
        .route("/api/humanize", post(humanize))
        .route("/api/detect", post(detect))
        .route("/api/plagiarism", post(plagiarism))
        .route("/api/detect/details", post(detect_details))
        .route("/api/plagiarism/details", post(plagiarism_details))
        .route("/api/plagiarism/sentences", post(plagiarism_sentences))
        .route("/api/cache/stats", get(cache_stats))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Router over a ready engine.
pub fn router(engine: Arc<ConversionEngine>) -> Router {
    create_router(AppState::new(engine))
}

pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EngineError::EmptyText => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Deserialize)]
struct TextReq {
    text: String,
}

fn default_tone() -> String {
    Tone::default().as_str().to_string()
}
fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct HumanizeReq {
    text: String,
    #[serde(default = "default_tone")]
    tone: String,
    #[serde(default = "default_true")]
    preserve_meaning: bool,
}

#[derive(Serialize)]
struct GrammarResp {
    corrected_text: String,
    corrections: u32,
}

#[derive(Serialize)]
struct HumanizeResp {
    humanized_text: String,
    tone: Tone,
    humanization_score: f64,
}

#[derive(Serialize)]
struct DetectResp {
    score: f64,
    is_ai_detected: bool,
}

#[derive(Serialize)]
struct PlagiarismResp {
    score: f64,
    is_plagiarized: bool,
}

async fn convert(
    State(state): State<AppState>,
    Json(req): Json<ConversionRequest>,
) -> ApiResult<ConversionResult> {
    Ok(Json(state.engine.convert(&req).await?))
}

async fn grammar(State(state): State<AppState>, Json(req): Json<TextReq>) -> ApiResult<GrammarResp> {
    let (corrected_text, corrections) = state.engine.correct_grammar(&req.text).await?;
    Ok(Json(GrammarResp {
        corrected_text,
        corrections,
    }))
}

async fn grammar_suggestions(
    State(state): State<AppState>,
    Json(req): Json<TextReq>,
) -> ApiResult<Vec<GrammarSuggestion>> {
    Ok(Json(state.engine.grammar_suggestions(&req.text).await?))
}

async fn grammar_quality(State(state): State<AppState>, Json(req): Json<TextReq>) -> ApiResult<GrammarQuality> {
    Ok(Json(state.engine.grammar_quality(&req.text).await?))
}

async fn humanize(State(state): State<AppState>, Json(req): Json<HumanizeReq>) -> ApiResult<HumanizeResp> {
    let tone = Tone::parse(&req.tone);
    let (humanized_text, humanization_score) = state
        .engine
        .humanize(&req.text, tone, req.preserve_meaning)
        .await?;
    Ok(Json(HumanizeResp {
        humanized_text,
        tone,
        humanization_score,
    }))
}

async fn detect(State(state): State<AppState>, Json(req): Json<TextReq>) -> ApiResult<DetectResp> {
    let score = state.engine.score_detection(&req.text).await?;
    Ok(Json(DetectResp {
        score,
        is_ai_detected: score > Category::Detection.flag_threshold(),
    }))
}

async fn plagiarism(State(state): State<AppState>, Json(req): Json<TextReq>) -> ApiResult<PlagiarismResp> {
    let score = state.engine.score_plagiarism(&req.text).await?;
    Ok(Json(PlagiarismResp {
        score,
        is_plagiarized: score > Category::Plagiarism.flag_threshold(),
    }))
}

async fn detect_details(State(state): State<AppState>, Json(req): Json<TextReq>) -> ApiResult<CategoryReport> {
    Ok(Json(state.engine.detection_details(&req.text).await?))
}

async fn plagiarism_details(
    State(state): State<AppState>,
    Json(req): Json<TextReq>,
) -> ApiResult<CategoryReport> {
    Ok(Json(state.engine.plagiarism_details(&req.text).await?))
}

async fn plagiarism_sentences(
    State(state): State<AppState>,
    Json(req): Json<TextReq>,
) -> ApiResult<Vec<SentenceUniqueness>> {
    Ok(Json(state.engine.sentence_uniqueness(&req.text)?))
}

async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.engine.cache().stats())
}
