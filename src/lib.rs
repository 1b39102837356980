// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod cache;
pub mod config;
pub mod confidence;
pub mod engine;
pub mod grammar;
pub mod humanize;
pub mod metrics;
pub mod scoring;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::cache::ContentCache;
pub use crate::confidence::confidence;
pub use crate::engine::{ConversionEngine, ConversionRequest, ConversionResult, EngineError};
pub use crate::humanize::Tone;
pub use crate::scoring::{Category, CategoryScorer};
