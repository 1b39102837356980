//! Concurrent fan-out of one text to every configured backend of a category.
//!
//! Every call runs as its own task with an independent timeout; the set is awaited
//! until all calls have settled. Results come back as `(source, outcome)` pairs in
//! backend order, and sample extraction is a separate pure filter.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinSet;

use super::backends::{BackendError, DynBackend};
use super::{Category, ScoreSample, HEURISTIC_SOURCE};

/// One settled backend call.
#[derive(Debug)]
pub struct BackendOutcome {
    pub source: String,
    pub result: Result<f64, BackendError>,
}

impl BackendOutcome {
    /// The score if it is a usable sample value.
    pub fn usable(&self) -> Option<f64> {
        match self.result {
            Ok(v) if in_unit_range(v) => Some(v),
            _ => None,
        }
    }
}

#[inline]
pub(crate) fn in_unit_range(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

/// Issue one call per backend concurrently and wait for all of them.
///
/// Out-of-range values are normalized to [`BackendError::OutOfRange`] here so the
/// outcome list already tells dropped and usable results apart.
pub async fn fan_out(text: &str, backends: &[DynBackend], timeout: Duration) -> Vec<BackendOutcome> {
    let text: Arc<str> = Arc::from(text);
    let mut set = JoinSet::new();

    for (idx, backend) in backends.iter().enumerate() {
        let backend = Arc::clone(backend);
        let text = Arc::clone(&text);
        set.spawn(async move {
            let result = match tokio::time::timeout(timeout, backend.call(&text)).await {
                Ok(Ok(v)) if in_unit_range(v) => Ok(v),
                Ok(Ok(v)) => Err(BackendError::OutOfRange(v)),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(BackendError::Timeout(timeout)),
            };
            (idx, result)
        });
    }

    let mut slots: Vec<Option<Result<f64, BackendError>>> =
        backends.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, result)) => slots[idx] = Some(result),
            Err(e) => {
                // The slot of a panicked task stays empty and is filled below.
                tracing::warn!(target: "scoring", error = %e, "backend task failed to join");
            }
        }
    }

    slots
        .into_iter()
        .zip(backends)
        .map(|(slot, backend)| BackendOutcome {
            source: backend.name().to_string(),
            result: slot
                .unwrap_or_else(|| Err(BackendError::Aborted("task did not complete".into()))),
        })
        .collect()
}

/// Keep only well-formed results. Pure: no logging, no state.
pub fn extract_samples(outcomes: &[BackendOutcome]) -> Vec<ScoreSample> {
    outcomes
        .iter()
        .filter_map(|o| {
            o.usable().map(|value| ScoreSample {
                value,
                source: o.source.clone(),
            })
        })
        .collect()
}

/// Result of scoring one category through its backends.
#[derive(Debug)]
pub struct BackendRun {
    pub outcomes: Vec<BackendOutcome>,
    pub samples: Vec<ScoreSample>,
    pub used_fallback: bool,
}

/// Fan out, drop unusable results, and fall back to the local heuristic when nothing
/// usable is left. `samples` is never empty.
pub async fn score_via_backends(
    category: Category,
    text: &str,
    backends: &[DynBackend],
    timeout: Duration,
    text_id: &str,
) -> BackendRun {
    let outcomes = if backends.is_empty() {
        Vec::new()
    } else {
        counter!("backend_calls_total", "category" => category.as_str())
            .increment(backends.len() as u64);
        fan_out(text, backends, timeout).await
    };

    for o in &outcomes {
        if let Err(e) = &o.result {
            counter!("backend_dropped_total", "category" => category.as_str()).increment(1);
            tracing::warn!(
                target: "scoring",
                category = category.as_str(),
                source = %o.source,
                error = %e,
                %text_id,
                "backend result dropped"
            );
        }
    }

    let mut samples = extract_samples(&outcomes);
    let used_fallback = samples.is_empty();
    if used_fallback {
        counter!("heuristic_fallback_total", "category" => category.as_str()).increment(1);
        tracing::info!(
            target: "scoring",
            category = category.as_str(),
            configured = backends.len(),
            %text_id,
            "no usable backend score; using heuristic"
        );
        samples.push(ScoreSample {
            value: category.heuristic(text),
            source: HEURISTIC_SOURCE.to_string(),
        });
    }

    BackendRun {
        outcomes,
        samples,
        used_fallback,
    }
}
