//! Overall confidence for one conversion.
//!
//! confidence = 0.2 * max(0, 1 - 0.1 * corrections)
//!            + 0.3 * humanization
//!            + 0.3 * (1 - detection)
//!            + 0.2 * (1 - plagiarism)
//!
//! clamped to [0,1]. Weights are integer percentages so the sum check is exact.

const W_GRAMMAR_PCT: u32 = 20;
const W_HUMANIZATION_PCT: u32 = 30;
const W_DETECTION_PCT: u32 = 30;
const W_PLAGIARISM_PCT: u32 = 20;

const _: () = assert!(W_GRAMMAR_PCT + W_HUMANIZATION_PCT + W_DETECTION_PCT + W_PLAGIARISM_PCT == 100);

/// Each grammar correction costs this much of the grammar component.
const PER_CORRECTION_PENALTY: f64 = 0.1;

#[inline]
fn pct(w: u32) -> f64 {
    f64::from(w) / 100.0
}

/// Stage outputs folded into the confidence value. Scores are clamped to [0,1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ConfidenceInputs {
    pub grammar_corrections: u32,
    pub humanization_score: f64,
    pub detection_score: f64,
    pub plagiarism_score: f64,
}

impl ConfidenceInputs {
    pub fn new(
        grammar_corrections: u32,
        humanization_score: f64,
        detection_score: f64,
        plagiarism_score: f64,
    ) -> Self {
        fn c(x: f64) -> f64 {
            if x.is_finite() {
                x.clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
        Self {
            grammar_corrections,
            humanization_score: c(humanization_score),
            detection_score: c(detection_score),
            plagiarism_score: c(plagiarism_score),
        }
    }

    pub fn confidence(&self) -> f64 {
        let grammar =
            (1.0 - PER_CORRECTION_PENALTY * f64::from(self.grammar_corrections)).max(0.0);
        let raw = pct(W_GRAMMAR_PCT) * grammar
            + pct(W_HUMANIZATION_PCT) * self.humanization_score
            + pct(W_DETECTION_PCT) * (1.0 - self.detection_score)
            + pct(W_PLAGIARISM_PCT) * (1.0 - self.plagiarism_score);
        raw.clamp(0.0, 1.0)
    }
}

pub fn confidence(
    grammar_corrections: u32,
    humanization_score: f64,
    detection_score: f64,
    plagiarism_score: f64,
) -> f64 {
    ConfidenceInputs::new(
        grammar_corrections,
        humanization_score,
        detection_score,
        plagiarism_score,
    )
    .confidence()
}
