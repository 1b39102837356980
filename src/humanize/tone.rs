//! Tone keys and the phrase sets each tone draws from.

use serde::{Deserialize, Serialize};

/// Named rewriting style. Unknown keys resolve to [`Tone::Balanced`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Formal,
    Casual,
    #[default]
    Balanced,
}

impl Tone {
    /// Case-insensitive; never fails.
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "formal" => Tone::Formal,
            "casual" => Tone::Casual,
            _ => Tone::Balanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Formal => "formal",
            Tone::Casual => "casual",
            Tone::Balanced => "balanced",
        }
    }

    pub fn profile(self) -> &'static ToneProfile {
        match self {
            Tone::Formal => &FORMAL,
            Tone::Casual => &CASUAL,
            Tone::Balanced => &BALANCED,
        }
    }

    /// Contractions are folded for everything but formal writing.
    pub fn uses_contractions(self) -> bool {
        !matches!(self, Tone::Formal)
    }

    pub fn hedges(self) -> &'static [&'static str] {
        match self {
            Tone::Formal => FORMAL_HEDGES,
            Tone::Casual | Tone::Balanced => INFORMAL_HEDGES,
        }
    }
}

impl From<&str> for Tone {
    fn from(s: &str) -> Self {
        Tone::parse(s)
    }
}

/// Immutable phrase bundle for one tone.
#[derive(Debug)]
pub struct ToneProfile {
    pub sentence_starters: &'static [&'static str],
    pub transition_phrases: &'static [&'static str],
    pub conclusion_phrases: &'static [&'static str],
}

impl ToneProfile {
    /// Starters followed by transitions; used when scoring tone fit.
    pub fn injected_phrases(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sentence_starters
            .iter()
            .chain(self.transition_phrases.iter())
            .copied()
    }
}

static FORMAL: ToneProfile = ToneProfile {
    sentence_starters: &[
        "Furthermore,",
        "Moreover,",
        "Additionally,",
        "In addition,",
        "It should be emphasized that",
        "It is worth noting that",
        "Significantly,",
        "Notably,",
    ],
    transition_phrases: &[
        "However,",
        "Nevertheless,",
        "On the other hand,",
        "In contrast,",
        "Conversely,",
        "Despite this,",
    ],
    conclusion_phrases: &[
        "In conclusion,",
        "To summarize,",
        "Overall,",
        "In summary,",
        "Therefore,",
        "Thus,",
        "Hence,",
        "Consequently,",
        "As a result,",
    ],
};

static CASUAL: ToneProfile = ToneProfile {
    sentence_starters: &[
        "You know,",
        "Actually,",
        "Basically,",
        "Honestly,",
        "To be honest,",
        "I mean,",
        "Well,",
        "So,",
        "Like,",
        "Right,",
    ],
    transition_phrases: &[
        "But,",
        "Though,",
        "However,",
        "On the flip side,",
        "That said,",
        "At the same time,",
        "Still,",
        "Anyway,",
        "Plus,",
    ],
    conclusion_phrases: &[
        "So yeah,",
        "Basically,",
        "In the end,",
        "Overall,",
        "To wrap it up,",
        "Long story short,",
        "Bottom line,",
        "The thing is,",
    ],
};

static BALANCED: ToneProfile = ToneProfile {
    sentence_starters: &[
        "Additionally,",
        "Moreover,",
        "Furthermore,",
        "Also,",
        "Plus,",
        "What's more,",
        "Not only that,",
        "On top of that,",
    ],
    transition_phrases: &[
        "However,",
        "But,",
        "On the other hand,",
        "That said,",
        "Still,",
        "Nevertheless,",
        "At the same time,",
        "Meanwhile,",
    ],
    conclusion_phrases: &[
        "Overall,",
        "In conclusion,",
        "To summarize,",
        "So,",
        "Therefore,",
        "As a result,",
        "In the end,",
        "Finally,",
    ],
};

/// Injected only for casual tone.
pub const FILLER_WORDS: &[&str] = &[
    "um",
    "uh",
    "like",
    "you know",
    "basically",
    "actually",
    "honestly",
];

/// Appended as a trailing clause: "..., perhaps."
const FORMAL_HEDGES: &[&str] = &["perhaps", "possibly", "likely", "it seems"];
const INFORMAL_HEDGES: &[&str] = &["maybe", "probably", "kind of", "sort of"];

/// Fixed contractions folded for casual/balanced tone.
pub const CONTRACTIONS: &[(&str, &str)] = &[
    ("do not", "don't"),
    ("cannot", "can't"),
    ("will not", "won't"),
    ("is not", "isn't"),
    ("are not", "aren't"),
    ("does not", "doesn't"),
    ("did not", "didn't"),
    ("would not", "wouldn't"),
    ("could not", "couldn't"),
    ("should not", "shouldn't"),
];
