//! Input records and the crate error type.
//!
//! The upstream prosody analyzer hands over an ordered list of
//! [`AccentPhrase`] records (typically as JSON); everything downstream —
//! breath-group partitioning, context computation, label serialization —
//! is derived from them. The records are plain owned data and carry no
//! behavior beyond a few counting helpers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reserved phoneme identity of the utterance-boundary silence.
pub const SIL: &str = "sil";

/// Reserved phoneme identity of the inter-group pause.
pub const PAU: &str = "pau";

/// Sentinel for a context field that is not applicable or unknown.
pub const XX: &str = "xx";

// ─────────────────────────────────────────────────────────────────────────────
// Input records
// ─────────────────────────────────────────────────────────────────────────────

/// Smallest prosodic unit: an optional consonant followed by a vowel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mora {
    /// Consonant phoneme symbol; absent for vowel-only moras.
    #[serde(default)]
    pub consonant: Option<String>,
    /// Vowel phoneme symbol (`N` and `cl` count as vowels here).
    pub vowel: String,
}

impl Mora {
    /// A consonant + vowel mora.
    pub fn new(consonant: impl Into<String>, vowel: impl Into<String>) -> Self {
        Self {
            consonant: Some(consonant.into()),
            vowel: vowel.into(),
        }
    }

    /// A vowel-only mora.
    pub fn vowel_only(vowel: impl Into<String>) -> Self {
        Self {
            consonant: None,
            vowel: vowel.into(),
        }
    }

    /// Number of phonemes this mora emits (1 or 2).
    pub fn phoneme_len(&self) -> usize {
        if self.consonant.is_some() {
            2
        } else {
            1
        }
    }
}

/// One pitch-accent unit: an ordered run of moras sharing a single
/// accent-fall position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentPhrase {
    pub moras: Vec<Mora>,
    /// 1-indexed mora at which pitch falls. Must lie in `1..=moras.len()`.
    pub accent: usize,
    /// Question intonation.
    #[serde(default)]
    pub is_interrogative: bool,
    /// A breath boundary (audible pause) follows this phrase.
    #[serde(default)]
    pub pause_after: bool,
}

impl AccentPhrase {
    pub fn mora_len(&self) -> usize {
        self.moras.len()
    }

    /// Total phonemes emitted by this phrase's moras.
    pub fn phoneme_len(&self) -> usize {
        self.moras.iter().map(Mora::phoneme_len).sum()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Everything that can go wrong between accent phrases and label lines.
///
/// Structural-validity variants are caught at tree-build time, before any
/// label is produced; the schema variants signal an internal defect in a
/// computed field set and are never silently defaulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("utterance contains no accent phrases")]
    EmptyUtterance,

    #[error("accent phrase {index} has no moras")]
    EmptyAccentPhrase { index: usize },

    /// The accent position must land on a mora of its own phrase. All
    /// downstream position arithmetic depends on this, so the input is
    /// rejected rather than clamped.
    #[error("accent phrase {index}: accent {accent} outside 1..={mora_len}")]
    AccentOutOfRange {
        index: usize,
        accent: usize,
        mora_len: usize,
    },

    /// A computed field set is missing a required key.
    #[error("context label is missing field `{0}`")]
    MissingField(&'static str),

    /// A line handed to the parser does not match the label grammar.
    #[error("not a valid full-context label: {0:?}")]
    InvalidLabel(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
