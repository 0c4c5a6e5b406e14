//! # fullcontext-label
//!
//! Synthesis of HTS full-context phoneme labels from Japanese
//! accent-phrase prosody. Given the analyzer's ordered accent-phrase
//! records, the crate produces one canonical label line per phoneme unit —
//! boundary silences and inter-group pauses included — ready for an
//! HTS-style statistical synthesizer.
//!
//! ## Pipeline
//!
//! 1. **Tree build** ([`tree`]) — breath groups, accent phrases, moras and
//!    the emitted unit sequence, stored as flat index-linked arenas;
//!    structural validation happens here and nothing partial escapes.
//! 2. **Context computation** ([`context`]) — the 49 context fields per
//!    unit, as pure functions over the arena indices, with per-field
//!    saturating ceilings.
//! 3. **Serialization** ([`label`]) — the quinphone label grammar,
//!    rendering and parsing.
//!
//! A second, independently derived single-pass implementation lives in
//! [`oracle`]; the crate tests byte-compare the two over a corpus of
//! utterances, which is the primary correctness check for the contextual
//! math.
//!
//! ## Quick start
//!
//! ```
//! use fullcontext_label::{full_context_labels, AccentPhrase, Mora};
//!
//! let phrases = vec![AccentPhrase {
//!     moras: vec![Mora::new("k", "a"), Mora::vowel_only("i")],
//!     accent: 1,
//!     is_interrogative: false,
//!     pause_after: false,
//! }];
//! let labels = full_context_labels(&phrases).unwrap();
//! assert_eq!(labels.len(), 5); // sil k a i sil
//! assert!(labels[0].starts_with("xx^xx-sil+k=a"));
//! ```
//!
//! The whole pipeline is pure and synchronous: no I/O, no shared state,
//! one immutable tree per request. Concurrent requests just run it
//! independently.

pub mod context;
pub mod label;
pub mod model;
pub mod oracle;
pub mod tree;

// ─── Re-exports for convenience ─────────────────────────────────────────────

pub use label::ContextLabel;
pub use model::{AccentPhrase, LabelError, Mora};
pub use tree::Utterance;

/// Run the full pipeline: build the prosody tree, compute every unit's
/// context fields, render the canonical label lines.
pub fn full_context_labels(accent_phrases: &[AccentPhrase]) -> Result<Vec<String>, LabelError> {
    let utterance = Utterance::build(accent_phrases)?;
    context::label_sequence(&utterance)
        .iter()
        .map(ContextLabel::render)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Cross-implementation and whole-pipeline tests
// ─────────────────────────────────────────────────────────────────────────────
