//! Prosody tree builder.
//!
//! Builds the per-utterance tree — breath groups, accent phrases, moras and
//! the emitted phoneme-unit sequence — in one pass over the analyzer's
//! phrase list. The tree is an arena: every level lives in a flat ordered
//! `Vec` on [`Utterance`], and children hold integer indices into the level
//! above instead of references. Because the arenas are ordered, every
//! neighbor/ancestor lookup the context calculator needs reduces to index
//! arithmetic, and the tree never has to change after construction.
//!
//! Unit sequence layout:
//!
//! ```text
//! sil  <phonemes of group 0>  pau  <phonemes of group 1>  pau  …  sil
//! ```
//!
//! One `pau` stands between consecutive breath groups; the two `sil` units
//! bound the utterance and are excluded from all counts.

use log::debug;

use crate::model::{AccentPhrase, LabelError, PAU, SIL};

// ─────────────────────────────────────────────────────────────────────────────
// Arena nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A maximal run of accent phrases pronounced on one breath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathGroup {
    /// First owned phrase in [`Utterance::phrases`].
    pub phrase_start: usize,
    /// One past the last owned phrase.
    pub phrase_end: usize,
    /// First owned mora in [`Utterance::moras`].
    pub mora_start: usize,
    /// One past the last owned mora.
    pub mora_end: usize,
}

impl BreathGroup {
    pub fn phrase_len(&self) -> usize {
        self.phrase_end - self.phrase_start
    }

    pub fn mora_len(&self) -> usize {
        self.mora_end - self.mora_start
    }
}

/// An accent phrase flattened into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhraseNode {
    /// Owning group in [`Utterance::groups`].
    pub group: usize,
    /// First owned mora in [`Utterance::moras`].
    pub mora_start: usize,
    /// One past the last owned mora.
    pub mora_end: usize,
    /// 1-indexed accent-fall mora.
    pub accent: usize,
    pub is_interrogative: bool,
    /// A pause boundary follows this phrase.
    pub pause_after: bool,
}

impl PhraseNode {
    pub fn mora_len(&self) -> usize {
        self.mora_end - self.mora_start
    }
}

/// A mora flattened into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoraNode {
    /// Owning phrase in [`Utterance::phrases`].
    pub phrase: usize,
}

/// Where an emitted unit sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Utterance-boundary silence (leading or trailing by position).
    Sil,
    /// Inter-group pause; owns nothing, references the phrases either side.
    Pau {
        prev_phrase: usize,
        next_phrase: usize,
    },
    /// Real phoneme belonging to a mora.
    Phoneme { mora: usize },
}

/// One emitted unit — one label position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeUnit {
    pub phoneme: String,
    pub kind: UnitKind,
}

// ─────────────────────────────────────────────────────────────────────────────
// Utterance
// ─────────────────────────────────────────────────────────────────────────────

/// The immutable utterance tree. Built once per synthesis request, queried
/// by the context calculator, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub groups: Vec<BreathGroup>,
    pub phrases: Vec<PhraseNode>,
    pub moras: Vec<MoraNode>,
    pub units: Vec<PhonemeUnit>,
}

impl Utterance {
    /// Build the tree from the analyzer's phrase list.
    ///
    /// The phrase list is cut into breath groups immediately after every
    /// phrase carrying a trailing-pause marker; a marker on the final
    /// phrase coincides with the utterance end and inserts no pause unit.
    ///
    /// Fails fast on any structural defect — no partial tree escapes.
    pub fn build(accent_phrases: &[AccentPhrase]) -> Result<Self, LabelError> {
        validate(accent_phrases)?;

        let mut groups = Vec::new();
        let mut phrases = Vec::with_capacity(accent_phrases.len());
        let mut moras = Vec::new();
        let mut units = Vec::new();

        units.push(PhonemeUnit {
            phoneme: SIL.to_string(),
            kind: UnitKind::Sil,
        });

        let mut group_phrase_start = 0;
        let mut group_mora_start = 0;
        for (index, phrase) in accent_phrases.iter().enumerate() {
            let phrase_index = phrases.len();
            let mora_start = moras.len();
            for mora in &phrase.moras {
                let mora_index = moras.len();
                moras.push(MoraNode {
                    phrase: phrase_index,
                });
                if let Some(consonant) = &mora.consonant {
                    units.push(PhonemeUnit {
                        phoneme: consonant.clone(),
                        kind: UnitKind::Phoneme { mora: mora_index },
                    });
                }
                units.push(PhonemeUnit {
                    phoneme: mora.vowel.clone(),
                    kind: UnitKind::Phoneme { mora: mora_index },
                });
            }
            phrases.push(PhraseNode {
                group: groups.len(),
                mora_start,
                mora_end: moras.len(),
                accent: phrase.accent,
                is_interrogative: phrase.is_interrogative,
                pause_after: phrase.pause_after,
            });

            let is_last = index + 1 == accent_phrases.len();
            if phrase.pause_after || is_last {
                groups.push(BreathGroup {
                    phrase_start: group_phrase_start,
                    phrase_end: phrases.len(),
                    mora_start: group_mora_start,
                    mora_end: moras.len(),
                });
                group_phrase_start = phrases.len();
                group_mora_start = moras.len();
                if phrase.pause_after && !is_last {
                    units.push(PhonemeUnit {
                        phoneme: PAU.to_string(),
                        kind: UnitKind::Pau {
                            prev_phrase: phrase_index,
                            next_phrase: phrase_index + 1,
                        },
                    });
                }
            }
        }

        units.push(PhonemeUnit {
            phoneme: SIL.to_string(),
            kind: UnitKind::Sil,
        });

        debug!(
            "built utterance tree: {} breath groups, {} accent phrases, {} moras, {} units",
            groups.len(),
            phrases.len(),
            moras.len(),
            units.len()
        );

        Ok(Self {
            groups,
            phrases,
            moras,
            units,
        })
    }
}

fn validate(accent_phrases: &[AccentPhrase]) -> Result<(), LabelError> {
    if accent_phrases.is_empty() {
        return Err(LabelError::EmptyUtterance);
    }
    for (index, phrase) in accent_phrases.iter().enumerate() {
        if phrase.moras.is_empty() {
            return Err(LabelError::EmptyAccentPhrase { index });
        }
        if phrase.accent < 1 || phrase.accent > phrase.moras.len() {
            return Err(LabelError::AccentOutOfRange {
                index,
                accent: phrase.accent,
                mora_len: phrase.moras.len(),
            });
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mora;

    fn phrase(moras: Vec<Mora>, accent: usize, pause_after: bool) -> AccentPhrase {
        AccentPhrase {
            moras,
            accent,
            is_interrogative: false,
            pause_after,
        }
    }

    fn phonemes(utterance: &Utterance) -> Vec<&str> {
        utterance.units.iter().map(|u| u.phoneme.as_str()).collect()
    }

    #[test]
    fn test_single_phrase_unit_sequence() {
        let utterance = Utterance::build(&[phrase(
            vec![Mora::new("k", "a"), Mora::vowel_only("i")],
            1,
            false,
        )])
        .unwrap();
        assert_eq!(phonemes(&utterance), vec!["sil", "k", "a", "i", "sil"]);
        assert_eq!(utterance.groups.len(), 1);
        assert_eq!(utterance.phrases.len(), 1);
        assert_eq!(utterance.moras.len(), 2);
    }

    #[test]
    fn test_pause_marker_cuts_group_and_inserts_pau() {
        let utterance = Utterance::build(&[
            phrase(vec![Mora::vowel_only("a")], 1, false),
            phrase(vec![Mora::vowel_only("i")], 1, true),
            phrase(vec![Mora::vowel_only("u")], 1, false),
        ])
        .unwrap();
        assert_eq!(phonemes(&utterance), vec!["sil", "a", "i", "pau", "u", "sil"]);
        assert_eq!(utterance.groups.len(), 2);
        assert_eq!(
            (utterance.groups[0].phrase_start, utterance.groups[0].phrase_end),
            (0, 2)
        );
        assert_eq!(
            (utterance.groups[1].phrase_start, utterance.groups[1].phrase_end),
            (2, 3)
        );
        let pau = &utterance.units[3];
        assert_eq!(
            pau.kind,
            UnitKind::Pau {
                prev_phrase: 1,
                next_phrase: 2
            }
        );
    }

    #[test]
    fn test_final_pause_marker_inserts_nothing() {
        let utterance =
            Utterance::build(&[phrase(vec![Mora::vowel_only("a")], 1, true)]).unwrap();
        assert_eq!(phonemes(&utterance), vec!["sil", "a", "sil"]);
        assert_eq!(utterance.groups.len(), 1);
    }

    #[test]
    fn test_no_pause_between_phrases_in_one_group() {
        let utterance = Utterance::build(&[
            phrase(vec![Mora::new("t", "a")], 1, false),
            phrase(vec![Mora::new("m", "a")], 1, false),
        ])
        .unwrap();
        assert_eq!(phonemes(&utterance), vec!["sil", "t", "a", "m", "a", "sil"]);
        assert_eq!(utterance.groups.len(), 1);
        assert_eq!(utterance.groups[0].phrase_len(), 2);
        assert_eq!(utterance.groups[0].mora_len(), 2);
    }

    #[test]
    fn test_mora_and_phrase_back_references() {
        let utterance = Utterance::build(&[
            phrase(vec![Mora::new("k", "a"), Mora::vowel_only("i")], 2, true),
            phrase(vec![Mora::vowel_only("u")], 1, false),
        ])
        .unwrap();
        assert_eq!(utterance.moras[0].phrase, 0);
        assert_eq!(utterance.moras[1].phrase, 0);
        assert_eq!(utterance.moras[2].phrase, 1);
        assert_eq!(utterance.phrases[0].group, 0);
        assert_eq!(utterance.phrases[1].group, 1);
        assert_eq!(utterance.phrases[1].mora_start, 2);
    }

    #[test]
    fn test_empty_utterance_rejected() {
        assert_eq!(Utterance::build(&[]), Err(LabelError::EmptyUtterance));
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let err = Utterance::build(&[
            phrase(vec![Mora::vowel_only("a")], 1, false),
            phrase(vec![], 1, false),
        ])
        .unwrap_err();
        assert_eq!(err, LabelError::EmptyAccentPhrase { index: 1 });
    }

    #[test]
    fn test_accent_out_of_range_rejected() {
        let err =
            Utterance::build(&[phrase(vec![Mora::vowel_only("a")], 0, false)]).unwrap_err();
        assert_eq!(
            err,
            LabelError::AccentOutOfRange {
                index: 0,
                accent: 0,
                mora_len: 1
            }
        );

        let err =
            Utterance::build(&[phrase(vec![Mora::vowel_only("a")], 2, false)]).unwrap_err();
        assert_eq!(
            err,
            LabelError::AccentOutOfRange {
                index: 0,
                accent: 2,
                mora_len: 1
            }
        );
    }
}
