//! Context feature calculator.
//!
//! Pure functions over the utterance arena: for every emitted unit, the 49
//! context fields of the quinphone label schema. All lookups are index
//! arithmetic over [`Utterance`]'s flat ordered arenas — no state, no
//! mutation, no partial results.
//!
//! Field groups and their saturating ceilings:
//!
//! | Group | Meaning                                   | Ceiling |
//! |-------|-------------------------------------------|---------|
//! | p1–p5 | phoneme identity window (two either side) | —       |
//! | a1–a3 | mora position relative to the accent fall | 49 (a1 also −49) |
//! | e/f/g | previous / current / next accent phrase   | 49 (99 for f7/f8) |
//! | h/i/j | previous / current / next breath group    | 19/49/99/199 |
//! | k1–k3 | utterance totals, constant per utterance  | 19/49/199 |
//! | b/c/d | reserved (higher-level syntax), always xx | —       |
//!
//! Counts saturate at their ceiling instead of overflowing: the consuming
//! model's feature vocabulary is categorical and finite, so values past
//! the ceiling carry no information. Positions are 1-indexed in output.
//!
//! Boundary policy: the two silences get `xx` for everything describing
//! "current" membership but expose the adjacent phrase/group on their open
//! side (`g`/`j` on the leading one, `e`/`h` on the trailing one). Pause
//! units do the same in both directions. `k1`–`k3` appear on every unit.

use crate::label::ContextLabel;
use crate::model::XX;
use crate::tree::{UnitKind, Utterance};

/// Ceiling for breath-group positions and the group total (`i3`, `i4`, `k1`).
const MAX_GROUPS: usize = 19;
/// Ceiling for accent-phrase counts, positions and accents.
const MAX_PHRASES: usize = 49;
/// Ceiling for mora counts within one breath group (`f7`, `f8`, `h2`, `i2`, `j2`).
const MAX_GROUP_MORAS: usize = 99;
/// Ceiling for utterance-wide mora counts (`i7`, `i8`, `k3`).
const MAX_MORAS: usize = 199;

fn sat(value: usize, ceiling: usize) -> String {
    value.min(ceiling).to_string()
}

fn sat_signed(value: isize, ceiling: isize) -> String {
    value.clamp(-ceiling, ceiling).to_string()
}

fn flag(value: bool) -> String {
    u8::from(value).to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Compute the full label sequence for a built utterance, one
/// [`ContextLabel`] per emitted unit, in order.
pub fn label_sequence(utterance: &Utterance) -> Vec<ContextLabel> {
    let mut labels: Vec<ContextLabel> = (0..utterance.units.len())
        .map(|index| unit_contexts(utterance, index))
        .collect();
    phoneme_window_pass(&mut labels);
    labels
}

fn unit_contexts(utterance: &Utterance, index: usize) -> ContextLabel {
    let mut label = ContextLabel::new();

    // Reserved groups and the unused e4/f4/g4 slots.
    for key in [
        "b1", "b2", "b3", "c1", "c2", "c3", "d1", "d2", "d3", "e4", "f4", "g4",
    ] {
        label.set(key, XX);
    }

    // Utterance totals — identical on every label of the sequence.
    label.set("k1", sat(utterance.groups.len(), MAX_GROUPS));
    label.set("k2", sat(utterance.phrases.len(), MAX_PHRASES));
    label.set("k3", sat(utterance.moras.len(), MAX_MORAS));

    match utterance.units[index].kind {
        UnitKind::Sil => sil_contexts(utterance, index, &mut label),
        UnitKind::Pau {
            prev_phrase,
            next_phrase,
        } => pau_contexts(utterance, prev_phrase, next_phrase, &mut label),
        UnitKind::Phoneme { mora } => phoneme_contexts(utterance, mora, &mut label),
    }

    label.set("p3", utterance.units[index].phoneme.clone());
    label
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-kind field computation
// ─────────────────────────────────────────────────────────────────────────────

/// Clamped (mora count, accent, interrogative) of one phrase — the triple
/// shared by the e, f and g groups.
fn phrase_stats(utterance: &Utterance, phrase: usize) -> (String, String, String) {
    let node = &utterance.phrases[phrase];
    (
        sat(node.mora_len(), MAX_PHRASES),
        sat(node.accent, MAX_PHRASES),
        flag(node.is_interrogative),
    )
}

/// Clamped (phrase count, mora count) of one group — the pair shared by
/// the h, i and j groups.
fn group_counts(utterance: &Utterance, group: usize) -> (String, String) {
    let node = &utterance.groups[group];
    (
        sat(node.phrase_len(), MAX_PHRASES),
        sat(node.mora_len(), MAX_GROUP_MORAS),
    )
}

fn set_all(label: &mut ContextLabel, keys: &[&'static str], value: &str) {
    for &key in keys {
        label.set(key, value);
    }
}

fn set_phrase_stats(label: &mut ContextLabel, keys: [&'static str; 3], stats: (String, String, String)) {
    label.set(keys[0], stats.0);
    label.set(keys[1], stats.1);
    label.set(keys[2], stats.2);
}

const A_KEYS: [&str; 3] = ["a1", "a2", "a3"];
const F_KEYS: [&str; 8] = ["f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8"];
const I_KEYS: [&str; 8] = ["i1", "i2", "i3", "i4", "i5", "i6", "i7", "i8"];

/// Boundary silence. The leading one (index 0) exposes the first phrase
/// and group through `g`/`j`; the trailing one exposes the last phrase and
/// group through `e`/`h`.
fn sil_contexts(utterance: &Utterance, index: usize, label: &mut ContextLabel) {
    set_all(label, &A_KEYS, XX);
    set_all(label, &F_KEYS, XX);
    set_all(label, &I_KEYS, XX);
    label.set("e5", XX);
    label.set("g5", XX);

    let leading = index == 0;
    if leading {
        set_all(label, &["e1", "e2", "e3"], XX);
        set_phrase_stats(label, ["g1", "g2", "g3"], phrase_stats(utterance, 0));
        set_all(label, &["h1", "h2"], XX);
        let (j1, j2) = group_counts(utterance, 0);
        label.set("j1", j1);
        label.set("j2", j2);
    } else {
        let last_phrase = utterance.phrases.len() - 1;
        let last_group = utterance.groups.len() - 1;
        set_phrase_stats(label, ["e1", "e2", "e3"], phrase_stats(utterance, last_phrase));
        set_all(label, &["g1", "g2", "g3"], XX);
        let (h1, h2) = group_counts(utterance, last_group);
        label.set("h1", h1);
        label.set("h2", h2);
        set_all(label, &["j1", "j2"], XX);
    }
}

/// Inter-group pause: no membership of its own, neighbors on both sides.
fn pau_contexts(
    utterance: &Utterance,
    prev_phrase: usize,
    next_phrase: usize,
    label: &mut ContextLabel,
) {
    set_all(label, &A_KEYS, XX);
    set_all(label, &F_KEYS, XX);
    set_all(label, &I_KEYS, XX);
    label.set("e5", XX);
    label.set("g5", XX);

    set_phrase_stats(label, ["e1", "e2", "e3"], phrase_stats(utterance, prev_phrase));
    set_phrase_stats(label, ["g1", "g2", "g3"], phrase_stats(utterance, next_phrase));

    let (h1, h2) = group_counts(utterance, utterance.phrases[prev_phrase].group);
    label.set("h1", h1);
    label.set("h2", h2);
    let (j1, j2) = group_counts(utterance, utterance.phrases[next_phrase].group);
    label.set("j1", j1);
    label.set("j2", j2);
}

/// Real phoneme: the full field set.
fn phoneme_contexts(utterance: &Utterance, mora: usize, label: &mut ContextLabel) {
    let phrase_index = utterance.moras[mora].phrase;
    let phrase = &utterance.phrases[phrase_index];
    let group_index = phrase.group;
    let group = &utterance.groups[group_index];

    // a: mora position relative to the accent fall, 0 at the nucleus.
    let pos = mora - phrase.mora_start;
    label.set(
        "a1",
        sat_signed(pos as isize + 1 - phrase.accent as isize, MAX_PHRASES as isize),
    );
    label.set("a2", sat(pos + 1, MAX_PHRASES));
    label.set("a3", sat(phrase.mora_len() - pos, MAX_PHRASES));

    // e: previous phrase, utterance-wide (lookups cross pause boundaries).
    if phrase_index > 0 {
        set_phrase_stats(
            label,
            ["e1", "e2", "e3"],
            phrase_stats(utterance, phrase_index - 1),
        );
        label.set("e5", flag(utterance.phrases[phrase_index - 1].pause_after));
    } else {
        set_all(label, &["e1", "e2", "e3", "e5"], XX);
    }

    // f: the phrase this phoneme belongs to.
    set_phrase_stats(label, ["f1", "f2", "f3"], phrase_stats(utterance, phrase_index));
    let phrase_in_group = phrase_index - group.phrase_start;
    label.set("f5", sat(phrase_in_group + 1, MAX_PHRASES));
    label.set("f6", sat(group.phrase_len() - phrase_in_group, MAX_PHRASES));
    label.set(
        "f7",
        sat(phrase.mora_start - group.mora_start + 1, MAX_GROUP_MORAS),
    );
    label.set("f8", sat(group.mora_end - phrase.mora_start, MAX_GROUP_MORAS));

    // g: next phrase, utterance-wide.
    if phrase_index + 1 < utterance.phrases.len() {
        set_phrase_stats(
            label,
            ["g1", "g2", "g3"],
            phrase_stats(utterance, phrase_index + 1),
        );
        label.set("g5", flag(phrase.pause_after));
    } else {
        set_all(label, &["g1", "g2", "g3", "g5"], XX);
    }

    // h: previous breath group.
    if group_index > 0 {
        let (h1, h2) = group_counts(utterance, group_index - 1);
        label.set("h1", h1);
        label.set("h2", h2);
    } else {
        set_all(label, &["h1", "h2"], XX);
    }

    // i: the breath group this phoneme belongs to. Positions by group,
    // by phrase and by mora all fall out of the arena offsets.
    label.set("i1", sat(group.phrase_len(), MAX_PHRASES));
    label.set("i2", sat(group.mora_len(), MAX_GROUP_MORAS));
    label.set("i3", sat(group_index + 1, MAX_GROUPS));
    label.set("i4", sat(utterance.groups.len() - group_index, MAX_GROUPS));
    label.set("i5", sat(group.phrase_start + 1, MAX_PHRASES));
    label.set("i6", sat(utterance.phrases.len() - group.phrase_start, MAX_PHRASES));
    label.set("i7", sat(group.mora_start + 1, MAX_MORAS));
    label.set("i8", sat(utterance.moras.len() - group.mora_start, MAX_MORAS));

    // j: next breath group.
    if group_index + 1 < utterance.groups.len() {
        let (j1, j2) = group_counts(utterance, group_index + 1);
        label.set("j1", j1);
        label.set("j2", j2);
    } else {
        set_all(label, &["j1", "j2"], XX);
    }
}

/// Back-fill the phoneme identity window (`p1`/`p2`/`p4`/`p5`) once all
/// `p3` slots exist; `xx` outside the sequence bounds.
fn phoneme_window_pass(labels: &mut [ContextLabel]) {
    let identities: Vec<String> = labels
        .iter()
        .map(|label| label.phoneme().unwrap_or(XX).to_string())
        .collect();
    let len = identities.len() as isize;
    for (index, label) in labels.iter_mut().enumerate() {
        let window = |shift: isize| -> &str {
            let neighbor = index as isize + shift;
            if neighbor < 0 || neighbor >= len {
                XX
            } else {
                &identities[neighbor as usize]
            }
        };
        label.set("p1", window(-2));
        label.set("p2", window(-1));
        label.set("p4", window(1));
        label.set("p5", window(2));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccentPhrase, Mora};

    fn phrase(moras: Vec<Mora>, accent: usize) -> AccentPhrase {
        AccentPhrase {
            moras,
            accent,
            is_interrogative: false,
            pause_after: false,
        }
    }

    fn labels_for(phrases: &[AccentPhrase]) -> Vec<ContextLabel> {
        label_sequence(&Utterance::build(phrases).unwrap())
    }

    fn field<'a>(labels: &'a [ContextLabel], index: usize, key: &str) -> &'a str {
        labels[index].get(key).unwrap()
    }

    /// One group, one phrase, moras [("k","a"), (-, "i")], accent on the
    /// first mora.
    #[test]
    fn test_single_phrase_scenario() {
        let labels = labels_for(&[phrase(
            vec![Mora::new("k", "a"), Mora::vowel_only("i")],
            1,
        )]);
        let sequence: Vec<&str> = labels.iter().map(|l| l.phoneme().unwrap()).collect();
        assert_eq!(sequence, vec!["sil", "k", "a", "i", "sil"]);

        // a1: 0 at the nucleus mora, 1 one mora past it.
        assert_eq!(field(&labels, 1, "a1"), "0");
        assert_eq!(field(&labels, 2, "a1"), "0");
        assert_eq!(field(&labels, 3, "a1"), "1");
        assert_eq!(field(&labels, 2, "a2"), "1");
        assert_eq!(field(&labels, 3, "a2"), "2");
        assert_eq!(field(&labels, 2, "a3"), "2");
        assert_eq!(field(&labels, 3, "a3"), "1");

        for index in [1, 2, 3] {
            assert_eq!(field(&labels, index, "f1"), "2");
            assert_eq!(field(&labels, index, "f2"), "1");
            assert_eq!(field(&labels, index, "f3"), "0");
        }
        for index in 0..labels.len() {
            assert_eq!(field(&labels, index, "k1"), "1");
            assert_eq!(field(&labels, index, "k2"), "1");
            assert_eq!(field(&labels, index, "k3"), "2");
        }
    }

    #[test]
    fn test_phoneme_window() {
        let labels = labels_for(&[phrase(
            vec![Mora::new("k", "a"), Mora::vowel_only("i")],
            1,
        )]);
        // leading sil
        assert_eq!(field(&labels, 0, "p1"), "xx");
        assert_eq!(field(&labels, 0, "p2"), "xx");
        assert_eq!(field(&labels, 0, "p4"), "k");
        assert_eq!(field(&labels, 0, "p5"), "a");
        // "a" in the middle
        assert_eq!(field(&labels, 2, "p1"), "sil");
        assert_eq!(field(&labels, 2, "p2"), "k");
        assert_eq!(field(&labels, 2, "p4"), "i");
        assert_eq!(field(&labels, 2, "p5"), "sil");
        // trailing sil
        assert_eq!(field(&labels, 4, "p4"), "xx");
        assert_eq!(field(&labels, 4, "p5"), "xx");
    }

    #[test]
    fn test_boundary_silences_expose_one_side() {
        let labels = labels_for(&[AccentPhrase {
            moras: vec![Mora::new("k", "a"), Mora::vowel_only("i")],
            accent: 1,
            is_interrogative: true,
            pause_after: false,
        }]);
        let leading = &labels[0];
        assert_eq!(leading.get("g1"), Some("2"));
        assert_eq!(leading.get("g2"), Some("1"));
        assert_eq!(leading.get("g3"), Some("1"));
        assert_eq!(leading.get("j1"), Some("1"));
        assert_eq!(leading.get("j2"), Some("2"));
        for key in ["a1", "e1", "e5", "f1", "f5", "g5", "h1", "h2", "i1", "i3"] {
            assert_eq!(leading.get(key), Some("xx"), "leading sil {}", key);
        }

        let trailing = labels.last().unwrap();
        assert_eq!(trailing.get("e1"), Some("2"));
        assert_eq!(trailing.get("e2"), Some("1"));
        assert_eq!(trailing.get("e3"), Some("1"));
        assert_eq!(trailing.get("h1"), Some("1"));
        assert_eq!(trailing.get("h2"), Some("2"));
        for key in ["a1", "e5", "f1", "g1", "g5", "i1", "j1", "j2"] {
            assert_eq!(trailing.get(key), Some("xx"), "trailing sil {}", key);
        }
    }

    /// Two phrases in one breath group: no pause unit, e/f/g shift across
    /// the phrase boundary.
    #[test]
    fn test_adjacent_phrases_share_a_group() {
        let labels = labels_for(&[
            phrase(vec![Mora::new("t", "a"), Mora::vowel_only("i")], 2),
            phrase(vec![Mora::new("m", "a")], 1),
        ]);
        let sequence: Vec<&str> = labels.iter().map(|l| l.phoneme().unwrap()).collect();
        assert_eq!(sequence, vec!["sil", "t", "a", "i", "m", "a", "sil"]);

        // phrase 0 phonemes: no previous phrase, next is ("m","a").
        assert_eq!(field(&labels, 1, "e1"), "xx");
        assert_eq!(field(&labels, 1, "g1"), "1");
        assert_eq!(field(&labels, 1, "g2"), "1");
        assert_eq!(field(&labels, 1, "g5"), "0");
        assert_eq!(field(&labels, 1, "f5"), "1");
        assert_eq!(field(&labels, 1, "f6"), "2");
        assert_eq!(field(&labels, 1, "f7"), "1");
        assert_eq!(field(&labels, 1, "f8"), "3");

        // phrase 1 phonemes: previous is the 2-mora phrase, no next.
        assert_eq!(field(&labels, 4, "e1"), "2");
        assert_eq!(field(&labels, 4, "e2"), "2");
        assert_eq!(field(&labels, 4, "e5"), "0");
        assert_eq!(field(&labels, 4, "g1"), "xx");
        assert_eq!(field(&labels, 4, "f5"), "2");
        assert_eq!(field(&labels, 4, "f6"), "1");
        assert_eq!(field(&labels, 4, "f7"), "3");
        assert_eq!(field(&labels, 4, "f8"), "1");

        // one group spanning everything
        assert_eq!(field(&labels, 1, "i1"), "2");
        assert_eq!(field(&labels, 1, "i2"), "3");
        assert_eq!(field(&labels, 4, "i3"), "1");
        assert_eq!(field(&labels, 4, "i4"), "1");
    }

    /// Trailing-pause marker: pau unit between the groups, membership xx,
    /// neighbors populated on both sides.
    #[test]
    fn test_pause_unit_fields() {
        let labels = labels_for(&[
            AccentPhrase {
                moras: vec![Mora::new("k", "a"), Mora::vowel_only("i")],
                accent: 2,
                is_interrogative: false,
                pause_after: true,
            },
            phrase(vec![Mora::new("m", "a"), Mora::vowel_only("e")], 1),
        ]);
        let sequence: Vec<&str> = labels.iter().map(|l| l.phoneme().unwrap()).collect();
        assert_eq!(sequence, vec!["sil", "k", "a", "i", "pau", "m", "a", "e", "sil"]);

        let pau = &labels[4];
        for key in ["a1", "a2", "a3", "e5", "f1", "f5", "g5", "i1", "i3", "i7"] {
            assert_eq!(pau.get(key), Some("xx"), "pau {}", key);
        }
        assert_eq!(pau.get("e1"), Some("2"));
        assert_eq!(pau.get("e2"), Some("2"));
        assert_eq!(pau.get("g1"), Some("2"));
        assert_eq!(pau.get("g2"), Some("1"));
        assert_eq!(pau.get("h1"), Some("1"));
        assert_eq!(pau.get("h2"), Some("2"));
        assert_eq!(pau.get("j1"), Some("1"));
        assert_eq!(pau.get("j2"), Some("2"));

        // e5/g5 on the real phonemes either side of the pause.
        assert_eq!(field(&labels, 1, "g5"), "1");
        assert_eq!(field(&labels, 5, "e5"), "1");

        // group-level h/j across the pause.
        assert_eq!(field(&labels, 5, "h1"), "1");
        assert_eq!(field(&labels, 5, "h2"), "2");
        assert_eq!(field(&labels, 1, "j1"), "1");
        assert_eq!(field(&labels, 1, "j2"), "2");
        assert_eq!(field(&labels, 1, "i3"), "1");
        assert_eq!(field(&labels, 5, "i3"), "2");
        assert_eq!(field(&labels, 5, "i7"), "3");
    }

    /// Values past a ceiling saturate instead of overflowing.
    #[test]
    fn test_saturation_at_ceilings() {
        // One 60-mora phrase: a/f ceilings.
        let big = phrase(
            (0..60).map(|_| Mora::vowel_only("a")).collect(),
            1,
        );
        let labels = labels_for(&[big]);
        let last = labels.len() - 2; // final "a" before trailing sil
        assert_eq!(field(&labels, last, "a1"), "49");
        assert_eq!(field(&labels, last, "a2"), "49");
        assert_eq!(field(&labels, 1, "a3"), "49");
        assert_eq!(field(&labels, 1, "f1"), "49");

        // Accent on the last mora: a1 floors at -49.
        let late_accent = phrase((0..60).map(|_| Mora::vowel_only("a")).collect(), 60);
        let labels = labels_for(&[late_accent]);
        assert_eq!(field(&labels, 1, "a1"), "-49");

        // 110 two-mora phrases in one group: phrase/mora count ceilings.
        let many: Vec<AccentPhrase> = (0..110)
            .map(|_| phrase(vec![Mora::vowel_only("a"), Mora::vowel_only("i")], 1))
            .collect();
        let labels = labels_for(&many);
        assert_eq!(field(&labels, 1, "k2"), "49");
        assert_eq!(field(&labels, 1, "k3"), "199");
        assert_eq!(field(&labels, 1, "i1"), "49");
        assert_eq!(field(&labels, 1, "i2"), "99");
        assert_eq!(field(&labels, 1, "i8"), "199");
        let last = labels.len() - 2;
        assert_eq!(field(&labels, last, "f5"), "49");
        assert_eq!(field(&labels, last, "f7"), "99");

        // 25 single-phrase groups: group-count ceilings.
        let grouped: Vec<AccentPhrase> = (0..25)
            .map(|_| AccentPhrase {
                moras: vec![Mora::vowel_only("a")],
                accent: 1,
                is_interrogative: false,
                pause_after: true,
            })
            .collect();
        let labels = labels_for(&grouped);
        assert_eq!(field(&labels, 1, "k1"), "19");
        assert_eq!(field(&labels, 1, "i4"), "19");
        let last = labels.len() - 2;
        assert_eq!(field(&labels, last, "i3"), "19");
    }

    /// k1/k2/k3 are identical on every label of the utterance.
    #[test]
    fn test_utterance_totals_constant() {
        let labels = labels_for(&[
            AccentPhrase {
                moras: vec![Mora::new("k", "o"), Mora::vowel_only("N")],
                accent: 1,
                is_interrogative: false,
                pause_after: true,
            },
            phrase(vec![Mora::new("n", "i"), Mora::new("ch", "i"), Mora::new("w", "a")], 3),
        ]);
        for label in &labels {
            assert_eq!(label.get("k1"), Some("2"));
            assert_eq!(label.get("k2"), Some("2"));
            assert_eq!(label.get("k3"), Some("5"));
        }
    }
}
