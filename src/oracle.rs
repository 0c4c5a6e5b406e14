//! Independent single-pass label generator.
//!
//! A second, deliberately different implementation of the label semantics:
//! instead of building a tree and querying it, this path precomputes a flat
//! layout of the phrase list (group ids, offsets, clamped context
//! fragments), then assembles every label line in one pass and back-fills
//! the phoneme window at the end. The arena implementation is byte-compared
//! against this one over a corpus of utterances in the crate tests; the
//! contextual math has no simpler closed-form check, so agreement between
//! the two paths is the primary correctness oracle.
//!
//! Nothing here touches the tree or calculator modules — only the shared
//! input records and error type.

use crate::model::{AccentPhrase, LabelError, PAU, SIL, XX};

/// Reserved groups B/C/D — constant on every label.
const RESERVED: &str = "/B:xx-xx_xx/C:xx_xx+xx/D:xx+xx_xx";

fn sat(value: usize, ceiling: usize) -> String {
    value.min(ceiling).to_string()
}

fn flag(value: bool) -> String {
    u8::from(value).to_string()
}

fn xx3() -> [String; 3] {
    [XX.to_string(), XX.to_string(), XX.to_string()]
}

fn xx2() -> [String; 2] {
    [XX.to_string(), XX.to_string()]
}

/// Generate the canonical label sequence for an utterance.
pub fn full_context_labels(accent_phrases: &[AccentPhrase]) -> Result<Vec<String>, LabelError> {
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

    let layout = Layout::of(accent_phrases);

    // One (phoneme, tail) pair per emitted unit; the tail is everything
    // after the phoneme-window head and depends only on the unit itself.
    let mut items: Vec<(String, String)> = Vec::new();
    items.push((SIL.to_string(), layout.leading_sil_tail()));
    for (index, phrase) in accent_phrases.iter().enumerate() {
        for (offset, mora) in phrase.moras.iter().enumerate() {
            let tail = layout.phoneme_tail(accent_phrases, index, offset);
            if let Some(consonant) = &mora.consonant {
                items.push((consonant.clone(), tail.clone()));
            }
            items.push((mora.vowel.clone(), tail));
        }
        if phrase.pause_after && index + 1 < accent_phrases.len() {
            items.push((PAU.to_string(), layout.pau_tail(index)));
        }
    }
    items.push((SIL.to_string(), layout.trailing_sil_tail()));

    // Phoneme-window head, then the final lines.
    let lines = items
        .iter()
        .enumerate()
        .map(|(index, (phoneme, tail))| {
            let window = |shift: isize| -> &str {
                if index as isize + shift < 0 {
                    return XX;
                }
                match items.get((index as isize + shift) as usize) {
                    Some((neighbor, _)) => neighbor.as_str(),
                    None => XX,
                }
            };
            format!(
                "{}^{}-{}+{}={}{}",
                window(-2),
                window(-1),
                phoneme,
                window(1),
                window(2),
                tail
            )
        })
        .collect();
    Ok(lines)
}

// ─────────────────────────────────────────────────────────────────────────────
// Flat layout
// ─────────────────────────────────────────────────────────────────────────────

/// Precomputed flat view of the phrase list: group membership, offsets,
/// and the clamped fragments shared by several field groups.
struct Layout {
    group_of: Vec<usize>,
    group_phrase_len: Vec<usize>,
    group_first_phrase: Vec<usize>,
    group_first_mora: Vec<usize>,
    phrase_first_mora: Vec<usize>,
    /// Per phrase: clamped (mora count, accent, interrogative flag).
    phrase_stats: Vec<[String; 3]>,
    /// Per group: clamped (phrase count, mora count).
    group_counts: Vec<[String; 2]>,
    phrase_total: usize,
    group_total: usize,
    mora_total: usize,
    /// `/K:` fragment — constant across the utterance.
    k_tail: String,
}

impl Layout {
    fn of(accent_phrases: &[AccentPhrase]) -> Self {
        let phrase_total = accent_phrases.len();

        // A new group starts after every trailing-pause marker except one
        // on the final phrase.
        let mut group_of = Vec::with_capacity(phrase_total);
        let mut group_id = 0;
        for (index, phrase) in accent_phrases.iter().enumerate() {
            group_of.push(group_id);
            if phrase.pause_after && index + 1 < phrase_total {
                group_id += 1;
            }
        }
        let group_total = group_id + 1;

        let mut group_phrase_len = vec![0usize; group_total];
        let mut group_mora_len = vec![0usize; group_total];
        let mut group_first_phrase = vec![usize::MAX; group_total];
        let mut group_first_mora = vec![0usize; group_total];
        let mut phrase_first_mora = Vec::with_capacity(phrase_total);
        let mut mora_total = 0usize;
        for (index, phrase) in accent_phrases.iter().enumerate() {
            let group = group_of[index];
            if group_first_phrase[group] == usize::MAX {
                group_first_phrase[group] = index;
                group_first_mora[group] = mora_total;
            }
            group_phrase_len[group] += 1;
            group_mora_len[group] += phrase.mora_len();
            phrase_first_mora.push(mora_total);
            mora_total += phrase.mora_len();
        }

        let phrase_stats = accent_phrases
            .iter()
            .map(|phrase| {
                [
                    sat(phrase.mora_len(), 49),
                    sat(phrase.accent, 49),
                    flag(phrase.is_interrogative),
                ]
            })
            .collect();
        let group_counts = (0..group_total)
            .map(|group| {
                [
                    sat(group_phrase_len[group], 49),
                    sat(group_mora_len[group], 99),
                ]
            })
            .collect();

        let k_tail = format!(
            "/K:{}+{}-{}",
            sat(group_total, 19),
            sat(phrase_total, 49),
            sat(mora_total, 199)
        );

        Self {
            group_of,
            group_phrase_len,
            group_first_phrase,
            group_first_mora,
            phrase_first_mora,
            phrase_stats,
            group_counts,
            phrase_total,
            group_total,
            mora_total,
            k_tail,
        }
    }

    /// A tail with no membership of its own: the e/h side from `prev`, the
    /// g/j side from `next`, everything else xx. Covers both silences and
    /// the pause unit.
    fn detached_tail(
        &self,
        prev: Option<(&[String; 3], &[String; 2])>,
        next: Option<(&[String; 3], &[String; 2])>,
    ) -> String {
        let no_phrase = xx3();
        let no_group = xx2();
        let (e, h) = prev.unwrap_or((&no_phrase, &no_group));
        let (g, j) = next.unwrap_or((&no_phrase, &no_group));
        format!(
            "/A:xx+xx+xx{RESERVED}\
             /E:{}_{}!{}_xx-xx\
             /F:xx_xx#xx_xx@xx_xx|xx_xx\
             /G:{}_{}%{}_xx_xx\
             /H:{}_{}\
             /I:xx-xx@xx+xx&xx-xx|xx+xx\
             /J:{}_{}{}",
            e[0], e[1], e[2], g[0], g[1], g[2], h[0], h[1], j[0], j[1], self.k_tail,
        )
    }

    fn leading_sil_tail(&self) -> String {
        self.detached_tail(None, Some((&self.phrase_stats[0], &self.group_counts[0])))
    }

    fn trailing_sil_tail(&self) -> String {
        self.detached_tail(
            Some((
                &self.phrase_stats[self.phrase_total - 1],
                &self.group_counts[self.group_total - 1],
            )),
            None,
        )
    }

    /// Tail of the pause standing after phrase `index`.
    fn pau_tail(&self, index: usize) -> String {
        self.detached_tail(
            Some((
                &self.phrase_stats[index],
                &self.group_counts[self.group_of[index]],
            )),
            Some((
                &self.phrase_stats[index + 1],
                &self.group_counts[self.group_of[index + 1]],
            )),
        )
    }

    /// Tail of a real phoneme: the full a/e/f/g/h/i/j field set for the
    /// mora at `offset` inside phrase `index`.
    fn phoneme_tail(&self, accent_phrases: &[AccentPhrase], index: usize, offset: usize) -> String {
        let phrase = &accent_phrases[index];
        let group = self.group_of[index];

        let a1 = (offset as isize + 1 - phrase.accent as isize)
            .clamp(-49, 49)
            .to_string();
        let a2 = sat(offset + 1, 49);
        let a3 = sat(phrase.mora_len() - offset, 49);

        let (e, e5) = if index > 0 {
            (
                self.phrase_stats[index - 1].clone(),
                flag(accent_phrases[index - 1].pause_after),
            )
        } else {
            (xx3(), XX.to_string())
        };
        let (g, g5) = if index + 1 < self.phrase_total {
            (self.phrase_stats[index + 1].clone(), flag(phrase.pause_after))
        } else {
            (xx3(), XX.to_string())
        };

        let f = &self.phrase_stats[index];
        let phrase_in_group = index - self.group_first_phrase[group];
        let f5 = sat(phrase_in_group + 1, 49);
        let f6 = sat(self.group_phrase_len[group] - phrase_in_group, 49);
        let f7 = sat(
            self.phrase_first_mora[index] - self.group_first_mora[group] + 1,
            99,
        );
        let group_mora_end = if group + 1 < self.group_total {
            self.group_first_mora[group + 1]
        } else {
            self.mora_total
        };
        let f8 = sat(group_mora_end - self.phrase_first_mora[index], 99);

        let h = if group > 0 {
            self.group_counts[group - 1].clone()
        } else {
            xx2()
        };
        let i1 = &self.group_counts[group][0];
        let i2 = &self.group_counts[group][1];
        let i3 = sat(group + 1, 19);
        let i4 = sat(self.group_total - group, 19);
        let i5 = sat(self.group_first_phrase[group] + 1, 49);
        let i6 = sat(self.phrase_total - self.group_first_phrase[group], 49);
        let i7 = sat(self.group_first_mora[group] + 1, 199);
        let i8 = sat(self.mora_total - self.group_first_mora[group], 199);
        let j = if group + 1 < self.group_total {
            self.group_counts[group + 1].clone()
        } else {
            xx2()
        };

        format!(
            "/A:{a1}+{a2}+{a3}{RESERVED}\
             /E:{}_{}!{}_xx-{e5}\
             /F:{}_{}#{}_xx@{f5}_{f6}|{f7}_{f8}\
             /G:{}_{}%{}_xx_{g5}\
             /H:{}_{}\
             /I:{i1}-{i2}@{i3}+{i4}&{i5}-{i6}|{i7}+{i8}\
             /J:{}_{}{}",
            e[0], e[1], e[2], f[0], f[1], f[2], g[0], g[1], g[2], h[0], h[1], j[0], j[1],
            self.k_tail,
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
