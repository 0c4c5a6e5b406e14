//! Context label type, the canonical field order, and the label grammar.
//!
//! A full-context label is one delimited line holding the phoneme identity
//! (`p3`) plus 49 context fields:
//!
//! ```text
//! p1^p2-p3+p4=p5/A:a1+a2+a3/B:b1-b2_b3/C:c1_c2+c3/D:d1+d2_d3
//! /E:e1_e2!e3_e4-e5/F:f1_f2#f3_f4@f5_f6|f7_f8/G:g1_g2%g3_g4_g5
//! /H:h1_h2/I:i1-i2@i3+i4&i5-i6|i7+i8/J:j1_j2/K:k1+k2-k3
//! ```
//!
//! (one line, shown wrapped). [`ContextLabel`] keeps the fields as a map
//! keyed by field name so that a missing key is a detectable state:
//! serialization checks all 50 slots and fails with
//! [`LabelError::MissingField`] rather than defaulting anything.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::LabelError;

/// The 50 slots of the label line in grammar order, each with the
/// separator that precedes it. `p3` is the phoneme identity; the other 49
/// are context fields.
const TEMPLATE: [(&str, &str); 50] = [
    ("", "p1"),
    ("^", "p2"),
    ("-", "p3"),
    ("+", "p4"),
    ("=", "p5"),
    ("/A:", "a1"),
    ("+", "a2"),
    ("+", "a3"),
    ("/B:", "b1"),
    ("-", "b2"),
    ("_", "b3"),
    ("/C:", "c1"),
    ("_", "c2"),
    ("+", "c3"),
    ("/D:", "d1"),
    ("+", "d2"),
    ("_", "d3"),
    ("/E:", "e1"),
    ("_", "e2"),
    ("!", "e3"),
    ("_", "e4"),
    ("-", "e5"),
    ("/F:", "f1"),
    ("_", "f2"),
    ("#", "f3"),
    ("_", "f4"),
    ("@", "f5"),
    ("_", "f6"),
    ("|", "f7"),
    ("_", "f8"),
    ("/G:", "g1"),
    ("_", "g2"),
    ("%", "g3"),
    ("_", "g4"),
    ("_", "g5"),
    ("/H:", "h1"),
    ("_", "h2"),
    ("/I:", "i1"),
    ("-", "i2"),
    ("@", "i3"),
    ("+", "i4"),
    ("&", "i5"),
    ("-", "i6"),
    ("|", "i7"),
    ("+", "i8"),
    ("/J:", "j1"),
    ("_", "j2"),
    ("/K:", "k1"),
    ("+", "k2"),
    ("-", "k3"),
];

/// Anchored regex over the whole grammar; one named group per slot.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\A(?P<p1>[^\^]+)\^(?P<p2>[^-]+)-(?P<p3>[^\+]+)\+(?P<p4>[^=]+)=(?P<p5>[^/]+)",
        r"/A:(?P<a1>[^\+]+)\+(?P<a2>[^\+]+)\+(?P<a3>[^/]+)",
        r"/B:(?P<b1>[^-]+)-(?P<b2>[^_]+)_(?P<b3>[^/]+)",
        r"/C:(?P<c1>[^_]+)_(?P<c2>[^\+]+)\+(?P<c3>[^/]+)",
        r"/D:(?P<d1>[^\+]+)\+(?P<d2>[^_]+)_(?P<d3>[^/]+)",
        r"/E:(?P<e1>[^_]+)_(?P<e2>[^!]+)!(?P<e3>[^_]+)_(?P<e4>[^-]+)-(?P<e5>[^/]+)",
        r"/F:(?P<f1>[^_]+)_(?P<f2>[^#]+)#(?P<f3>[^_]+)_(?P<f4>[^@]+)@(?P<f5>[^_]+)_(?P<f6>[^\|]+)\|(?P<f7>[^_]+)_(?P<f8>[^/]+)",
        r"/G:(?P<g1>[^_]+)_(?P<g2>[^%]+)%(?P<g3>[^_]+)_(?P<g4>[^_]+)_(?P<g5>[^/]+)",
        r"/H:(?P<h1>[^_]+)_(?P<h2>[^/]+)",
        r"/I:(?P<i1>[^-]+)-(?P<i2>[^@]+)@(?P<i3>[^\+]+)\+(?P<i4>[^&]+)&(?P<i5>[^-]+)-(?P<i6>[^\|]+)\|(?P<i7>[^\+]+)\+(?P<i8>[^/]+)",
        r"/J:(?P<j1>[^_]+)_(?P<j2>[^/]+)",
        r"/K:(?P<k1>[^\+]+)\+(?P<k2>[^-]+)-(?P<k3>[^/]+)\z",
    ))
    .unwrap()
});

/// All 50 slot names in grammar order.
pub fn field_names() -> impl Iterator<Item = &'static str> {
    TEMPLATE.iter().map(|(_, key)| *key)
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextLabel
// ─────────────────────────────────────────────────────────────────────────────

/// One emitted unit's field set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextLabel {
    contexts: HashMap<&'static str, String>,
}

impl ContextLabel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.contexts.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.contexts.get(key).map(String::as_str)
    }

    /// Phoneme identity (the `p3` slot), if already computed.
    pub fn phoneme(&self) -> Option<&str> {
        self.get("p3")
    }

    /// Render the canonical label line.
    ///
    /// Every slot must be present; a missing one is an internal defect and
    /// surfaces as [`LabelError::MissingField`].
    pub fn render(&self) -> Result<String, LabelError> {
        let mut line = String::with_capacity(128);
        for (separator, key) in TEMPLATE {
            let value = self
                .contexts
                .get(key)
                .ok_or(LabelError::MissingField(key))?;
            line.push_str(separator);
            line.push_str(value);
        }
        Ok(line)
    }

    /// Parse a canonical label line back into a field set.
    pub fn parse(line: &str) -> Result<Self, LabelError> {
        let caps = LABEL_RE
            .captures(line)
            .ok_or_else(|| LabelError::InvalidLabel(line.to_string()))?;
        let mut label = Self::new();
        for (_, key) in TEMPLATE {
            label.set(key, &caps[key]);
        }
        Ok(label)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
