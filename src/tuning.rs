//! Tuning tables: maps physical keys to frequencies under a selected
//! tuning system.
//!
//! A table is built once per session from a [`Tuning`] descriptor and a
//! reference pitch (the frequency of A, conventionally 440 Hz) and is
//! immutable afterward. Layouts are hand-curated for the known
//! equal-temperament division counts so physically adjacent keys stay
//! musically adjacent; custom division counts degrade to a truncated
//! canonical layout rather than erroring.

use std::collections::HashMap;

use crate::events::Key;

// Keyboard layouts for the curated tunings. First key of each layout
// is the anchor note at the reference octave base.
const LAYOUT_12: &str = "ZSXDCVGBHNJM,L.;/'";
const LAYOUT_17: &str = "ZWSXEDCVTGBYHNUJM,";
const LAYOUT_19: &str = "ZWSXEDCFVTGBYHNUJMK,";
const LAYOUT_24: &str = "ZWS3XED4CFVTG6BYH7NUJ8MK,";
const LAYOUT_EXTENDED_UPPER: &str = "AZSXDCVGBHNJM,L.;/'";
const LAYOUT_EXTENDED_LOWER: &str = "`1Q2W3ER5T6Y7UI9O0P[=]\\";

/// Pure fifths-and-fourths derived ratios over one octave. The
/// augmented fourth is deliberately absent (1024/729 stands in for the
/// region); a known limitation of this scheme, not a bug.
const PYTHAGOREAN_RATIOS: [f64; 13] = [
    1.0,
    256.0 / 243.0,
    9.0 / 8.0,
    32.0 / 27.0,
    81.0 / 64.0,
    4.0 / 3.0,
    1024.0 / 729.0,
    3.0 / 2.0,
    128.0 / 81.0,
    27.0 / 16.0,
    16.0 / 9.0,
    243.0 / 128.0,
    2.0,
];

/// A tuning system descriptor. Immutable once selected for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tuning {
    /// N equal divisions of the octave.
    EqualTemperament { divisions: u32 },
    /// Just intonation from stacked pure fifths.
    Pythagorean,
    /// Two overlapping 12-TET registers spanning roughly two octaves
    /// across the letter and number rows.
    Extended,
}

impl Tuning {
    /// Parse a tuning name: `"<N>TET"` with N ≥ 1, `"Pythagorean"`, or
    /// `"Extended"`. Returns `None` for anything else.
    pub fn parse(name: &str) -> Option<Tuning> {
        if let Some(prefix) = name.strip_suffix("TET") {
            return match prefix.parse::<u32>() {
                Ok(n) if n >= 1 => Some(Tuning::EqualTemperament { divisions: n }),
                _ => None,
            };
        }
        match name {
            "Pythagorean" => Some(Tuning::Pythagorean),
            "Extended" => Some(Tuning::Extended),
            _ => None,
        }
    }

    /// Resolve a tuning name, falling back to 12-TET when unrecognized.
    ///
    /// Resolution is explicit and non-recursive: callers get told
    /// whether the name resolved or defaulted, and an unrecognized
    /// tuning is a warning condition, never a crash.
    pub fn resolve(name: &str) -> TuningResolution {
        match Tuning::parse(name) {
            Some(tuning) => TuningResolution::Resolved(tuning),
            None => {
                log::warn!("Unrecognized tuning {name:?}; defaulting to 12TET");
                TuningResolution::Defaulted {
                    requested: name.to_string(),
                }
            }
        }
    }
}

/// Outcome of resolving a tuning name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuningResolution {
    Resolved(Tuning),
    /// The requested name was not recognized; 12-TET applies.
    Defaulted { requested: String },
}

impl TuningResolution {
    /// The tuning that applies, whether resolved or defaulted.
    pub fn tuning(&self) -> Tuning {
        match self {
            TuningResolution::Resolved(t) => t.clone(),
            TuningResolution::Defaulted { .. } => Tuning::EqualTemperament { divisions: 12 },
        }
    }

    pub fn was_defaulted(&self) -> bool {
        matches!(self, TuningResolution::Defaulted { .. })
    }
}

/// Immutable map from key identifier to frequency.
///
/// Invariant: every key maps to a strictly positive frequency, and keys
/// are unique (later layout entries win on merge).
#[derive(Debug, Clone)]
pub struct TuningTable {
    entries: HashMap<Key, f64>,
}

impl TuningTable {
    /// Build a table for `tuning` anchored at `reference_pitch` (Hz).
    ///
    /// The octave base is the anchor note three semitones above the
    /// reference pitch, `reference × 2^(3/12)`, regardless of the
    /// division count, so the anchor key stays fixed across tunings.
    pub fn build(tuning: &Tuning, reference_pitch: f64) -> TuningTable {
        let base = reference_pitch * (2.0_f64).powf(3.0 / 12.0);

        let entries = match tuning {
            Tuning::EqualTemperament { divisions } => {
                let n = *divisions;
                layout_for_divisions(n)
                    .enumerate()
                    .map(|(i, ch)| {
                        let freq = base * (2.0_f64).powf(i as f64 / n as f64);
                        (Key::new(ch), freq)
                    })
                    .collect()
            }
            Tuning::Pythagorean => LAYOUT_12
                .chars()
                .zip(PYTHAGOREAN_RATIOS.iter())
                .map(|(ch, ratio)| (Key::new(ch), base * ratio))
                .collect(),
            Tuning::Extended => {
                let mut entries: HashMap<Key, f64> = HashMap::new();
                // Upper register on the letter rows, offset one step down.
                for (i, ch) in LAYOUT_EXTENDED_UPPER.chars().enumerate() {
                    let freq = base * (2.0_f64).powf((i as f64 - 1.0) / 12.0);
                    entries.insert(Key::new(ch), freq);
                }
                // Lower register on the number row, an octave down and
                // offset two steps. Inserted after the upper register
                // so it wins wherever the layouts overlap.
                for (i, ch) in LAYOUT_EXTENDED_LOWER.chars().enumerate() {
                    let freq = 0.5 * base * (2.0_f64).powf((i as f64 - 2.0) / 12.0);
                    entries.insert(Key::new(ch), freq);
                }
                entries
            }
        };

        TuningTable { entries }
    }

    /// Frequency for a key, or `None` if the key is outside the layout.
    pub fn frequency(&self, key: Key) -> Option<f64> {
        self.entries.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys present in this table, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.entries.keys().copied()
    }

    /// All (key, frequency) entries, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, f64)> + '_ {
        self.entries.iter().map(|(&k, &f)| (k, f))
    }
}

/// Ordered key layout for an equal-temperament division count.
///
/// Known counts get their curated layouts. Anything else is mapped
/// onto a truncated 12- or 24-division layout; approximate, but it
/// never errors.
fn layout_for_divisions(n: u32) -> impl Iterator<Item = char> {
    let (layout, cap) = match n {
        12 => (LAYOUT_12, None),
        17 => (LAYOUT_17, None),
        19 => (LAYOUT_19, None),
        24 => (LAYOUT_24, None),
        n if n < 12 => (LAYOUT_12, Some(n as usize)),
        _ => (LAYOUT_24, Some(n as usize)),
    };
    layout.chars().take(cap.unwrap_or(usize::MAX))
}
