//! Canonical feedback conditions and free-text label normalization
//!
//! Session logs and questionnaire sheets spell the same condition many ways
//! ("NO FEEDBACK", " Vibration ", "colour"). Labels are resolved in two tiers:
//! an exact synonym table first, then an ordered list of keyword rules where
//! the first match wins. Anything left over passes through as
//! [`ConditionLabel::Unrecognized`] so no data is silently merged or dropped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// One of the four experimental feedback treatments
///
/// Declaration order is the canonical column order used by every derived
/// matrix; it is never re-sorted alphabetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Condition {
    None,
    Color,
    Audio,
    Gamepad,
}

impl Condition {
    /// All conditions in canonical order
    pub const ALL: [Condition; 4] = [
        Condition::None,
        Condition::Color,
        Condition::Audio,
        Condition::Gamepad,
    ];

    /// Display name, also used as the exported column header
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::None => "None",
            Condition::Color => "Color",
            Condition::Audio => "Audio",
            Condition::Gamepad => "Gamepad",
        }
    }

    /// Parse an exact display name (as written by the exporter)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized condition label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConditionLabel {
    /// Label resolved to a canonical condition
    Canonical(Condition),
    /// Cleaned (NFKC, whitespace-collapsed, lowercased) text that matched no rule
    Unrecognized(String),
}

impl ConditionLabel {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionLabel::Canonical(c) => c.as_str(),
            ConditionLabel::Unrecognized(s) => s,
        }
    }

    pub fn canonical(&self) -> Option<Condition> {
        match self {
            ConditionLabel::Canonical(c) => Some(*c),
            ConditionLabel::Unrecognized(_) => None,
        }
    }

    /// Parse a header written by the exporter: display names map back to
    /// canonical conditions, everything else stays unrecognized verbatim
    pub fn from_header(header: &str) -> Self {
        match Condition::from_name(header) {
            Some(c) => ConditionLabel::Canonical(c),
            None => ConditionLabel::Unrecognized(header.to_string()),
        }
    }
}

impl From<Condition> for ConditionLabel {
    fn from(condition: Condition) -> Self {
        ConditionLabel::Canonical(condition)
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact-match synonyms, checked against the cleaned label
const SYNONYMS: &[(&str, Condition)] = &[
    ("none", Condition::None),
    ("no feedback", Condition::None),
    ("no-feedback", Condition::None),
    ("nofeedback", Condition::None),
    ("baseline", Condition::None),
    ("control", Condition::None),
    ("nf", Condition::None),
    ("visual", Condition::Color),
    ("vision", Condition::Color),
    ("colour", Condition::Color),
    ("color", Condition::Color),
    ("audio", Condition::Audio),
    ("sound", Condition::Audio),
    ("beep", Condition::Audio),
    ("beeps", Condition::Audio),
    ("haptic", Condition::Gamepad),
    ("gamepad", Condition::Gamepad),
    ("vibration", Condition::Gamepad),
    ("rumble", Condition::Gamepad),
    ("vibrotactile", Condition::Gamepad),
    ("vibro", Condition::Gamepad),
];

/// Keyword rule: predicate over the cleaned label
struct KeywordRule {
    condition: Condition,
    matches: fn(&str) -> bool,
}

/// Keyword rules in priority order; first match wins
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        condition: Condition::None,
        matches: mentions_no_feedback,
    },
    KeywordRule {
        condition: Condition::Color,
        matches: mentions_color,
    },
    KeywordRule {
        condition: Condition::Audio,
        matches: mentions_audio,
    },
    KeywordRule {
        condition: Condition::Gamepad,
        matches: mentions_haptics,
    },
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn mentions_no_feedback(text: &str) -> bool {
    (text.contains("no") && text.contains("feed")) || matches!(text, "baseline" | "control" | "nf")
}

fn mentions_color(text: &str) -> bool {
    contains_any(text, &["visual", "vision", "colour", "color"])
}

fn mentions_audio(text: &str) -> bool {
    contains_any(text, &["audio", "sound", "beep"])
}

fn mentions_haptics(text: &str) -> bool {
    contains_any(text, &["haptic", "gamepad", "vibration", "rumble", "vibro"])
}

/// NFKC-normalize, collapse whitespace runs, trim and lowercase
pub fn clean_label(raw: &str) -> String {
    let nfkc: String = raw.nfkc().collect();
    nfkc.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Resolve a free-text label to a canonical condition
///
/// # Example
/// ```
/// use feedback_stats::condition::{normalize_label, Condition, ConditionLabel};
///
/// assert_eq!(normalize_label("NO FEEDBACK"), ConditionLabel::Canonical(Condition::None));
/// assert_eq!(normalize_label(" Vibration "), ConditionLabel::Canonical(Condition::Gamepad));
/// assert_eq!(normalize_label("Smell"), ConditionLabel::Unrecognized("smell".to_string()));
/// ```
pub fn normalize_label(raw: &str) -> ConditionLabel {
    let cleaned = clean_label(raw);

    if let Some((_, condition)) = SYNONYMS.iter().find(|(synonym, _)| *synonym == cleaned) {
        return ConditionLabel::Canonical(*condition);
    }

    match KEYWORD_RULES.iter().find(|rule| (rule.matches)(&cleaned)) {
        Some(rule) => ConditionLabel::Canonical(rule.condition),
        None => ConditionLabel::Unrecognized(cleaned),
    }
}

/// Label normalizer that reports each unrecognized label once
#[derive(Debug, Default)]
pub struct LabelNormalizer {
    unrecognized: BTreeSet<String>,
}

impl LabelNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize a label, warning the first time an unrecognized one is seen
    pub fn normalize(&mut self, raw: &str) -> ConditionLabel {
        let label = normalize_label(raw);
        if let ConditionLabel::Unrecognized(ref cleaned) = label {
            if self.unrecognized.insert(cleaned.clone()) {
                tracing::warn!(
                    "Unrecognized condition label {:?} (raw {:?}); kept as a separate column",
                    cleaned,
                    raw
                );
            }
        }
        label
    }

    /// Distinct unrecognized labels seen so far, sorted
    pub fn unrecognized(&self) -> Vec<String> {
        self.unrecognized.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(raw: &str) -> Option<Condition> {
        normalize_label(raw).canonical()
    }

    #[test]
    fn test_exact_synonyms() {
        assert_eq!(canonical("NO FEEDBACK"), Some(Condition::None));
        assert_eq!(canonical(" Vibration "), Some(Condition::Gamepad));
        assert_eq!(canonical("colour"), Some(Condition::Color));
        assert_eq!(canonical("Beeps"), Some(Condition::Audio));
        assert_eq!(canonical("NF"), Some(Condition::None));
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(canonical("  no \t  feedback "), Some(Condition::None));
        assert_eq!(clean_label("  Visual\u{a0}\u{a0}Cue "), "visual cue");
    }

    #[test]
    fn test_nfkc_fullwidth() {
        // Fullwidth Latin letters fold to ASCII under NFKC
        assert_eq!(canonical("ＡＵＤＩＯ"), Some(Condition::Audio));
    }

    #[test]
    fn test_keyword_rules() {
        assert_eq!(canonical("no-feedback condition"), Some(Condition::None));
        assert_eq!(canonical("Visual (red/green)"), Some(Condition::Color));
        assert_eq!(canonical("sound cue"), Some(Condition::Audio));
        assert_eq!(canonical("Haptic Gamepad"), Some(Condition::Gamepad));
        assert_eq!(canonical("vibro-tactile"), Some(Condition::Gamepad));
    }

    #[test]
    fn test_keyword_priority_first_match_wins() {
        // Mentions both color and audio: color rule comes first
        assert_eq!(canonical("color + audio"), Some(Condition::Color));
        // "no feedback" beats everything else
        assert_eq!(canonical("no feedback (audio off)"), Some(Condition::None));
    }

    #[test]
    fn test_canonical_names_idempotent() {
        for condition in Condition::ALL {
            assert_eq!(canonical(condition.as_str()), Some(condition));
            let again = normalize_label(normalize_label(condition.as_str()).as_str());
            assert_eq!(again, ConditionLabel::Canonical(condition));
        }
    }

    #[test]
    fn test_unknown_passes_through() {
        assert_eq!(
            normalize_label("  Olfactory  "),
            ConditionLabel::Unrecognized("olfactory".to_string())
        );
    }

    #[test]
    fn test_normalizer_tracks_unrecognized_once() {
        let mut normalizer = LabelNormalizer::new();
        normalizer.normalize("Smell");
        normalizer.normalize("smell ");
        normalizer.normalize("Audio");
        normalizer.normalize("Taste");
        assert_eq!(normalizer.unrecognized(), vec!["smell", "taste"]);
    }

    #[test]
    fn test_label_from_header() {
        assert_eq!(
            ConditionLabel::from_header("Gamepad"),
            ConditionLabel::Canonical(Condition::Gamepad)
        );
        assert_eq!(
            ConditionLabel::from_header("smell"),
            ConditionLabel::Unrecognized("smell".to_string())
        );
    }
}
