use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::detectors::{clip, scene, Excerpt};
use crate::text::SourceText;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static GENERALIZATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\bi realized\b|\bi learned\b|\bthis taught me\b|\btaught me\b",
        r"|\bi came to (?:understand|see)\b|\bi now (?:know|understand|see)\b",
        r"|\blooking back\b|\bi understand now\b|\bwhat i (?:know|carry) now\b)"
    ))
    .unwrap()
});

static NUMERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b\d+(?:,\d{3})*(?:\.\d+)?%?",
        r"|\b(?:two|three|four|five|six|seven|eight|nine|ten|eleven|twelve",
        r"|twenty|thirty|forty|fifty|sixty|hundred|thousand|dozen)\b"
    ))
    .unwrap()
});

static UNIT_OR_BENEFICIARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:hours?|weeks?|months?|dollars?|percent|meals?|books?|signatures?",
        r"|students?|kids?|children|teens?|members?|families|people|volunteers?",
        r"|attendees?|participants?|schools?|teams?|pounds?|visitors?|residents?",
        r"|seniors?|patients?|tutees?|classmates?|teammates?|swimmers?|players?",
        r"|donations?|workshops?|sessions?)\b"
    ))
    .unwrap()
});

// Bare year and age mentions are not impact.
static DATE_OR_AGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:19|20)\d{2}\b|\bwhen i was \d+\b|\b\d+ years? old\b|\bgrade \d+\b")
        .unwrap()
});

static BEFORE_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:used to|at first|had always been|originally|in the beginning|back then|before i)\b",
    )
    .unwrap()
});

static AFTER_STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:now|today|since then|these days|no longer)\b").unwrap()
});

static COMMUNITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:community|team|school|club|neighborhood|family|members|chapter",
        r"|town|district|troop|congregation|classmates)\b"
    ))
    .unwrap()
});

static COUNTER_NARRATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\beveryone (?:expected|assumed)\b|\bno one (?:thought|believed|expected)\b",
        r"|\bi was supposed to\b|\bthey told me i\b|\bunlike (?:most|the other)\b",
        r"|\bthe stereotype\b|\bdefied\b|\bagainst (?:the|all) (?:grain|odds|advice)\b)"
    ))
    .unwrap()
});

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z']+").unwrap());

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "is", "it",
        "that", "this", "with", "as", "by", "from", "was", "were", "are", "be", "been", "has",
        "have", "had", "not", "no", "i", "me", "my", "we", "our", "you", "he", "she", "they",
        "them", "his", "her", "their", "when", "what", "how", "so", "if", "then", "than", "all",
        "would", "could", "did", "do", "does",
    ]
    .into_iter()
    .collect()
});

// Closing paragraphs sharing this much content vocabulary with the opening
// are treated as restatements, not generalizations.
const RESTATEMENT_OVERLAP: f64 = 0.5;

const NUMERAL_WINDOW_WORDS: usize = 4;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Default)]
pub struct MicroToMacro {
    pub has_structure: bool,
    pub opening_is_scene: bool,
    pub has_generalization: bool,
    pub overlap: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ElitePatternSignals {
    pub micro_to_macro: MicroToMacro,
    pub quantified_impact_count: usize,
    pub has_transformation: bool,
    pub has_counter_narrative: bool,
    pub pattern_count: usize,
    pub sub_score: f64,
    pub evidence: Vec<Excerpt>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

fn content_words(text: &str) -> HashSet<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOPWORDS.contains(w.as_str()))
        .collect()
}

fn lexical_overlap(a: &str, b: &str) -> f64 {
    let wa = content_words(a);
    let wb = content_words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let shared = wa.intersection(&wb).count() as f64;
    let union = wa.union(&wb).count() as f64;
    shared / union
}

/// A numeral only counts as quantified impact when a concrete unit or named
/// beneficiary sits within a few tokens, and the mention is not a date or an
/// age.
fn quantified_impacts(paragraph: &str) -> Vec<String> {
    let mut found = Vec::new();
    for m in NUMERAL_RE.find_iter(paragraph) {
        // Percent signs are a unit in themselves.
        let is_percent = m.as_str().ends_with('%');

        let window = token_window(paragraph, m.start(), m.end(), NUMERAL_WINDOW_WORDS);
        if DATE_OR_AGE_RE.is_match(&window) {
            continue;
        }
        if is_percent || UNIT_OR_BENEFICIARY_RE.is_match(&window) {
            found.push(window.trim().to_string());
        }
    }
    found
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut word_start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = word_start.take() {
                spans.push((s, i));
            }
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(s) = word_start {
        spans.push((s, text.len()));
    }
    spans
}

// Slices the original paragraph so the window stays literally quotable.
fn token_window(text: &str, start: usize, end: usize, radius_words: usize) -> String {
    let spans = word_spans(text);
    if spans.is_empty() {
        return text.to_string();
    }
    let first = spans.iter().position(|&(_, e)| e > start).unwrap_or(0);
    let last = spans
        .iter()
        .rposition(|&(s, _)| s < end)
        .unwrap_or(spans.len() - 1);
    let lo = spans[first.saturating_sub(radius_words)].0;
    let hi = spans[(last + radius_words).min(spans.len() - 1)].1;
    text[lo..hi].to_string()
}

pub fn detect(text: &SourceText) -> ElitePatternSignals {
    let mut out = ElitePatternSignals::default();
    let paragraphs = text.paragraphs();
    if paragraphs.is_empty() {
        out.gaps.push("Nothing to analyze".to_string());
        return out;
    }

    // micro -> macro: concrete opening scene, closing generalization that is
    // not a restatement of the opening.
    let opening = &paragraphs[0];
    let closing = &paragraphs[paragraphs.len() - 1];
    out.micro_to_macro.opening_is_scene = scene::scene_anchors(opening).is_some();
    out.micro_to_macro.has_generalization = GENERALIZATION_RE.is_match(closing);
    out.micro_to_macro.overlap = lexical_overlap(opening, closing);
    out.micro_to_macro.has_structure = out.micro_to_macro.opening_is_scene
        && out.micro_to_macro.has_generalization
        && paragraphs.len() >= 2
        && out.micro_to_macro.overlap < RESTATEMENT_OVERLAP;
    if out.micro_to_macro.has_structure {
        if let Some(m) = GENERALIZATION_RE.find(closing) {
            out.evidence
                .push(Excerpt::new(m.as_str().to_string(), paragraphs.len() - 1));
        }
        out.strengths
            .push("Micro-to-macro arc: concrete opening scene widening into earned reflection".to_string());
    }

    // Quantified impact.
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        for window in quantified_impacts(paragraph) {
            out.quantified_impact_count += 1;
            out.evidence.push(Excerpt::new(clip(&window, 100), idx));
        }
    }
    if out.quantified_impact_count > 0 {
        out.strengths.push(format!(
            "{} quantified impact mention(s) with concrete units or beneficiaries",
            out.quantified_impact_count
        ));
    }

    // Before/after community transformation.
    let first_before = paragraphs.iter().position(|p| BEFORE_STATE_RE.is_match(p));
    let last_after = paragraphs.iter().rposition(|p| AFTER_STATE_RE.is_match(p));
    if let (Some(b), Some(a)) = (first_before, last_after) {
        if a > b && COMMUNITY_RE.is_match(text.raw()) {
            out.has_transformation = true;
            if let Some(m) = BEFORE_STATE_RE.find(&paragraphs[b]) {
                out.evidence.push(Excerpt::new(m.as_str().to_string(), b));
            }
            out.strengths
                .push("Before/after transformation with a community in view".to_string());
        }
    }

    // Counter-narrative framing.
    for (idx, paragraph) in paragraphs.iter().enumerate() {
        if let Some(m) = COUNTER_NARRATIVE_RE.find(paragraph) {
            out.has_counter_narrative = true;
            out.evidence.push(Excerpt::new(m.as_str().to_string(), idx));
            break;
        }
    }

    out.pattern_count = [
        out.micro_to_macro.has_structure,
        out.quantified_impact_count > 0,
        out.has_transformation,
        out.has_counter_narrative,
    ]
    .iter()
    .filter(|&&b| b)
    .count();

    out.sub_score = 0.0;
    if out.micro_to_macro.has_structure {
        out.sub_score += 4.0;
    }
    out.sub_score += match out.quantified_impact_count {
        0 => 0.0,
        1 => 2.0,
        2 => 2.5,
        _ => 3.0,
    };
    if out.has_transformation {
        out.sub_score += 2.0;
    }
    if out.has_counter_narrative {
        out.sub_score += 1.0;
    }
    out.sub_score = out.sub_score.min(10.0);

    if out.pattern_count == 0 {
        out.gaps.push(
            "None of the macro patterns land: no micro-to-macro arc, no quantified impact, no transformation"
                .to_string(),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_numerals_are_not_impact() {
        assert!(quantified_impacts("I was born in 2006 and started when I was 14.").is_empty());
    }

    #[test]
    fn numeral_with_beneficiary_counts() {
        let found = quantified_impacts("We delivered 340 meals to 60 families that winter.");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn restatement_closing_defeats_micro_to_macro() {
        let text = SourceText::new(
            "Three days before regionals, the chlorine stench stung as I stared at the empty pool.\n\n\
             I realized the chlorine stench stung the empty pool before regionals, staring.",
        );
        let out = detect(&text);
        assert!(out.micro_to_macro.opening_is_scene);
        assert!(out.micro_to_macro.has_generalization);
        assert!(!out.micro_to_macro.has_structure, "restatement must not count");
    }
}
