use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::detectors::Excerpt;
use crate::text::SourceText;

// ---------------------------------------------------------------------------
// Image families
// ---------------------------------------------------------------------------

const IMAGE_FAMILIES: [(&str, &[&str]); 8] = [
    (
        "water",
        &[
            "current", "tide", "wave", "drown", "float", "river", "ocean", "ripple", "shore",
            "undertow", "surface", "depth",
        ],
    ),
    (
        "fire",
        &["flame", "spark", "burn", "ember", "ignite", "ash", "blaze", "kindl", "smolder"],
    ),
    (
        "light",
        &["glow", "shadow", "dawn", "dusk", "illuminat", "flicker", "radiant", "dim", "beam"],
    ),
    (
        "journey",
        &["road", "path", "map", "detour", "compass", "destination", "mile", "crossroad", "trail"],
    ),
    (
        "music",
        &["rhythm", "melody", "chord", "harmony", "tempo", "tune", "refrain", "crescendo", "dissonan"],
    ),
    (
        "growth",
        &["seed", "root", "bloom", "soil", "garden", "branch", "sprout", "wither", "harvest"],
    ),
    (
        "thread",
        &["thread", "weave", "knot", "stitch", "fabric", "unravel", "loom", "seam", "fray"],
    ),
    (
        "battle",
        &["battle", "armor", "wound", "retreat", "siege", "trench", "shield", "skirmish"],
    ),
];

static FAMILY_RES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    IMAGE_FAMILIES
        .iter()
        .map(|(name, words)| {
            let alt = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            (
                *name,
                Regex::new(&format!(r"(?i)\b(?:{alt})\w*\b")).unwrap(),
            )
        })
        .collect()
});

// ---------------------------------------------------------------------------
// Structural innovation patterns (closed set)
// ---------------------------------------------------------------------------

static SCENE_OPENER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:that |one |the (?:first|last|next) |at |on |in the |three |two |five ",
        r"|minutes |hours |days |weeks )"
    ))
    .unwrap()
});

static NONLINEAR_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:years? (?:earlier|before)|months? (?:earlier|before) that",
        r"|long before|rewind|flash(?:ing)? back|back when|two summers (?:ago|before))\b"
    ))
    .unwrap()
});

static SECOND_PERSON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\byou(?:r|'re)?\b").unwrap());

static FIRST_PERSON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bi\b|\bmy\b").unwrap());

// ---------------------------------------------------------------------------
// Voice markers
// ---------------------------------------------------------------------------

static ASIDE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:^|\. )(?:okay,|look,|honestly,|truth be told|here's the thing i've kept",
        r"|fine,|admittedly,)|\([^)]{3,60}\)"
    ))
    .unwrap()
});

const SHORT_SENTENCE_WORDS: usize = 4;
const LONG_SENTENCE_WORDS: usize = 25;
const METAPHOR_MIN_PARAGRAPHS: usize = 3;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Default)]
pub struct LiterarySignals {
    pub has_extended_metaphor: bool,
    pub metaphor_family: Option<String>,
    pub rhythm_variety: bool,
    pub shortest_sentence_words: usize,
    pub longest_sentence_words: usize,
    pub sensory_modality_count: usize,
    pub innovation_patterns: Vec<&'static str>,
    pub voice_marker_count: usize,
    pub sub_score: f64,
    pub evidence: Vec<Excerpt>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

/// Greedily pick pairwise non-adjacent indices from a sorted list.
fn non_adjacent_count(indices: &[usize]) -> usize {
    let mut picked = 0usize;
    let mut last: Option<usize> = None;
    for &i in indices {
        match last {
            Some(l) if i < l + 2 => {}
            _ => {
                picked += 1;
                last = Some(i);
            }
        }
    }
    picked
}

fn detect_extended_metaphor(text: &SourceText, out: &mut LiterarySignals) {
    for (family, re) in FAMILY_RES.iter() {
        let hits: Vec<usize> = text
            .paragraphs()
            .iter()
            .enumerate()
            .filter(|(_, p)| re.is_match(p))
            .map(|(i, _)| i)
            .collect();
        if non_adjacent_count(&hits) >= METAPHOR_MIN_PARAGRAPHS {
            out.has_extended_metaphor = true;
            out.metaphor_family = Some(family.to_string());
            for &i in hits.iter().take(3) {
                if let Some(m) = re.find(&text.paragraphs()[i]) {
                    out.evidence.push(Excerpt::new(m.as_str().to_string(), i));
                }
            }
            out.strengths.push(format!(
                "Extended '{family}' metaphor sustained across {} paragraphs",
                hits.len()
            ));
            return;
        }
    }
}

fn detect_rhythm(text: &SourceText, out: &mut LiterarySignals) {
    let lengths: Vec<usize> = text
        .sentences()
        .iter()
        .map(|s| s.split_whitespace().count())
        .collect();
    out.shortest_sentence_words = lengths.iter().copied().min().unwrap_or(0);
    out.longest_sentence_words = lengths.iter().copied().max().unwrap_or(0);
    // Both extremes are required; average length proves nothing.
    out.rhythm_variety = out.shortest_sentence_words > 0
        && out.shortest_sentence_words <= SHORT_SENTENCE_WORDS
        && out.longest_sentence_words >= LONG_SENTENCE_WORDS;
    if out.rhythm_variety {
        out.strengths.push(format!(
            "Sentence rhythm ranges from {} to {} words",
            out.shortest_sentence_words, out.longest_sentence_words
        ));
    } else if !text.sentences().is_empty() {
        out.gaps
            .push("Sentence lengths cluster; pair one blunt short sentence with one long unspooling one".to_string());
    }
}

// Independent modality pass; the scene detector keeps its own lexicons.
static MODALITY_RES: Lazy<[Regex; 5]> = Lazy::new(|| {
    [
        Regex::new(r"(?i)\b(?:glint|glow|flicker|shadow|bright|dim|pale|faded|scarlet|blur)\w*\b")
            .unwrap(),
        Regex::new(r"(?i)\b(?:hum|buzz|creak|echo|whisper|silence|clatter|roar|murmur|thud)\w*\b")
            .unwrap(),
        Regex::new(r"(?i)\b(?:rough|smooth|cold|warm|damp|gritty|sweat|trembl|numb|weight)\w*\b")
            .unwrap(),
        Regex::new(r"(?i)\b(?:stench|scent|aroma|musty|acrid|smoke|chlorine|antiseptic|odor)\w*\b")
            .unwrap(),
        Regex::new(r"(?i)\b(?:bitter|sour|salty|sweet|metallic|stale|tang|taste)\w*\b").unwrap(),
    ]
});

fn detect_sensory_diversity(text: &SourceText, out: &mut LiterarySignals) {
    out.sensory_modality_count = MODALITY_RES
        .iter()
        .filter(|re| re.is_match(text.raw()))
        .count();
}

fn detect_innovation(text: &SourceText, out: &mut LiterarySignals) {
    let paragraphs = text.paragraphs();

    let scene_openers = paragraphs
        .iter()
        .filter(|p| SCENE_OPENER_RE.is_match(p))
        .count();
    if scene_openers >= 2 {
        out.innovation_patterns.push("dual-scene");
    }

    if paragraphs
        .iter()
        .skip(1)
        .any(|p| NONLINEAR_TIME_RE.is_match(p))
    {
        out.innovation_patterns.push("nonlinear-time");
    }

    // Frame narrative: the closing paragraph deliberately returns to a
    // distinctive image from the opening.
    if paragraphs.len() >= 3 {
        let first = paragraphs[0].to_lowercase();
        let last = paragraphs[paragraphs.len() - 1].to_lowercase();
        let shared_rare = first
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.len() >= 6)
            .filter(|w| last.contains(*w))
            .count();
        if shared_rare >= 2 {
            out.innovation_patterns.push("frame-narrative");
        }
    }

    let first_person_text = paragraphs.iter().any(|p| FIRST_PERSON_RE.is_match(p));
    let second_person_para = paragraphs
        .iter()
        .any(|p| SECOND_PERSON_RE.find_iter(p).count() >= 2);
    if first_person_text && second_person_para {
        out.innovation_patterns.push("perspective-shift");
    }
}

fn detect_voice(text: &SourceText, out: &mut LiterarySignals) {
    let mut count = 0usize;
    for sentence in text.sentences() {
        if sentence.split_whitespace().count() == 1 {
            count += 1; // one-word sentence
        }
    }
    count += text.raw().matches('?').count().min(2);
    count += ASIDE_RE.find_iter(text.raw()).count().min(2);
    out.voice_marker_count = count;
}

pub fn detect(text: &SourceText) -> LiterarySignals {
    let mut out = LiterarySignals::default();

    detect_extended_metaphor(text, &mut out);
    detect_rhythm(text, &mut out);
    detect_sensory_diversity(text, &mut out);
    detect_innovation(text, &mut out);
    detect_voice(text, &mut out);

    // Standard structure is not penalized to zero; craft floors at a
    // baseline and earns upward from there.
    out.sub_score = 3.0;
    if out.has_extended_metaphor {
        out.sub_score += 2.0;
    }
    if out.rhythm_variety {
        out.sub_score += 2.0;
    }
    if out.sensory_modality_count >= 3 {
        out.sub_score += 1.0;
    }
    out.sub_score += (out.innovation_patterns.len() as f64).min(2.0);
    out.sub_score = out.sub_score.min(10.0);

    if out.innovation_patterns.is_empty() && !out.has_extended_metaphor {
        out.gaps
            .push("Structure is conventional; nothing formally surprising".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rhythm_needs_both_extremes() {
        // Short sentence present, no long one.
        let text = SourceText::new("I stopped. The gym went quiet around me. We started over again.");
        let out = detect(&text);
        assert!(!out.rhythm_variety);
    }

    #[test]
    fn metaphor_needs_three_non_adjacent_paragraphs() {
        let adjacent = SourceText::new(
            "The current pulled at me.\n\nThe tide kept coming.\n\nWaves again and again.",
        );
        assert!(!detect(&adjacent).has_extended_metaphor);

        let spread = SourceText::new(
            "The current pulled at me.\n\nPractice was ordinary.\n\nThe tide kept coming.\n\n\
             We debriefed afterward.\n\nI finally stopped fighting the waves.",
        );
        let out = detect(&spread);
        assert!(out.has_extended_metaphor);
        assert_eq!(out.metaphor_family.as_deref(), Some("water"));
    }
}
