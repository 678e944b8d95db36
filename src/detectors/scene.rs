use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::detectors::{clip, Excerpt};
use crate::text::SourceText;

// ---------------------------------------------------------------------------
// Lexicons
// ---------------------------------------------------------------------------

static TEMPORAL_ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"that (?:morning|afternoon|evening|night|day|week|summer|winter|spring|fall)",
        r"|one (?:morning|afternoon|evening|night|day)",
        r"|the (?:first|last|next) (?:time|day|night|morning)",
        r"|(?:seconds|minutes|hours|days|weeks|months) (?:before|after|later|earlier)",
        r"|(?:a|two|three|four|five|six|ten) (?:seconds?|minutes?|hours?|days?|weeks?|months?) (?:before|after|later|earlier)",
        r"|at (?:dawn|dusk|noon|midnight|sunrise|sunset)",
        r"|at \d{1,2}(?::\d{2})?\s?(?:a\.?m\.?|p\.?m\.?)",
        r"|last (?:year|summer|winter|spring|fall|semester|season|week|month)",
        r"|when i was (?:\d+|a |an )",
        r"|on the (?:morning|day|night|eve) of",
        r")"
    ))
    .unwrap()
});

static SPATIAL_ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        r"in the (?:kitchen|garage|basement|hallway|classroom|lab|gym|cafeteria|library|hospital|car|backyard|bleachers|stairwell|waiting room|parking lot|locker room)",
        r"|at the (?:kitchen table|edge of|back of|front of|foot of|bottom of|top of|counter|whiteboard|podium|starting line)",
        r"|on the (?:bus|field|court|stage|floor|sidewalk|roof|porch|bench|track)",
        r"|across the (?:room|table|street|field|hall)",
        r"|outside the (?:door|window|office|building)",
        r"|behind the (?:counter|curtain|wheel|door)",
        r")"
    ))
    .unwrap()
});

const MODALITY_NAMES: [&str; 5] = ["sight", "sound", "touch", "smell", "taste"];

static MODALITY_RES: Lazy<[Regex; 5]> = Lazy::new(|| {
    let sight = [
        "glint", "glow", "flicker", "gleam", "shadow", "fluorescent", "neon", "blinding", "dim",
        "bright", "faded", "stained", "crooked", "scarlet", "rust", "pale", "gray", "grey",
        "color", "blur", "squint",
    ];
    let sound = [
        "hum", "buzz", "creak", "thud", "echo", "whisper", "scream", "crackle", "rattle",
        "silence", "hiss", "clatter", "squeak", "roar", "ring", "pound", "slam", "murmur",
        "click", "drone",
    ];
    let touch = [
        "rough", "smooth", "sticky", "cold", "warm", "damp", "gritty", "sweat", "shiver",
        "trembl", "calloused", "numb", "burn", "sting", "pressure", "weight", "grip", "clench",
        "slick", "heavy",
    ];
    let smell = [
        "stench", "scent", "aroma", "reek", "musty", "acrid", "bleach", "smoke", "chlorine",
        "antiseptic", "perfume", "sweaty", "fragran", "odor", "burnt", "fume",
    ];
    let taste = [
        "bitter", "sour", "salty", "sweet", "metallic", "bland", "stale", "taste", "tang",
        "savor",
    ];
    [
        stem_re(&sight),
        stem_re(&sound),
        stem_re(&touch),
        stem_re(&smell),
        stem_re(&taste),
    ]
});

static ACTION_VERB_RE: Lazy<Regex> = Lazy::new(|| {
    let verbs = [
        "ran", "sprinted", "grabbed", "reached", "stared", "slammed", "pushed", "pulled",
        "lifted", "dropped", "threw", "caught", "jumped", "climbed", "knelt", "crouched",
        "leaned", "turned", "spun", "stepped", "walked", "paced", "froze", "flinched",
        "gripped", "clutched", "shoved", "wiped", "scribbled", "typed", "dialed", "sliced",
        "stirred", "poured", "swung", "ducked", "crawled", "stood", "sat", "bolted", "darted",
        "snatched", "pressed", "tapped", "pointed", "waved", "nodded", "shrugged",
    ];
    lexicon_re(&verbs)
});

fn lexicon_re(words: &[&str]) -> Regex {
    let alt = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alt})\b")).unwrap()
}

// Modality entries are stems ("trembl", "fragran"), so these match with any
// suffix.
fn stem_re(words: &[&str]) -> Regex {
    let alt = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alt})\w*\b")).unwrap()
}

// ---------------------------------------------------------------------------
// Conjunctive scene test
// ---------------------------------------------------------------------------

/// The three matched anchors that qualify a paragraph as a scene.
#[derive(Debug, Clone)]
pub(crate) struct SceneAnchors {
    pub anchor: String,
    pub sensory: String,
    pub action: String,
    pub modalities: Vec<&'static str>,
}

/// A paragraph counts as a scene only when all three anchors are present:
/// a temporal or spatial anchor, a sensory-modality token, and an action
/// verb. Reflective paragraphs with an isolated sensory word never qualify.
pub(crate) fn scene_anchors(paragraph: &str) -> Option<SceneAnchors> {
    let anchor = TEMPORAL_ANCHOR_RE
        .find(paragraph)
        .or_else(|| SPATIAL_ANCHOR_RE.find(paragraph))?;

    let mut modalities = Vec::new();
    let mut sensory = None;
    for (re, name) in MODALITY_RES.iter().zip(MODALITY_NAMES) {
        if let Some(m) = re.find(paragraph) {
            modalities.push(name);
            if sensory.is_none() {
                sensory = Some(m.as_str().to_string());
            }
        }
    }
    let sensory = sensory?;

    let action = ACTION_VERB_RE.find(paragraph)?;

    Some(SceneAnchors {
        anchor: anchor.as_str().to_string(),
        sensory,
        action: action.as_str().to_string(),
        modalities,
    })
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Default)]
pub struct SceneSignals {
    pub scene_count: usize,
    pub scene_paragraphs: Vec<usize>,
    pub opening_scene: bool,
    pub modality_count: usize,
    pub sub_score: f64,
    pub evidence: Vec<Excerpt>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

pub fn detect(text: &SourceText) -> SceneSignals {
    let mut out = SceneSignals::default();
    let mut seen_modalities: Vec<&'static str> = Vec::new();

    for (idx, paragraph) in text.paragraphs().iter().enumerate() {
        let Some(anchors) = scene_anchors(paragraph) else {
            continue;
        };
        out.scene_count += 1;
        out.scene_paragraphs.push(idx);
        if idx == 0 {
            out.opening_scene = true;
        }
        for m in &anchors.modalities {
            if !seen_modalities.contains(m) {
                seen_modalities.push(m);
            }
        }
        out.evidence.push(Excerpt::new(clip(paragraph, 120), idx));
        out.strengths.push(format!(
            "Concrete scene anchored by \"{}\" with sensory detail (\"{}\") and action (\"{}\")",
            anchors.anchor, anchors.sensory, anchors.action
        ));
    }

    out.modality_count = seen_modalities.len();
    out.sub_score = match out.scene_count {
        0 => 0.0,
        1 => 4.0,
        2 => 6.0,
        _ => 7.0,
    };
    if out.opening_scene {
        out.sub_score = (out.sub_score + 1.0).min(8.0);
    }

    if out.scene_count == 0 {
        out.gaps
            .push("No paragraph combines a time/place anchor, a sensory detail, and an action; add one concrete moment".to_string());
    } else if !out.opening_scene {
        out.gaps
            .push("The essay does not open inside a scene; consider starting in the moment".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensory_plus_action_without_anchor_is_not_a_scene() {
        assert!(scene_anchors("The stench hit me as I stared at the beaker.").is_none());
    }

    #[test]
    fn all_three_anchors_qualify() {
        let p = "Three days before regionals, the stench of chlorine hit me as I stared at the scoreboard.";
        let anchors = scene_anchors(p).expect("conjunctive test should pass");
        assert!(anchors.anchor.to_lowercase().contains("days before"));
        assert!(anchors.modalities.contains(&"smell"));
    }

    #[test]
    fn spatial_anchor_also_qualifies() {
        let p = "In the kitchen, the bitter smell of burnt toast lingered while I scribbled notes.";
        assert!(scene_anchors(p).is_some());
    }
}
