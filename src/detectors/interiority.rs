use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::detectors::{clip, Excerpt};
use crate::text::SourceText;

// ---------------------------------------------------------------------------
// Emotion tiers and admission markers
// ---------------------------------------------------------------------------

// Specific emotions outrank generic ones; "sad" tells, "mortified" names.
static SPECIFIC_EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:humiliated|ashamed|mortified|terrified|devastated|resentful",
        r"|envious|jealous|helpless|hollow|guilty|panicked|dread|heartbroken",
        r"|embarrassed|anxious|overwhelmed|desperate|furious|exhilarated",
        r"|lonely|numb|defeated|paralyzed)\b",
        r"|(?i)felt like a fraud|impostor"
    ))
    .unwrap()
});

static GENERIC_EMOTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:happy|sad|angry|upset|mad|glad|excited|nervous|scared",
        r"|afraid|stressed|worried|frustrated|proud|passionate)\b"
    ))
    .unwrap()
});

// Admissions of limitation, failure, or fear. A named emotion only becomes a
// vulnerability moment when one of these sits in the same paragraph.
static ADMISSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\bi failed\b|\bfailure\b|\bmy mistake\b|\bi messed up\b",
        r"|\bi couldn'?t\b|\bi could not\b|\bi didn'?t know\b|\bi had no idea\b",
        r"|\bi was wrong\b|\bmy fault\b|\bi struggled\b|\bi gave up\b|\bi quit\b",
        r"|\bi froze\b|\bi fell short\b|\bi wasn'?t good enough\b|\bnot good enough\b",
        r"|\bi didn'?t belong\b|\bi doubted\b|\bi was afraid\b|\bi feared\b",
        r"|\bi lost\b|dropped to \d+|\bi had never\b|\bworst\b)"
    ))
    .unwrap()
});

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Default)]
pub struct InterioritySignals {
    pub specific_emotion_count: usize,
    pub generic_emotion_count: usize,
    pub vulnerability_count: usize,
    pub vulnerability_paragraphs: Vec<usize>,
    pub elite_vulnerability: bool,
    pub sub_score: f64,
    pub evidence: Vec<Excerpt>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

pub fn detect(text: &SourceText) -> InterioritySignals {
    let mut out = InterioritySignals::default();

    for (idx, paragraph) in text.paragraphs().iter().enumerate() {
        let specific = SPECIFIC_EMOTION_RE.find(paragraph);
        let generic = GENERIC_EMOTION_RE.find(paragraph);
        if specific.is_some() {
            out.specific_emotion_count += 1;
        }
        if generic.is_some() {
            out.generic_emotion_count += 1;
        }

        let named_emotion = specific.or(generic);
        let admission = ADMISSION_RE.find(paragraph);

        // Co-location rule: emotion and admission in the same paragraph count
        // as one moment; either alone counts as none.
        if let (Some(emotion), Some(adm)) = (named_emotion, admission) {
            out.vulnerability_count += 1;
            out.vulnerability_paragraphs.push(idx);
            out.evidence.push(Excerpt::new(
                clip(&format!("{} ... {}", emotion.as_str(), adm.as_str()), 120),
                idx,
            ));
        }
    }

    // One elaborated moment must not read as two; elite status needs a second
    // moment at least one paragraph away.
    out.elite_vulnerability = out
        .vulnerability_paragraphs
        .iter()
        .enumerate()
        .any(|(i, &a)| {
            out.vulnerability_paragraphs[i + 1..]
                .iter()
                .any(|&b| b >= a + 2)
        });

    out.sub_score = match out.vulnerability_count {
        0 => 0.0,
        1 => 5.0,
        _ => 6.0,
    };
    if out.elite_vulnerability {
        out.sub_score += 2.0;
    }
    if out.specific_emotion_count > 0 {
        out.sub_score = (out.sub_score + 1.0).min(8.0);
    }

    if out.elite_vulnerability {
        out.strengths
            .push("Multiple independent vulnerability moments across the essay".to_string());
    } else if out.vulnerability_count == 1 {
        out.strengths
            .push("One genuine vulnerability moment (emotion plus admission)".to_string());
    }
    if out.vulnerability_count == 0 {
        if out.specific_emotion_count + out.generic_emotion_count > 0 {
            out.gaps.push(
                "Emotion is named but never paired with an admission of limitation or failure"
                    .to_string(),
            );
        } else {
            out.gaps
                .push("No named emotion anywhere; the reader never sees the interior view".to_string());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distant_markers_do_not_colocate() {
        let text = SourceText::new(
            "I was nervous before the meet, pacing the deck.\n\n\
             The season went on as seasons do.\n\n\
             Years earlier I failed my first tryout, a fact I rarely mention.",
        );
        let out = detect(&text);
        // Paragraph 1 has emotion only, paragraph 3 has admission only.
        assert_eq!(out.vulnerability_count, 0);
    }

    #[test]
    fn same_paragraph_counts_exactly_once() {
        let text = SourceText::new(
            "I was ashamed when I failed the qualifier, and ashamed again telling my team I couldn't fix it.",
        );
        let out = detect(&text);
        assert_eq!(out.vulnerability_count, 1);
        assert!(!out.elite_vulnerability);
    }

    #[test]
    fn non_adjacent_moments_reach_elite() {
        let text = SourceText::new(
            "I was ashamed that I failed the first build.\n\n\
             The middle of the season passed quietly.\n\n\
             I felt helpless when I couldn't explain the result to the younger members.",
        );
        let out = detect(&text);
        assert_eq!(out.vulnerability_count, 2);
        assert!(out.elite_vulnerability);
    }
}
