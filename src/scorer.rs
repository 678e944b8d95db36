use std::fmt;

use serde::{Serialize, Serializer};

use crate::detectors::DetectorOutputs;
use crate::rubric::{
    apply_rules, composite_index, DimensionName, EssayType, RubricConfig, ScoreSet,
};
use crate::text::SourceText;

// ---------------------------------------------------------------------------
// Options and flags
// ---------------------------------------------------------------------------

/// Caller-facing knobs. `max_words` only affects the over-length flag, never
/// detector behavior; `essay_type` selects the weight table.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub max_words: Option<usize>,
    pub essay_type: EssayType,
}

/// Failure modes the composite number can mask. Derived from raw evidence
/// thresholds, independent of the weighted score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flag {
    TooShort,
    OverLength,
    NoScene,
    NoVulnerability,
    ResumeStyleListing,
    DetectorFailed(&'static str),
    DegradedConfidence,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::TooShort => f.write_str("too-short"),
            Flag::OverLength => f.write_str("over-length"),
            Flag::NoScene => f.write_str("no-scene"),
            Flag::NoVulnerability => f.write_str("no-vulnerability"),
            Flag::ResumeStyleListing => f.write_str("resume-style-listing"),
            Flag::DetectorFailed(name) => write!(f, "detector-failed:{name}"),
            Flag::DegradedConfidence => f.write_str("degraded-confidence"),
        }
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DimensionScore {
    pub dimension: DimensionName,
    pub score: f64,
    pub evidence_excerpts: Vec<String>,
    pub rationale: String,
}

/// The engine's sole outward artifact. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub composite_index: f64,
    pub impression_label: &'static str,
    pub rubric_version: String,
    pub essay_type: EssayType,
    pub word_count: usize,
    pub dimension_scores: Vec<DimensionScore>,
    pub flags: Vec<Flag>,
    pub detectors: DetectorOutputs,
}

impl AnalysisReport {
    /// The post-rule score set, reconstructed for simulation.
    pub fn score_set(&self) -> ScoreSet {
        let mut scores = ScoreSet::new();
        for ds in &self.dimension_scores {
            scores.set(ds.dimension, ds.score);
        }
        scores
    }
}

const MIN_WORDS: usize = 120;
const RESUME_STYLE_IMPACT_MIN: usize = 3;

pub fn impression_label(composite: f64) -> &'static str {
    if composite >= 85.0 {
        "exceptional"
    } else if composite >= 70.0 {
        "compelling"
    } else if composite >= 55.0 {
        "promising"
    } else if composite >= 40.0 {
        "developing"
    } else {
        "foundational"
    }
}

// ---------------------------------------------------------------------------
// Raw dimension mapping
// ---------------------------------------------------------------------------

fn raw_scores(d: &DetectorOutputs) -> ScoreSet {
    use DimensionName::*;
    let mut s = ScoreSet::new();

    // Scene craft: conjunctive scene count, opening bonus, modality spread.
    let scene = &d.scene;
    let scene_raw = if scene.scene_count == 0 {
        0.0
    } else {
        let mut v = 3.0 + 2.0 * (scene.scene_count.min(3) as f64);
        if scene.opening_scene {
            v += 1.0;
        }
        if scene.modality_count >= 3 {
            v += 0.5;
        }
        v
    };
    s.set(SceneCraft, scene_raw);

    // Dialogue: only working quotes count; confrontation is the strongest
    // signal.
    let dialogue = &d.dialogue;
    let dialogue_raw = if dialogue.working_count == 0 {
        0.0
    } else {
        let mut v = 5.0;
        if dialogue.working_count >= 2 {
            v += 2.0;
        }
        if dialogue.has_confrontation {
            v += 2.0;
        }
        v
    };
    s.set(Dialogue, dialogue_raw);

    // Interiority: specificity of named emotion.
    let inter = &d.interiority;
    let interiority_raw = if inter.specific_emotion_count == 0 && inter.generic_emotion_count == 0 {
        0.0
    } else {
        let mut v = 3.0;
        if inter.specific_emotion_count > 0 {
            v += 3.0;
        }
        if inter.specific_emotion_count >= 2 {
            v += 2.0;
        }
        if inter.vulnerability_count >= 1 {
            v += 1.0;
        }
        v
    };
    s.set(Interiority, interiority_raw);

    // Vulnerability: co-located moments, elite for non-adjacent repeats.
    let vulnerability_raw = match inter.vulnerability_count {
        0 => 0.0,
        1 => 6.0,
        _ => 7.0,
    } + if inter.elite_vulnerability { 2.0 } else { 0.0 }
        + if inter.vulnerability_count > 0 && inter.specific_emotion_count > 0 {
            1.0
        } else {
            0.0
        };
    s.set(Vulnerability, vulnerability_raw);

    // Reflection: a closing generalization, strengthened by arc structure and
    // interior evidence.
    let elite = &d.elite_patterns;
    let reflection_raw = if !elite.micro_to_macro.has_generalization {
        0.0
    } else {
        let mut v = 5.0;
        if elite.micro_to_macro.has_structure {
            v += 2.0;
        }
        if inter.specific_emotion_count > 0 {
            v += 1.0;
        }
        if inter.vulnerability_count >= 1 {
            v += 1.0;
        }
        v
    };
    s.set(Reflection, reflection_raw);

    // Narrative arc: macro structure.
    let mut arc_raw = if elite.micro_to_macro.has_structure {
        7.0
    } else if elite.has_transformation {
        4.0
    } else if elite.has_counter_narrative {
        2.0
    } else {
        0.0
    };
    if elite.micro_to_macro.has_structure {
        if elite.has_transformation {
            arc_raw += 1.0;
        }
        if elite.has_counter_narrative {
            arc_raw += 1.0;
        }
    }
    s.set(NarrativeArc, arc_raw);

    // Impact: quantified, unit-anchored claims.
    let impact_raw = match elite.quantified_impact_count {
        0 => 0.0,
        1 => 5.0,
        2 => 7.0,
        _ => 9.0,
    } + if elite.has_transformation && elite.quantified_impact_count > 0 {
        1.0
    } else {
        0.0
    };
    s.set(Impact, impact_raw);

    // Voice: idiosyncratic markers plus rhythm.
    let lit = &d.literary;
    let mut voice_raw = (lit.voice_marker_count as f64 * 2.0).min(6.0);
    if lit.rhythm_variety {
        voice_raw += 2.0;
    }
    if dialogue.working_count > 0 {
        voice_raw += 1.0;
    }
    s.set(Voice, voice_raw);

    // Craft floors at the literary baseline; standard structure is not zero.
    s.set(Craft, lit.sub_score.max(3.0));

    s.clamp_all();
    s
}

fn rationale_for(dim: DimensionName, d: &DetectorOutputs, score: f64) -> String {
    use DimensionName::*;
    match dim {
        SceneCraft => format!(
            "{} conjunctive scene(s) (anchor + sensory + action){}",
            d.scene.scene_count,
            if d.scene.opening_scene {
                "; opens inside a scene"
            } else {
                ""
            }
        ),
        Dialogue => format!(
            "{} of {} quoted span(s) do narrative work{}",
            d.dialogue.working_count,
            d.dialogue.span_count,
            if d.dialogue.has_confrontation {
                "; includes confrontation"
            } else {
                ""
            }
        ),
        Interiority => format!(
            "{} specific / {} generic emotion paragraph(s)",
            d.interiority.specific_emotion_count, d.interiority.generic_emotion_count
        ),
        Vulnerability => format!(
            "{} co-located vulnerability moment(s){}",
            d.interiority.vulnerability_count,
            if d.interiority.elite_vulnerability {
                "; independent moments in non-adjacent paragraphs"
            } else {
                ""
            }
        ),
        Reflection => {
            if d.elite_patterns.micro_to_macro.has_generalization {
                format!(
                    "closing generalization present (lexical overlap with opening: {:.2})",
                    d.elite_patterns.micro_to_macro.overlap
                )
            } else {
                "no closing generalization found".to_string()
            }
        }
        NarrativeArc => format!(
            "macro patterns: micro-to-macro={}, transformation={}, counter-narrative={}",
            d.elite_patterns.micro_to_macro.has_structure,
            d.elite_patterns.has_transformation,
            d.elite_patterns.has_counter_narrative
        ),
        Impact => format!(
            "{} quantified impact mention(s) with units or beneficiaries",
            d.elite_patterns.quantified_impact_count
        ),
        Voice => format!(
            "{} voice marker(s); rhythm variety={}",
            d.literary.voice_marker_count, d.literary.rhythm_variety
        ),
        Craft => format!(
            "score {:.1}: metaphor={}, innovation patterns={:?}, {} sensory modalities",
            score,
            d.literary.has_extended_metaphor,
            d.literary.innovation_patterns,
            d.literary.sensory_modality_count
        ),
    }
}

fn excerpts_for(dim: DimensionName, d: &DetectorOutputs) -> Vec<String> {
    use DimensionName::*;
    let source = match dim {
        SceneCraft => &d.scene.evidence,
        Dialogue => &d.dialogue.evidence,
        Interiority | Vulnerability => &d.interiority.evidence,
        Reflection | NarrativeArc | Impact => &d.elite_patterns.evidence,
        Voice | Craft => &d.literary.evidence,
    };
    source.iter().take(3).map(|e| e.text.clone()).collect()
}

// ---------------------------------------------------------------------------
// Scoring pass
// ---------------------------------------------------------------------------

/// Single deterministic pass: raw mapping, one rule application, clamp,
/// composite, flags, label.
pub fn score(
    text: &SourceText,
    detectors: &DetectorOutputs,
    failed_detectors: &[&'static str],
    options: &AnalyzeOptions,
    config: &RubricConfig,
) -> AnalysisReport {
    let mut scores = raw_scores(detectors);
    apply_rules(config, &mut scores);
    let composite = composite_index(config, &scores).clamp(0.0, 100.0);

    let dimension_scores = DimensionName::ALL
        .iter()
        .map(|&dim| DimensionScore {
            dimension: dim,
            score: scores.get(dim),
            evidence_excerpts: excerpts_for(dim, detectors),
            rationale: rationale_for(dim, detectors, scores.get(dim)),
        })
        .collect();

    let mut flags = Vec::new();
    if text.word_count() < MIN_WORDS {
        flags.push(Flag::TooShort);
    }
    if let Some(max) = options.max_words {
        if text.word_count() > max {
            flags.push(Flag::OverLength);
        }
    }
    if detectors.scene.scene_count == 0 {
        flags.push(Flag::NoScene);
    }
    if detectors.interiority.vulnerability_count == 0 {
        flags.push(Flag::NoVulnerability);
    }
    if detectors.elite_patterns.quantified_impact_count >= RESUME_STYLE_IMPACT_MIN
        && detectors.scene.scene_count == 0
        && detectors.interiority.vulnerability_count == 0
    {
        flags.push(Flag::ResumeStyleListing);
    }
    for &name in failed_detectors {
        flags.push(Flag::DetectorFailed(name));
    }
    if !failed_detectors.is_empty() {
        flags.push(Flag::DegradedConfidence);
    }

    AnalysisReport {
        composite_index: composite,
        impression_label: impression_label(composite),
        rubric_version: config.version().to_string(),
        essay_type: config.essay_type(),
        word_count: text.word_count(),
        dimension_scores,
        flags,
        detectors: detectors.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impression_buckets_are_ordinal() {
        assert_eq!(impression_label(90.0), "exceptional");
        assert_eq!(impression_label(70.0), "compelling");
        assert_eq!(impression_label(55.0), "promising");
        assert_eq!(impression_label(40.0), "developing");
        assert_eq!(impression_label(12.0), "foundational");
    }

    #[test]
    fn flags_serialize_as_kebab_strings() {
        let json = serde_json::to_string(&vec![
            Flag::TooShort,
            Flag::DetectorFailed("scene"),
            Flag::DegradedConfidence,
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"["too-short","detector-failed:scene","degraded-confidence"]"#
        );
    }
}
