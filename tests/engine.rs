use essay_lens::{
    analyze, analyze_with_config, AnalyzeOptions, EssayType, Flag, RubricConfig, SourceText,
};

const STRONG_ESSAY: &str = "\
Three days before regionals, the stench of chlorine clung to my towel as I stared at the whiteboard of seed times. My name sat in lane eight. I froze.

\"You're not ready,\" Coach said, tapping the clipboard. \"No. I can't lose my spot,\" I said, and the words sounded smaller than I meant them to.

That night, I felt like a fraud. My practice-test grade had dropped to 19%, and I couldn't explain the gap to anyone on the roster.

So I rebuilt my mornings. I taught the novice lane for two hours before school, and by March our relay had twelve swimmers who could read a pace clock without me calling splits. The team used to scatter at the first whistle, then drift home without a word to each other.

I was ashamed that I couldn't fix it alone, and I still keep that printout folded in my swim bag where the zipper sticks.

I realized that leading isn't about hiding the weak lap. The scoreboard still hums in my head some mornings, but I understand now that a team moves at the speed of its most honest swimmer.";

const WEAK_ESSAY: &str = "\
I have always been passionate about helping others and making a difference in the lives of the people around me. Throughout high school I participated in several clubs and organizations that allowed me to develop leadership skills and grow as a person in meaningful ways.

Volunteering has shown me the value of dedication and hard work. Whenever I contribute my time, I feel that I am building character and becoming a better version of myself, which will serve me well in college and beyond.

These experiences have shaped who I am and taught me the value of perseverance. I learned the importance of giving back, and I will carry these lessons with me as I continue to pursue my goals and help those around me succeed.";

#[test]
fn analysis_is_deterministic() {
    let options = AnalyzeOptions::default();
    let first = serde_json::to_string(&analyze(STRONG_ESSAY, &options)).unwrap();
    let second = serde_json::to_string(&analyze(STRONG_ESSAY, &options)).unwrap();
    assert_eq!(first, second, "same input must yield byte-identical reports");
}

#[test]
fn scores_stay_in_declared_ranges() {
    let options = AnalyzeOptions::default();
    for text in [STRONG_ESSAY, WEAK_ESSAY, "", "   ", "One word.", "héllo — “quoted” text?"] {
        let report = analyze(text, &options);
        assert!(
            (0.0..=100.0).contains(&report.composite_index),
            "composite {} out of range for {text:?}",
            report.composite_index
        );
        for ds in &report.dimension_scores {
            assert!(
                (0.0..=10.0).contains(&ds.score),
                "{} scored {} for {text:?}",
                ds.dimension,
                ds.score
            );
        }
    }
}

#[test]
fn empty_input_floors_without_error() {
    let options = AnalyzeOptions::default();
    for text in ["", "   "] {
        let report = analyze(text, &options);
        assert!(report.flags.contains(&Flag::TooShort), "missing too-short for {text:?}");
        for ds in &report.dimension_scores {
            let floor = if ds.dimension.as_str() == "craft" { 3.0 } else { 0.0 };
            assert_eq!(
                ds.score, floor,
                "{} should sit at its floor on empty input",
                ds.dimension
            );
        }
    }
}

#[test]
fn scene_rule_is_conjunctive() {
    // Sensory word plus action verb, but no temporal or spatial anchor.
    let without_anchor = "The stench of chlorine filled the air as I stared at the seed list.";
    let out = essay_lens::detectors::scene::detect(&SourceText::new(without_anchor));
    assert_eq!(out.scene_count, 0, "two of three anchors must not count");

    let with_anchor = format!("Three days before regionals, {}", without_anchor);
    let out = essay_lens::detectors::scene::detect(&SourceText::new(&with_anchor));
    assert_eq!(out.scene_count, 1, "adding the anchor completes the conjunction");
}

#[test]
fn vulnerability_requires_same_paragraph_colocation() {
    let distant = "I was nervous walking into the gym that week.\n\n\
                   Practice continued as it always had.\n\n\
                   Long ago I failed a tryout, which my family still jokes about.";
    let out = essay_lens::detectors::interiority::detect(&SourceText::new(distant));
    assert_eq!(out.vulnerability_count, 0);

    let colocated =
        "I was ashamed when I failed the qualifier, and ashamed again explaining why I couldn't fix it.";
    let out = essay_lens::detectors::interiority::detect(&SourceText::new(colocated));
    assert_eq!(out.vulnerability_count, 1, "one paragraph is one moment");
}

#[test]
fn strong_essay_lands_in_upper_third() {
    let report = analyze(STRONG_ESSAY, &AnalyzeOptions::default());
    assert!(
        report.detectors.elite_patterns.micro_to_macro.has_structure,
        "opening scene plus closing generalization should read as micro-to-macro"
    );
    assert!(report.detectors.interiority.vulnerability_count >= 1);
    assert!(
        report.composite_index > 66.6,
        "expected upper third, got {}",
        report.composite_index
    );
    assert!(matches!(
        report.impression_label,
        "compelling" | "exceptional"
    ));
}

#[test]
fn generic_essay_lands_in_lower_third_with_no_scene_flag() {
    let report = analyze(WEAK_ESSAY, &AnalyzeOptions::default());
    assert_eq!(report.detectors.scene.scene_count, 0);
    assert!(!report.detectors.dialogue.has_dialogue);
    assert!(
        report.composite_index < 33.4,
        "expected lower third, got {}",
        report.composite_index
    );
    assert!(report.flags.contains(&Flag::NoScene));
}

#[test]
fn max_words_only_adds_a_flag() {
    let base = analyze(STRONG_ESSAY, &AnalyzeOptions::default());
    let limited = analyze(
        STRONG_ESSAY,
        &AnalyzeOptions {
            max_words: Some(50),
            essay_type: EssayType::PersonalStatement,
        },
    );
    assert!(limited.flags.contains(&Flag::OverLength));
    assert_eq!(
        base.composite_index, limited.composite_index,
        "the word limit must not change detector behavior or scores"
    );
}

#[test]
fn essay_type_selects_a_different_weight_table() {
    let personal = analyze(STRONG_ESSAY, &AnalyzeOptions::default());
    let activity = analyze(
        STRONG_ESSAY,
        &AnalyzeOptions {
            max_words: None,
            essay_type: EssayType::ActivityDescription,
        },
    );
    assert_ne!(
        personal.composite_index, activity.composite_index,
        "weight tables differ, so the same evidence should aggregate differently"
    );
}

#[test]
fn explicit_config_matches_builtin() {
    let options = AnalyzeOptions::default();
    let config = RubricConfig::for_essay_type(EssayType::PersonalStatement);
    let via_builtin = serde_json::to_string(&analyze(STRONG_ESSAY, &options)).unwrap();
    let via_explicit =
        serde_json::to_string(&analyze_with_config(STRONG_ESSAY, &options, config)).unwrap();
    assert_eq!(via_builtin, via_explicit);
}

#[test]
fn report_json_carries_all_detector_outputs() {
    let report = analyze(STRONG_ESSAY, &AnalyzeOptions::default());
    let json = serde_json::to_string_pretty(&report).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(parsed.get("composite_index").is_some());
    assert!(parsed.get("impression_label").is_some());
    assert!(parsed.get("dimension_scores").is_some());
    assert!(parsed.get("flags").is_some());
    let detectors = parsed.get("detectors").unwrap();
    for key in ["scene", "dialogue", "interiority", "elite_patterns", "literary"] {
        assert!(detectors.get(key).is_some(), "missing detector output {key}");
    }
}

#[test]
fn evidence_excerpts_quote_the_source() {
    let report = analyze(STRONG_ESSAY, &AnalyzeOptions::default());
    for ds in &report.dimension_scores {
        for excerpt in &ds.evidence_excerpts {
            let literal = excerpt.trim_end_matches("...");
            assert!(
                STRONG_ESSAY.contains(literal) || excerpt.contains(" ... "),
                "excerpt must quote the source: {excerpt:?}"
            );
        }
    }
}
