//! Deterministic rubric scoring for narrative essays.
//!
//! Five pure feature detectors extract quotable evidence from raw text; the
//! rubric scorer maps that evidence onto nine dimensions, applies a static
//! cap/boost interaction table once, and aggregates a 0-100 composite index.
//! The delta-index simulator projects the composite gain from improving any
//! single dimension, reusing the scorer's own rule application.

pub mod detectors;
pub mod rubric;
pub mod scorer;
pub mod simulate;
pub mod text;

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::debug;

pub use detectors::{DetectorOutputs, Excerpt};
pub use rubric::{
    apply_rules, composite_index, DimensionName, EssayType, InteractionRule, RubricConfig,
    RubricError, RuleKind, ScoreSet, RUBRIC_VERSION,
};
pub use scorer::{AnalysisReport, AnalyzeOptions, DimensionScore, Flag};
pub use simulate::{simulate, SimulationResult, SIMULATION_STEP};
pub use text::SourceText;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Rubric(#[from] RubricError),
}

/// Parse a loose essay-type string, failing fast on unknown values. This is
/// the only input the engine refuses; degenerate text degrades to a floor
/// report instead.
pub fn essay_type_from_str(s: &str) -> Result<EssayType, EngineError> {
    s.parse().map_err(EngineError::InvalidInput)
}

fn run_detector<T: Default>(
    name: &'static str,
    detect: impl FnOnce() -> T,
) -> (T, Option<&'static str>) {
    match catch_unwind(AssertUnwindSafe(detect)) {
        Ok(output) => (output, None),
        // A detector bug must not sink the whole report; the floor state
        // stands in and the failure is flagged.
        Err(_) => (T::default(), Some(name)),
    }
}

/// Analyze with the built-in rubric selected by `options.essay_type`.
pub fn analyze(raw: &str, options: &AnalyzeOptions) -> AnalysisReport {
    analyze_with_config(raw, options, RubricConfig::for_essay_type(options.essay_type))
}

/// Analyze against an explicit rubric. Detectors are pure and independent,
/// so they run in parallel; the scorer waits on all five at the join point.
pub fn analyze_with_config(
    raw: &str,
    options: &AnalyzeOptions,
    config: &RubricConfig,
) -> AnalysisReport {
    let text = SourceText::new(raw);
    debug!(
        words = text.word_count(),
        paragraphs = text.paragraphs().len(),
        rubric = config.version(),
        "analysis started"
    );

    let (((scene, dialogue), (interiority, elite)), literary) = rayon::join(
        || {
            rayon::join(
                || {
                    rayon::join(
                        || run_detector("scene", || detectors::scene::detect(&text)),
                        || run_detector("dialogue", || detectors::dialogue::detect(&text)),
                    )
                },
                || {
                    rayon::join(
                        || run_detector("interiority", || detectors::interiority::detect(&text)),
                        || run_detector("elite-patterns", || detectors::elite::detect(&text)),
                    )
                },
            )
        },
        || run_detector("literary", || detectors::literary::detect(&text)),
    );

    let mut failed: Vec<&'static str> = Vec::new();
    let outputs = DetectorOutputs {
        scene: scene.0,
        dialogue: dialogue.0,
        interiority: interiority.0,
        elite_patterns: elite.0,
        literary: literary.0,
    };
    for name in [scene.1, dialogue.1, interiority.1, elite.1, literary.1]
        .into_iter()
        .flatten()
    {
        failed.push(name);
    }

    let report = scorer::score(&text, &outputs, &failed, options, config);
    debug!(
        composite = report.composite_index,
        label = report.impression_label,
        flags = report.flags.len(),
        "analysis finished"
    );
    report
}
