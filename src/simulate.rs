use serde::Serialize;

use crate::rubric::{apply_rules, composite_index, DimensionName, RubricConfig};
use crate::scorer::AnalysisReport;

/// Fixed improvement step applied to one dimension per what-if.
pub const SIMULATION_STEP: f64 = 2.0;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub dimension: DimensionName,
    pub current_score: f64,
    pub projected_score: f64,
    pub delta_index: f64,
}

/// Project the composite gain from improving each dimension by the fixed
/// step, re-running the scorer's own rule application on the hypothetical
/// score set. Results sort by marginal gain, ties broken toward the lower
/// (most fixable) current score.
pub fn simulate(report: &AnalysisReport, config: &RubricConfig) -> Vec<SimulationResult> {
    let baseline = report.score_set();

    let mut results: Vec<SimulationResult> = DimensionName::ALL
        .iter()
        .map(|&dim| {
            let current = baseline.get(dim);
            let mut hypothetical = baseline;
            hypothetical.set(dim, (current + SIMULATION_STEP).min(10.0));
            apply_rules(config, &mut hypothetical);

            let projected = hypothetical.get(dim);
            let delta = (composite_index(config, &hypothetical) - report.composite_index)
                .max(0.0);
            SimulationResult {
                dimension: dim,
                current_score: current,
                projected_score: projected,
                delta_index: (delta * 10.0).round() / 10.0,
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.delta_index
            .partial_cmp(&a.delta_index)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.current_score
                    .partial_cmp(&b.current_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    results
}
