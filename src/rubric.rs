use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// The closed set of rubric dimensions. Loose external names resolve through
/// `from_alias`; nothing else in the crate keeps its own name table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DimensionName {
    SceneCraft,
    Dialogue,
    Interiority,
    Vulnerability,
    Reflection,
    NarrativeArc,
    Impact,
    Voice,
    Craft,
}

impl DimensionName {
    pub const ALL: [DimensionName; 9] = [
        DimensionName::SceneCraft,
        DimensionName::Dialogue,
        DimensionName::Interiority,
        DimensionName::Vulnerability,
        DimensionName::Reflection,
        DimensionName::NarrativeArc,
        DimensionName::Impact,
        DimensionName::Voice,
        DimensionName::Craft,
    ];

    pub const COUNT: usize = Self::ALL.len();

    fn index(self) -> usize {
        Self::ALL.iter().position(|&d| d == self).unwrap()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DimensionName::SceneCraft => "scene-craft",
            DimensionName::Dialogue => "dialogue",
            DimensionName::Interiority => "interiority",
            DimensionName::Vulnerability => "vulnerability",
            DimensionName::Reflection => "reflection",
            DimensionName::NarrativeArc => "narrative-arc",
            DimensionName::Impact => "impact",
            DimensionName::Voice => "voice",
            DimensionName::Craft => "craft",
        }
    }

    /// Resolve a loosely-spelled external name to the canonical dimension.
    pub fn from_alias(name: &str) -> Option<Self> {
        let key = name.trim().to_lowercase().replace(['_', ' '], "-");
        let resolved = match key.as_str() {
            "scene" | "scenes" | "scene-craft" | "scenecraft" => DimensionName::SceneCraft,
            "dialogue" | "dialog" => DimensionName::Dialogue,
            "interiority" | "emotion" | "inner-life" => DimensionName::Interiority,
            "vulnerability" | "openness" => DimensionName::Vulnerability,
            "reflection" | "insight" => DimensionName::Reflection,
            "narrative-arc" | "structural-arc" | "arc" | "structure" => DimensionName::NarrativeArc,
            "impact" | "quantified-impact" | "service" => DimensionName::Impact,
            "voice" | "authenticity" => DimensionName::Voice,
            "craft" | "literary" | "sophistication" => DimensionName::Craft,
            _ => return None,
        };
        Some(resolved)
    }
}

impl fmt::Display for DimensionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One score per dimension, always kept inside [0, 10].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSet([f64; DimensionName::COUNT]);

impl ScoreSet {
    pub fn new() -> Self {
        Self([0.0; DimensionName::COUNT])
    }

    pub fn get(&self, dim: DimensionName) -> f64 {
        self.0[dim.index()]
    }

    pub fn set(&mut self, dim: DimensionName, value: f64) {
        self.0[dim.index()] = value;
    }

    pub fn clamp_all(&mut self) {
        for v in &mut self.0 {
            *v = v.clamp(0.0, 10.0);
        }
    }
}

impl Default for ScoreSet {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Essay types
// ---------------------------------------------------------------------------

/// Selects which weight table applies. This is the only configuration branch
/// in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EssayType {
    #[default]
    PersonalStatement,
    ActivityDescription,
    Supplemental,
}

impl FromStr for EssayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "personal-statement" | "personal" => Ok(EssayType::PersonalStatement),
            "activity-description" | "activity" => Ok(EssayType::ActivityDescription),
            "supplemental" | "supplement" => Ok(EssayType::Supplemental),
            other => Err(format!("unknown essay type '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Interaction rules
// ---------------------------------------------------------------------------

/// Cap and boost effects are expressed as min/max so that re-applying the
/// table to an already-adjusted score set is a no-op.
#[derive(Debug, Clone, Copy)]
pub enum RuleKind {
    /// Fires when the source scores below `below`; target cannot exceed
    /// `ceiling`.
    Cap { below: f64, ceiling: f64 },
    /// Fires when the source (and co-source, if any) reach `at_least`; target
    /// is lifted to at least `floor`.
    Boost { at_least: f64, floor: f64 },
}

#[derive(Debug, Clone)]
pub struct InteractionRule {
    pub source: DimensionName,
    pub co_source: Option<DimensionName>,
    pub target: DimensionName,
    pub kind: RuleKind,
}

impl InteractionRule {
    pub fn cap(source: DimensionName, below: f64, target: DimensionName, ceiling: f64) -> Self {
        Self {
            source,
            co_source: None,
            target,
            kind: RuleKind::Cap { below, ceiling },
        }
    }

    pub fn boost(
        source: DimensionName,
        co_source: DimensionName,
        at_least: f64,
        target: DimensionName,
        floor: f64,
    ) -> Self {
        Self {
            source,
            co_source: Some(co_source),
            target,
            kind: RuleKind::Boost { at_least, floor },
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("dimension {0} has no weight in rubric '{1}'")]
    MissingWeight(DimensionName, String),
    #[error("dimension {0} is weighted more than once in rubric '{1}'")]
    DuplicateWeight(DimensionName, String),
    #[error("weights in rubric '{0}' sum to {1}, expected 1.0")]
    WeightSum(String, f64),
    #[error("interaction rules in rubric '{0}' form a cycle through {1}")]
    RuleCycle(String, DimensionName),
}

const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// A versioned rubric: per-dimension weights plus the interaction-rule table.
/// Always constructed through `new`, which runs the load-time self-checks;
/// per-call code never validates.
#[derive(Debug, Clone)]
pub struct RubricConfig {
    version: String,
    essay_type: EssayType,
    weights: [f64; DimensionName::COUNT],
    rules: Vec<InteractionRule>,
}

impl RubricConfig {
    pub fn new(
        version: impl Into<String>,
        essay_type: EssayType,
        weight_table: &[(DimensionName, f64)],
        rules: Vec<InteractionRule>,
    ) -> Result<Self, RubricError> {
        let version = version.into();
        let mut weights = [f64::NAN; DimensionName::COUNT];
        for &(dim, w) in weight_table {
            let slot = &mut weights[dim.index()];
            if !slot.is_nan() {
                return Err(RubricError::DuplicateWeight(dim, version));
            }
            *slot = w;
        }
        for (i, w) in weights.iter().enumerate() {
            if w.is_nan() {
                return Err(RubricError::MissingWeight(DimensionName::ALL[i], version));
            }
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(RubricError::WeightSum(version, sum));
        }

        let config = Self {
            version,
            essay_type,
            weights,
            rules,
        };
        config.assert_acyclic()?;
        tracing::debug!(version = %config.version, rules = config.rules.len(), "rubric validated");
        Ok(config)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn essay_type(&self) -> EssayType {
        self.essay_type
    }

    pub fn weight(&self, dim: DimensionName) -> f64 {
        self.weights[dim.index()]
    }

    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    /// Sources must never be reachable from their own targets; the scorer
    /// applies the table once and does not iterate to a fixed point.
    fn assert_acyclic(&self) -> Result<(), RubricError> {
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for rule in &self.rules {
            edges.push((rule.source.index(), rule.target.index()));
            if let Some(co) = rule.co_source {
                edges.push((co.index(), rule.target.index()));
            }
        }

        // DFS cycle detection over the small dimension graph.
        let n = DimensionName::COUNT;
        let mut state = vec![0u8; n]; // 0 unvisited, 1 on stack, 2 done
        fn visit(
            node: usize,
            edges: &[(usize, usize)],
            state: &mut [u8],
        ) -> Option<usize> {
            state[node] = 1;
            for &(from, to) in edges {
                if from != node {
                    continue;
                }
                match state[to] {
                    1 => return Some(to),
                    0 => {
                        if let Some(c) = visit(to, edges, state) {
                            return Some(c);
                        }
                    }
                    _ => {}
                }
            }
            state[node] = 2;
            None
        }
        for start in 0..n {
            if state[start] == 0 {
                if let Some(offender) = visit(start, &edges, &mut state) {
                    return Err(RubricError::RuleCycle(
                        self.version.clone(),
                        DimensionName::ALL[offender],
                    ));
                }
            }
        }
        Ok(())
    }

    /// The built-in validated rubric for an essay type.
    pub fn for_essay_type(essay_type: EssayType) -> &'static RubricConfig {
        match essay_type {
            EssayType::PersonalStatement => &PERSONAL_STATEMENT,
            EssayType::ActivityDescription => &ACTIVITY_DESCRIPTION,
            EssayType::Supplemental => &SUPPLEMENTAL,
        }
    }
}

// ---------------------------------------------------------------------------
// Rule application (shared by scorer and simulator)
// ---------------------------------------------------------------------------

/// Apply the interaction-rule table exactly once, in table order, then clamp
/// every dimension to [0, 10]. Both the live scorer and the delta-index
/// simulator call this same function; there is no second implementation.
pub fn apply_rules(config: &RubricConfig, scores: &mut ScoreSet) {
    for rule in &config.rules {
        let source = scores.get(rule.source);
        match rule.kind {
            RuleKind::Cap { below, ceiling } => {
                if source < below {
                    let t = scores.get(rule.target);
                    scores.set(rule.target, t.min(ceiling));
                }
            }
            RuleKind::Boost { at_least, floor } => {
                let co_ok = rule
                    .co_source
                    .map(|co| scores.get(co) >= at_least)
                    .unwrap_or(true);
                if source >= at_least && co_ok {
                    let t = scores.get(rule.target);
                    scores.set(rule.target, t.max(floor));
                }
            }
        }
    }
    scores.clamp_all();
}

/// Weighted composite on the 0..100 scale, rounded to one decimal.
pub fn composite_index(config: &RubricConfig, scores: &ScoreSet) -> f64 {
    let raw: f64 = DimensionName::ALL
        .iter()
        .map(|&d| config.weight(d) * scores.get(d) * 10.0)
        .sum();
    (raw * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Built-in rubrics
// ---------------------------------------------------------------------------

pub const RUBRIC_VERSION: &str = "2024.2";

fn standard_rules() -> Vec<InteractionRule> {
    use DimensionName::*;
    vec![
        // Ungrounded introspection reads as unconvincing.
        InteractionRule::cap(SceneCraft, 4.0, Interiority, 8.0),
        InteractionRule::cap(SceneCraft, 4.0, Reflection, 8.0),
        InteractionRule::cap(SceneCraft, 3.0, Craft, 7.0),
        // Lesson-claiming without admitted risk.
        InteractionRule::cap(Vulnerability, 3.0, Reflection, 7.0),
        // Reinforcing pairs.
        InteractionRule::boost(Interiority, Reflection, 8.0, NarrativeArc, 9.0),
        InteractionRule::boost(SceneCraft, Vulnerability, 8.0, Voice, 8.0),
    ]
}

fn built_in(essay_type: EssayType, weight_table: &[(DimensionName, f64)]) -> RubricConfig {
    RubricConfig::new(RUBRIC_VERSION, essay_type, weight_table, standard_rules())
        .expect("built-in rubric table failed validation")
}

static PERSONAL_STATEMENT: Lazy<RubricConfig> = Lazy::new(|| {
    use DimensionName::*;
    built_in(
        EssayType::PersonalStatement,
        &[
            (SceneCraft, 0.14),
            (Dialogue, 0.08),
            (Interiority, 0.12),
            (Vulnerability, 0.14),
            (Reflection, 0.12),
            (NarrativeArc, 0.14),
            (Impact, 0.08),
            (Voice, 0.08),
            (Craft, 0.10),
        ],
    )
});

static ACTIVITY_DESCRIPTION: Lazy<RubricConfig> = Lazy::new(|| {
    use DimensionName::*;
    built_in(
        EssayType::ActivityDescription,
        &[
            (SceneCraft, 0.10),
            (Dialogue, 0.04),
            (Interiority, 0.08),
            (Vulnerability, 0.08),
            (Reflection, 0.12),
            (NarrativeArc, 0.14),
            (Impact, 0.22),
            (Voice, 0.10),
            (Craft, 0.12),
        ],
    )
});

static SUPPLEMENTAL: Lazy<RubricConfig> = Lazy::new(|| {
    use DimensionName::*;
    built_in(
        EssayType::Supplemental,
        &[
            (SceneCraft, 0.12),
            (Dialogue, 0.06),
            (Interiority, 0.10),
            (Vulnerability, 0.10),
            (Reflection, 0.14),
            (NarrativeArc, 0.12),
            (Impact, 0.10),
            (Voice, 0.12),
            (Craft, 0.14),
        ],
    )
});

#[cfg(test)]
mod tests {
    use super::*;
    use DimensionName::*;

    #[test]
    fn built_in_rubrics_validate() {
        for t in [
            EssayType::PersonalStatement,
            EssayType::ActivityDescription,
            EssayType::Supplemental,
        ] {
            let config = RubricConfig::for_essay_type(t);
            assert_eq!(config.essay_type(), t);
            let sum: f64 = DimensionName::ALL.iter().map(|&d| config.weight(d)).sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn cycle_is_rejected_at_load() {
        let weights: Vec<(DimensionName, f64)> = DimensionName::ALL
            .iter()
            .map(|&d| (d, 1.0 / DimensionName::COUNT as f64))
            .collect();
        let rules = vec![
            InteractionRule::cap(SceneCraft, 4.0, Voice, 8.0),
            InteractionRule::cap(Voice, 4.0, SceneCraft, 8.0),
        ];
        let err = RubricConfig::new("test", EssayType::PersonalStatement, &weights, rules)
            .unwrap_err();
        assert!(matches!(err, RubricError::RuleCycle(_, _)));
    }

    #[test]
    fn missing_weight_is_rejected() {
        let err = RubricConfig::new(
            "test",
            EssayType::PersonalStatement,
            &[(SceneCraft, 1.0)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RubricError::MissingWeight(_, _)));
    }

    #[test]
    fn rule_application_is_idempotent() {
        let config = RubricConfig::for_essay_type(EssayType::PersonalStatement);
        let mut scores = ScoreSet::new();
        scores.set(SceneCraft, 2.0);
        scores.set(Interiority, 9.5);
        scores.set(Reflection, 9.0);
        scores.set(NarrativeArc, 5.0);
        apply_rules(config, &mut scores);
        let once = scores;
        apply_rules(config, &mut scores);
        assert_eq!(once, scores);
    }

    #[test]
    fn weak_scene_caps_introspection() {
        let config = RubricConfig::for_essay_type(EssayType::PersonalStatement);
        let mut scores = ScoreSet::new();
        scores.set(SceneCraft, 2.0);
        scores.set(Vulnerability, 5.0);
        scores.set(Interiority, 9.5);
        scores.set(Reflection, 10.0);
        apply_rules(config, &mut scores);
        assert_eq!(scores.get(Interiority), 8.0);
        assert_eq!(scores.get(Reflection), 8.0);
    }

    #[test]
    fn reinforcing_pair_lifts_arc() {
        let config = RubricConfig::for_essay_type(EssayType::PersonalStatement);
        let mut scores = ScoreSet::new();
        scores.set(SceneCraft, 8.0);
        scores.set(Vulnerability, 5.0);
        scores.set(Interiority, 8.5);
        scores.set(Reflection, 8.0);
        scores.set(NarrativeArc, 6.0);
        apply_rules(config, &mut scores);
        assert_eq!(scores.get(NarrativeArc), 9.0);
    }

    #[test]
    fn alias_table_resolves_loose_names() {
        assert_eq!(
            DimensionName::from_alias("Structural Arc"),
            Some(NarrativeArc)
        );
        assert_eq!(DimensionName::from_alias("scene_craft"), Some(SceneCraft));
        assert_eq!(DimensionName::from_alias("unknown-axis"), None);
    }
}
