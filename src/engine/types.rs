use crate::config::AnalysisConfig;
use crate::model::DrugClass;
use crate::stats::effect_size::EffectSizeClass;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    None,
}

impl Direction {
    /// Correlations inside the +/-0.05 dead band report no direction.
    pub fn from_r(r: f64) -> Self {
        if r > 0.05 {
            Direction::Positive
        } else if r < -0.05 {
            Direction::Negative
        } else {
            Direction::None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseResponsePattern {
    Linear,
    Quadratic,
    InvertedU,
    None,
}

/// Mean outcome at one distinct positive dose level.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseLevel {
    pub dose_mg: f64,
    pub mean_outcome: f64,
    pub nights: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseResponseResult {
    pub levels: Vec<DoseLevel>,
    /// Correlation between dose and outcome over positive-dose nights only.
    pub dose_correlation: f64,
    pub p_value: f64,
    pub pattern: DoseResponsePattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_dose: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagPoint {
    pub lag_days: usize,
    pub r: f64,
    pub p_value: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LagResult {
    pub lags: Vec<LagPoint>,
    /// Day offset with the strongest |r|; first lag wins ties.
    pub optimal_lag: usize,
    pub optimal_r: f64,
}

/// One medication x metric correlation test.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub medication: String,
    pub drug_class: DrugClass,
    pub metric: String,
    pub pearson_r: f64,
    pub spearman_rho: f64,
    pub p_value: f64,
    /// Benjamini-Hochberg adjusted p across all pairs in the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_value: Option<f64>,
    pub is_significant: bool,
    pub is_highly_significant: bool,
    pub cohens_d: f64,
    pub effect_size: EffectSizeClass,
    pub ci_low: f64,
    pub ci_high: f64,
    pub sample_size: usize,
    pub nights_with: usize,
    pub nights_without: usize,
    pub direction: Direction,
    pub mean_with: f64,
    pub mean_without: f64,
    pub mean_difference: f64,
    /// 0.0 when the without-group mean is exactly 0.
    pub percent_change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_response: Option<DoseResponseResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lag: Option<LagResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAnalysis {
    pub medication: String,
    pub drug_class: DrugClass,
    /// Nights the medication was taken, over aligned data.
    pub occurrence_count: usize,
    pub results: Vec<CorrelationResult>,
    pub significant: Vec<CorrelationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Synergistic,
    Antagonistic,
}

/// Non-additive effect of an unordered medication pair on one metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionResult {
    pub medication_a: String,
    pub medication_b: String,
    pub metric: String,
    pub baseline: f64,
    pub effect_a: f64,
    pub effect_b: f64,
    pub combined_effect: f64,
    /// combined - (effect_a + effect_b); positive means synergy.
    pub interaction_effect: f64,
    pub kind: InteractionKind,
    /// Welch's t-test of the both-taken group against the additive
    /// expectation.
    pub p_value: f64,
    pub is_significant: bool,
    pub nights_both: usize,
    pub nights_neither: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResults {
    /// Nights with sleep data (= aligned data points).
    pub total_nights: usize,
    /// Distinct medications seen in aligned data.
    pub total_medications: usize,
    /// Medications that met the occurrence floor and were analyzed.
    pub analyzed_medications: usize,
    pub medications: Vec<MedicationAnalysis>,
    /// All significant pairs, descending |pearson r|, p-value tie-break.
    pub significant: Vec<CorrelationResult>,
    pub top_positive: Vec<CorrelationResult>,
    pub top_negative: Vec<CorrelationResult>,
    pub interactions: Vec<InteractionResult>,
    pub config: AnalysisConfig,
}
