pub mod baseline;
pub mod collaborative;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub use baseline::baseline_recommend;
pub use collaborative::{cf_recommend, SimilarityMatrix, UtilityMatrix};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_CF_WEIGHT: f64 = 0.3;

const DEFAULT_MASTERY_WEIGHT: f64 = -1.5;
const DEFAULT_COURSE_MASTERY_WEIGHT: f64 = -0.5;
const DEFAULT_DIFFICULTY_WEIGHT: f64 = 0.1;
const DEFAULT_MASTERED_THRESHOLD: f64 = 95.0;
const DEFAULT_PREREQ_THRESHOLD: f64 = 60.0;

/// Offset that sinks a row with unmet prerequisites below every unlocked row
/// when baseline scores are blended with the collaborative signal.
pub const PREREQ_PENALTY: f64 = -1000.0;

/// Guards min-max normalisation against a zero range.
pub(crate) const NORMALIZE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineWeights {
    pub mastery: f64,
    pub course_mastery: f64,
    pub difficulty: f64,
}

impl Default for BaselineWeights {
    fn default() -> Self {
        Self {
            mastery: DEFAULT_MASTERY_WEIGHT,
            course_mastery: DEFAULT_COURSE_MASTERY_WEIGHT,
            difficulty: DEFAULT_DIFFICULTY_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineConfig {
    pub weights: BaselineWeights,
    /// Topics at or above this level are never recommended.
    pub mastered_threshold: f64,
    /// Every prerequisite must reach this level for the gate to open.
    pub prereq_threshold: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            weights: BaselineWeights::default(),
            mastered_threshold: DEFAULT_MASTERED_THRESHOLD,
            prereq_threshold: DEFAULT_PREREQ_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreComponents {
    pub mastery_score: f64,
    pub course_mastery_score: f64,
    pub prereq_factor: f64,
    pub unmet_prereqs: Vec<String>,
    pub difficulty_score: f64,
    pub current_mastery: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub course: String,
    pub topic: String,
    pub mastery: f64,
    pub score: f64,
    pub prereqs_met: bool,
    pub target_mastery: f64,
    pub reason: String,
    pub score_components: ScoreComponents,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cf_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_baseline_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hybrid_score: Option<f64>,
}

impl Recommendation {
    /// Baseline score with the prerequisite penalty folded in. This is the
    /// baseline ranking key and the value hybrid blending normalises.
    pub fn penalized_score(&self) -> f64 {
        if self.prereqs_met {
            self.score
        } else {
            self.score + PREREQ_PENALTY
        }
    }

    /// The score the row was ranked by.
    pub fn final_score(&self) -> f64 {
        self.hybrid_score.unwrap_or_else(|| self.penalized_score())
    }
}

/// Stable descending sort on `key`. Equal rows keep their input order.
pub(crate) fn sort_desc_by<F>(rows: &mut [Recommendation], key: F)
where
    F: Fn(&Recommendation) -> f64,
{
    rows.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
}

pub(crate) fn min_max_normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min + NORMALIZE_EPSILON;
    values.iter().map(|v| (v - min) / range).collect()
}
