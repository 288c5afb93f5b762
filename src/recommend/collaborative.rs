//! Item-based collaborative filtering over the learner × topic mastery matrix,
//! blended into a baseline shortlist.

use std::collections::{BTreeMap, HashMap};

use crate::mastery::MasteryTable;
use crate::recommend::{min_max_normalize, sort_desc_by, Recommendation};

const SIMILARITY_EPSILON: f64 = 1e-12;

/// Dense learners × topics matrix; 0.0 where a learner has no record.
#[derive(Debug, Clone)]
pub struct UtilityMatrix {
    users: Vec<String>,
    topics: Vec<String>,
    values: Vec<f64>,
}

impl UtilityMatrix {
    /// Rows and columns are sorted by name. A learner recorded under the same
    /// topic name in several courses gets the mean of those rows.
    pub fn from_table(table: &MasteryTable) -> Self {
        let mut cells: BTreeMap<(&str, &str), (f64, usize)> = BTreeMap::new();
        for record in table.records() {
            let cell = cells
                .entry((record.user_id.as_str(), record.topic.as_str()))
                .or_insert((0.0, 0));
            cell.0 += record.mastery_level;
            cell.1 += 1;
        }

        let users: Vec<String> = table.users().into_iter().map(str::to_string).collect();
        let topics: Vec<String> = table.topics().into_iter().map(str::to_string).collect();
        let user_index: HashMap<&str, usize> =
            users.iter().enumerate().map(|(i, u)| (u.as_str(), i)).collect();
        let topic_index: HashMap<&str, usize> =
            topics.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();

        let mut values = vec![0.0; users.len() * topics.len()];
        for ((user, topic), (sum, count)) in cells {
            let row = user_index[user];
            let col = topic_index[topic];
            values[row * topics.len() + col] = sum / count as f64;
        }

        Self {
            users,
            topics,
            values,
        }
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn user_index(&self, user_id: &str) -> Option<usize> {
        self.users.iter().position(|u| u == user_id)
    }

    pub fn topic_index(&self, topic: &str) -> Option<usize> {
        self.topics.iter().position(|t| t == topic)
    }

    pub fn value(&self, user: usize, topic: usize) -> f64 {
        self.values[user * self.topics.len() + topic]
    }

    pub fn row(&self, user: usize) -> &[f64] {
        let width = self.topics.len();
        &self.values[user * width..(user + 1) * width]
    }

    fn column(&self, topic: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.users.len()).map(move |u| self.value(u, topic))
    }

    /// Cosine similarity between every pair of topic columns.
    pub fn item_similarity(&self) -> SimilarityMatrix {
        let n = self.topics.len();
        let norms: Vec<f64> = (0..n)
            .map(|t| self.column(t).map(|v| v * v).sum::<f64>().sqrt())
            .collect();

        let mut values = vec![0.0; n * n];
        for i in 0..n {
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let sim = if norms[i] < SIMILARITY_EPSILON || norms[j] < SIMILARITY_EPSILON {
                    0.0
                } else {
                    let dot: f64 = self.column(i).zip(self.column(j)).map(|(a, b)| a * b).sum();
                    (dot / (norms[i] * norms[j])).clamp(-1.0, 1.0)
                };
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        SimilarityMatrix { size: n, values }
    }
}

/// Symmetric topic × topic similarity with a unit diagonal.
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }
}

/// Similarity-weighted mastery estimate for every topic the learner has not
/// touched. Topics with no positively similar interacted topic get no entry.
pub fn predict_scores(matrix: &UtilityMatrix, user_id: &str) -> BTreeMap<String, f64> {
    let Some(user) = matrix.user_index(user_id) else {
        return BTreeMap::new();
    };

    let similarity = matrix.item_similarity();
    let row = matrix.row(user);
    let interacted: Vec<usize> = (0..row.len()).filter(|&t| row[t] > 0.0).collect();

    let mut predictions = BTreeMap::new();
    for candidate in (0..row.len()).filter(|t| !interacted.contains(t)) {
        let mut weighted_sum = 0.0;
        let mut sim_sum = 0.0;
        for &seen in &interacted {
            let sim = similarity.get(candidate, seen);
            if sim > 0.0 {
                weighted_sum += sim * row[seen];
                sim_sum += sim;
            }
        }
        if sim_sum > 0.0 {
            predictions.insert(matrix.topics()[candidate].clone(), weighted_sum / sim_sum);
        }
    }

    predictions
}

/// Re-ranks `baseline` with a collaborative signal.
///
/// Returns an empty list on cold start (empty table or unknown learner) and
/// the whole `baseline` untouched, without truncation, when no prediction
/// could be made. Baseline scores are normalised with the prerequisite
/// penalty applied and rows are ordered by hybrid score alone. Only topics
/// already in `baseline` are ever returned. `cf_weight` is clamped to [0, 1].
pub fn cf_recommend(
    table: &MasteryTable,
    user_id: &str,
    baseline: &[Recommendation],
    top_k: usize,
    cf_weight: f64,
) -> Vec<Recommendation> {
    if table.is_empty() || !table.contains_user(user_id) {
        tracing::debug!(user_id, "no mastery history, skipping collaborative filtering");
        return Vec::new();
    }

    let matrix = UtilityMatrix::from_table(table);
    let predictions = predict_scores(&matrix, user_id);
    if predictions.is_empty() {
        tracing::debug!(user_id, "no collaborative signal, falling back to baseline");
        return baseline.to_vec();
    }

    let raw: Vec<f64> = predictions.values().copied().collect();
    let cf_scores: HashMap<&str, f64> = predictions
        .keys()
        .map(String::as_str)
        .zip(min_max_normalize(&raw))
        .collect();

    let baseline_scores: Vec<f64> = baseline.iter().map(Recommendation::penalized_score).collect();
    let normalized_baseline = min_max_normalize(&baseline_scores);
    let weight = cf_weight.clamp(0.0, 1.0);

    let mut hybrid: Vec<Recommendation> = baseline
        .iter()
        .zip(normalized_baseline)
        .map(|(rec, norm)| {
            let cf = cf_scores.get(rec.topic.as_str()).copied().unwrap_or(0.0);
            let mut row = rec.clone();
            row.cf_score = Some(cf);
            row.normalized_baseline_score = Some(norm);
            row.hybrid_score = Some((1.0 - weight) * norm + weight * cf);
            row
        })
        .collect();

    sort_desc_by(&mut hybrid, Recommendation::final_score);
    hybrid.truncate(top_k);

    tracing::debug!(
        user_id,
        predictions = predictions.len(),
        returned = hybrid.len(),
        "hybrid recommendations computed"
    );

    hybrid
}
