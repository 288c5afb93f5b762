use crate::catalog::{CatalogError, TopicCatalog, TopicMeta, MAX_DIFFICULTY};
use crate::mastery::{MasteryTable, UserMastery};
use crate::recommend::{sort_desc_by, BaselineConfig, Recommendation, ScoreComponents};

const LOW_MASTERY_SCORE: f64 = 0.5;
const CHALLENGING_DIFFICULTY_SCORE: f64 = 0.3;

/// Rule-based ranking over every catalog topic the learner has not mastered.
///
/// `score` carries the weighted mastery and difficulty features only. Rows
/// are ordered by [`Recommendation::penalized_score`], which sinks topics
/// with unmet prerequisites below every unlocked topic.
pub fn baseline_recommend(
    catalog: &TopicCatalog,
    table: &MasteryTable,
    user_id: &str,
    top_k: usize,
    config: &BaselineConfig,
) -> Result<Vec<Recommendation>, CatalogError> {
    let user = table.for_user(user_id);
    let weights = &config.weights;
    let mut candidates = Vec::new();

    for (course, topic) in catalog.iter_topics() {
        let current_mastery = user.mastery(course, topic);
        if current_mastery >= config.mastered_threshold {
            continue;
        }

        let meta = catalog.metadata_of(topic)?;
        let mastery_score = 1.0 - current_mastery / 100.0;
        let course_mastery_score = 1.0 - user.course_average(course) / 100.0;
        let unmet_prereqs = unmet_prerequisites(catalog, &user, meta, config.prereq_threshold)?;
        let prereq_factor = if unmet_prereqs.is_empty() { 1.0 } else { 0.0 };
        let difficulty_score = f64::from(meta.difficulty) / f64::from(MAX_DIFFICULTY);

        let score = weights.mastery * mastery_score
            + weights.course_mastery * course_mastery_score
            + weights.difficulty * difficulty_score;

        let components = ScoreComponents {
            mastery_score,
            course_mastery_score,
            prereq_factor,
            unmet_prereqs,
            difficulty_score,
            current_mastery,
        };

        candidates.push(Recommendation {
            course: course.to_string(),
            topic: topic.to_string(),
            mastery: current_mastery,
            score,
            prereqs_met: prereq_factor > 0.0,
            target_mastery: suggest_target(current_mastery),
            reason: generate_reason(&components),
            score_components: components,
            cf_score: None,
            normalized_baseline_score: None,
            hybrid_score: None,
        });
    }

    sort_desc_by(&mut candidates, Recommendation::penalized_score);
    candidates.truncate(top_k);

    tracing::debug!(
        user_id,
        returned = candidates.len(),
        "baseline recommendations computed"
    );

    Ok(candidates)
}

/// Prerequisites below `threshold`, in declaration order.
pub fn unmet_prerequisites(
    catalog: &TopicCatalog,
    user: &UserMastery<'_>,
    meta: &TopicMeta,
    threshold: f64,
) -> Result<Vec<String>, CatalogError> {
    let mut unmet = Vec::new();
    for prereq in &meta.prerequisites {
        let course = catalog.course_of(prereq)?;
        if user.mastery(course, prereq) < threshold {
            unmet.push(prereq.clone());
        }
    }
    Ok(unmet)
}

/// Next milestone for a learner currently at `mastery`.
pub fn suggest_target(mastery: f64) -> f64 {
    if mastery < 40.0 {
        70.0
    } else if mastery < 75.0 {
        85.0
    } else {
        95.0
    }
}

pub fn generate_reason(components: &ScoreComponents) -> String {
    let mut reasons = Vec::new();

    if components.mastery_score > LOW_MASTERY_SCORE {
        reasons.push(format!("Low mastery ({})", components.current_mastery));
    }
    if components.prereq_factor > 0.0 {
        reasons.push("Prerequisites met".to_string());
    } else if !components.unmet_prereqs.is_empty() {
        reasons.push(format!(
            "Missing prereqs: {}",
            components.unmet_prereqs.join(", ")
        ));
    }
    if components.difficulty_score > CHALLENGING_DIFFICULTY_SCORE {
        reasons.push("Challenging topic".to_string());
    }

    if reasons.is_empty() {
        "A good next step.".to_string()
    } else {
        reasons.join("; ")
    }
}
