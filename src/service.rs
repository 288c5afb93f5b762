use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, TopicCatalog};
use crate::db::{ProgressStore, StoreError};
use crate::feedback::{FeedbackEntry, FeedbackKind};
use crate::mastery::MasteryTable;
use crate::recommend::{baseline_recommend, cf_recommend, BaselineConfig, Recommendation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingMethod {
    #[default]
    Baseline,
    Hybrid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedRecommendations {
    /// The ranking that produced `recommendations`.
    pub method: RankingMethod,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cf weight must be within [0, 1], got {0}")]
    InvalidCfWeight(f64),
    #[error("mastery level must be a finite number, got {0}")]
    InvalidMastery(f64),
}

/// Scoring entry points over a shared catalog and the progress store.
#[derive(Clone)]
pub struct RecommendationService {
    catalog: Arc<TopicCatalog>,
    store: ProgressStore,
    config: BaselineConfig,
}

impl RecommendationService {
    pub fn new(catalog: Arc<TopicCatalog>, store: ProgressStore, config: BaselineConfig) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    pub async fn snapshot(&self) -> MasteryTable {
        self.store.load_progress_or_empty().await
    }

    pub async fn compute_baseline_recommendations(
        &self,
        user_id: &str,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let table = self.snapshot().await;
        self.baseline_for(&table, user_id, top_k)
    }

    pub async fn compute_hybrid_recommendations(
        &self,
        user_id: &str,
        baseline_recs: &[Recommendation],
        top_k: usize,
        cf_weight: f64,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        let table = self.snapshot().await;
        self.hybrid_for(&table, user_id, baseline_recs, top_k, cf_weight)
    }

    /// Baseline over `baseline_pool` candidates then CF re-ranking, both on
    /// the same snapshot. Falls back to the baseline head when CF has nothing
    /// to say about this learner. Always returns at most `top_k` rows.
    pub async fn compute_blended_recommendations(
        &self,
        user_id: &str,
        baseline_pool: usize,
        top_k: usize,
        cf_weight: f64,
    ) -> Result<RankedRecommendations, RecommendError> {
        let table = self.snapshot().await;
        let baseline = self.baseline_for(&table, user_id, baseline_pool.max(top_k))?;
        let hybrid = self.hybrid_for(&table, user_id, &baseline, top_k, cf_weight)?;

        if hybrid.is_empty() {
            tracing::debug!(user_id, "cold start, serving baseline ranking");
            return Ok(RankedRecommendations {
                method: RankingMethod::Baseline,
                recommendations: baseline.into_iter().take(top_k).collect(),
            });
        }

        let method = if hybrid.iter().any(|r| r.hybrid_score.is_some()) {
            RankingMethod::Hybrid
        } else {
            RankingMethod::Baseline
        };
        let mut recommendations = hybrid;
        recommendations.truncate(top_k);
        Ok(RankedRecommendations {
            method,
            recommendations,
        })
    }

    pub fn baseline_for(
        &self,
        table: &MasteryTable,
        user_id: &str,
        top_k: usize,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        Ok(baseline_recommend(
            &self.catalog,
            table,
            user_id,
            top_k,
            &self.config,
        )?)
    }

    pub fn hybrid_for(
        &self,
        table: &MasteryTable,
        user_id: &str,
        baseline_recs: &[Recommendation],
        top_k: usize,
        cf_weight: f64,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        if !(0.0..=1.0).contains(&cf_weight) {
            return Err(RecommendError::InvalidCfWeight(cf_weight));
        }
        Ok(cf_recommend(table, user_id, baseline_recs, top_k, cf_weight))
    }

    pub async fn record_feedback(
        &self,
        user_id: &str,
        topic: &str,
        kind: FeedbackKind,
    ) -> Result<FeedbackEntry, RecommendError> {
        let entry = self.store.record_feedback(user_id, topic, kind).await?;
        tracing::info!(user_id, topic, feedback = %entry.kind, "feedback recorded");
        Ok(entry)
    }

    /// 0.0 when the learner has no record for the topic.
    pub async fn progress_for(
        &self,
        user_id: &str,
        course: &str,
        topic: &str,
    ) -> Result<f64, RecommendError> {
        self.ensure_listed(course, topic)?;
        Ok(self.store.get_progress(user_id, course, topic).await?)
    }

    /// Stores `mastery_level` clamped to [0, 100] and returns the stored value.
    pub async fn update_progress(
        &self,
        user_id: &str,
        course: &str,
        topic: &str,
        mastery_level: f64,
    ) -> Result<f64, RecommendError> {
        if !mastery_level.is_finite() {
            return Err(RecommendError::InvalidMastery(mastery_level));
        }
        self.ensure_listed(course, topic)?;

        let stored = self
            .store
            .upsert_progress(user_id, course, topic, mastery_level)
            .await?;
        tracing::info!(user_id, course, topic, mastery = stored, "progress updated");
        Ok(stored)
    }

    fn ensure_listed(&self, course: &str, topic: &str) -> Result<(), RecommendError> {
        let topics = self
            .catalog
            .topics_of(course)
            .ok_or_else(|| CatalogError::UnknownCourse(course.to_string()))?;
        if !topics.iter().any(|t| t == topic) {
            return Err(CatalogError::UnknownTopic(topic.to_string()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn service() -> (RecommendationService, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::open(&dir.path().join("progress.db"))
            .await
            .unwrap();
        let catalog = Arc::new(TopicCatalog::builtin().unwrap());
        (
            RecommendationService::new(catalog, store, BaselineConfig::default()),
            dir,
        )
    }

    #[tokio::test]
    async fn test_blended_cold_start_serves_baseline() {
        let (service, _dir) = service().await;

        let ranked = service
            .compute_blended_recommendations("nobody", 10, 3, 0.3)
            .await
            .unwrap();

        assert_eq!(ranked.method, RankingMethod::Baseline);
        assert_eq!(ranked.recommendations.len(), 3);
        assert!(ranked.recommendations.iter().all(|r| r.hybrid_score.is_none()));
    }

    #[tokio::test]
    async fn test_blended_uses_peer_history() {
        let (service, _dir) = service().await;
        service.update_progress("alice", "Mathematics", "Calculus", 80.0).await.unwrap();
        service.update_progress("bob", "Mathematics", "Calculus", 70.0).await.unwrap();
        service.update_progress("bob", "Mathematics", "Linear Algebra", 90.0).await.unwrap();

        let ranked = service
            .compute_blended_recommendations("alice", 10, 5, 0.5)
            .await
            .unwrap();

        assert_eq!(ranked.method, RankingMethod::Hybrid);
        assert_eq!(ranked.recommendations.len(), 5);
    }

    #[tokio::test]
    async fn test_blended_without_signal_truncates_baseline_pool() {
        let (service, _dir) = service().await;
        service.update_progress("solo", "Biology", "Genetics", 30.0).await.unwrap();
        service.update_progress("other", "Biology", "Ecology", 30.0).await.unwrap();

        let table = service.snapshot().await;
        let pool = service.baseline_for(&table, "solo", 10).unwrap();
        let unchanged = service
            .compute_hybrid_recommendations("solo", &pool, 3, 0.3)
            .await
            .unwrap();
        assert_eq!(unchanged, pool);

        let ranked = service
            .compute_blended_recommendations("solo", 10, 3, 0.3)
            .await
            .unwrap();
        assert_eq!(ranked.method, RankingMethod::Baseline);
        assert_eq!(ranked.recommendations, pool[..3].to_vec());
    }

    #[tokio::test]
    async fn test_hybrid_rejects_out_of_range_weight() {
        let (service, _dir) = service().await;

        let err = service
            .compute_hybrid_recommendations("alice", &[], 5, -0.1)
            .await
            .unwrap_err();

        assert!(matches!(err, RecommendError::InvalidCfWeight(_)));
    }

    #[tokio::test]
    async fn test_update_progress_validates_pair_and_value() {
        let (service, _dir) = service().await;

        let err = service
            .update_progress("alice", "Physics", "Calculus", 10.0)
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::Catalog(CatalogError::UnknownTopic(_))));

        let err = service
            .update_progress("alice", "Mathematics", "Calculus", f64::INFINITY)
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::InvalidMastery(_)));

        let stored = service
            .update_progress("alice", "Mathematics", "Calculus", 120.0)
            .await
            .unwrap();
        assert_eq!(stored, 100.0);
        assert_eq!(
            service.progress_for("alice", "Mathematics", "Calculus").await.unwrap(),
            100.0
        );
    }

    #[tokio::test]
    async fn test_record_feedback_persists() {
        let (service, _dir) = service().await;

        let entry = service
            .record_feedback("alice", "Genetics", FeedbackKind::Start)
            .await
            .unwrap();

        assert_eq!(entry.kind, FeedbackKind::Start);
        let stored = service.store().list_feedback("alice").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].topic, "Genetics");
    }
}
