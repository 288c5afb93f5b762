use std::collections::BTreeMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackKind;
use crate::response::{ok, AppError};
use crate::service::{RankedRecommendations, RankingMethod};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:user_id/recommendations", get(recommendations))
        .route("/:user_id/progress", get(progress_summary).put(update_progress))
        .route("/:user_id/progress/:course/:topic", get(topic_progress))
        .route("/:user_id/feedback", post(record_feedback))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationQuery {
    method: Option<RankingMethod>,
    top_k: Option<usize>,
    cf_weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProgressRequest {
    course: String,
    topic: String,
    mastery_level: f64,
}

#[derive(Debug, Deserialize)]
struct FeedbackRequest {
    topic: String,
    feedback: FeedbackKind,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationsResponse {
    user_id: String,
    #[serde(flatten)]
    ranked: RankedRecommendations,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressEntry<'a> {
    course: &'a str,
    topic: &'a str,
    mastery_level: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressSummary<'a> {
    user_id: &'a str,
    records: Vec<ProgressEntry<'a>>,
    course_averages: BTreeMap<&'a str, f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicProgress {
    user_id: String,
    course: String,
    topic: String,
    mastery_level: f64,
}

async fn recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    query: Result<Query<RecommendationQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return AppError::bad_request(rejection.body_text()).into_response(),
    };

    let defaults = state.defaults();
    let top_k = query.top_k.unwrap_or(defaults.top_k);
    if top_k == 0 {
        return AppError::validation("topK must be at least 1").into_response();
    }

    let service = state.service();
    let ranked = match query.method.unwrap_or_default() {
        RankingMethod::Baseline => service
            .compute_baseline_recommendations(&user_id, top_k)
            .await
            .map(|recommendations| RankedRecommendations {
                method: RankingMethod::Baseline,
                recommendations,
            }),
        RankingMethod::Hybrid => {
            let cf_weight = query.cf_weight.unwrap_or(defaults.cf_weight);
            service
                .compute_blended_recommendations(
                    &user_id,
                    defaults.baseline_pool,
                    top_k,
                    cf_weight,
                )
                .await
        }
    };

    match ranked {
        Ok(ranked) => ok(RecommendationsResponse { user_id, ranked }),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn progress_summary(State(state): State<AppState>, Path(user_id): Path<String>) -> Response {
    let table = match state.service().store().load_progress().await {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!(error = %err, "progress snapshot unavailable");
            return AppError::unavailable("progress store unavailable").into_response();
        }
    };

    let user = table.for_user(&user_id);
    let records = table
        .records()
        .iter()
        .filter(|r| r.user_id == user_id)
        .map(|r| ProgressEntry {
            course: &r.course,
            topic: &r.topic,
            mastery_level: r.mastery_level,
        })
        .collect();

    ok(ProgressSummary {
        user_id: &user_id,
        records,
        course_averages: user.course_averages().clone(),
    })
}

async fn topic_progress(
    State(state): State<AppState>,
    Path((user_id, course, topic)): Path<(String, String, String)>,
) -> Response {
    match state
        .service()
        .progress_for(&user_id, &course, &topic)
        .await
    {
        Ok(mastery_level) => ok(TopicProgress {
            user_id,
            course,
            topic,
            mastery_level,
        }),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn update_progress(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<UpdateProgressRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return AppError::bad_request(rejection.body_text()).into_response(),
    };

    match state
        .service()
        .update_progress(&user_id, &payload.course, &payload.topic, payload.mastery_level)
        .await
    {
        Ok(mastery_level) => ok(TopicProgress {
            user_id,
            course: payload.course,
            topic: payload.topic,
            mastery_level,
        }),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn record_feedback(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return AppError::bad_request(rejection.body_text()).into_response(),
    };

    if !state.service().catalog().contains(&payload.topic) {
        return AppError::not_found(format!("unknown topic: {}", payload.topic)).into_response();
    }

    match state
        .service()
        .record_feedback(&user_id, &payload.topic, payload.feedback)
        .await
    {
        Ok(entry) => ok(entry),
        Err(err) => AppError::from(err).into_response(),
    }
}
