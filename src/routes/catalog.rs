use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::catalog::{CatalogError, TopicCatalog, TopicMeta};
use crate::response::{ok, AppError};
use crate::service::RecommendError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/topics/:topic/path", get(learning_path))
}

#[derive(Serialize)]
struct CourseView<'a> {
    name: &'a str,
    topics: Vec<TopicView<'a>>,
}

#[derive(Serialize)]
struct TopicView<'a> {
    name: &'a str,
    #[serde(flatten)]
    meta: &'a TopicMeta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathStep<'a> {
    course: &'a str,
    topic: &'a str,
    difficulty: u8,
    estimated_minutes: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LearningPathResponse<'a> {
    topic: &'a str,
    steps: Vec<PathStep<'a>>,
    total_minutes: u32,
}

async fn list(State(state): State<AppState>) -> Response {
    match course_views(state.service().catalog()) {
        Ok(courses) => ok(courses),
        Err(err) => AppError::from(RecommendError::Catalog(err)).into_response(),
    }
}

fn course_views(catalog: &TopicCatalog) -> Result<Vec<CourseView<'_>>, CatalogError> {
    let mut courses = Vec::with_capacity(catalog.courses().len());
    for course in catalog.courses() {
        let mut topics = Vec::with_capacity(course.topics.len());
        for name in &course.topics {
            topics.push(TopicView {
                name,
                meta: catalog.metadata_of(name)?,
            });
        }
        courses.push(CourseView {
            name: &course.name,
            topics,
        });
    }
    Ok(courses)
}

async fn learning_path(State(state): State<AppState>, Path(topic): Path<String>) -> Response {
    let catalog = state.service().catalog();
    match build_path(catalog, &topic) {
        Ok(path) => ok(path),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn build_path<'a>(
    catalog: &'a TopicCatalog,
    topic: &'a str,
) -> Result<LearningPathResponse<'a>, RecommendError> {
    let mut steps = Vec::new();
    for name in catalog.learning_path(topic)? {
        let meta = catalog.metadata_of(name)?;
        steps.push(PathStep {
            course: catalog.course_of(name)?,
            topic: name,
            difficulty: meta.difficulty,
            estimated_minutes: meta.estimated_minutes,
        });
    }

    let total_minutes = steps.iter().map(|s| s.estimated_minutes).sum();
    Ok(LearningPathResponse {
        topic,
        steps,
        total_minutes,
    })
}
