#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mastery_recommender::catalog::TopicCatalog;
use mastery_recommender::config::RecommendDefaults;
use mastery_recommender::create_app;
use mastery_recommender::db::ProgressStore;
use mastery_recommender::recommend::BaselineConfig;
use mastery_recommender::service::RecommendationService;
use mastery_recommender::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub service: RecommendationService,
    _dir: TempDir,
}

pub async fn open_temp_store() -> (ProgressStore, TempDir) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let store = ProgressStore::open(&dir.path().join("progress.db"))
        .await
        .expect("failed to open progress store");
    (store, dir)
}

pub async fn create_test_app() -> TestApp {
    let (store, dir) = open_temp_store().await;
    let catalog = TopicCatalog::builtin().expect("builtin catalog");
    let service = RecommendationService::new(Arc::new(catalog), store, BaselineConfig::default());
    let state = AppState::new(service.clone(), RecommendDefaults::default());

    TestApp {
        router: create_app(state),
        service,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn seed(&self, user_id: &str, course: &str, topic: &str, level: f64) {
        self.service
            .update_progress(user_id, course, topic, level)
            .await
            .expect("seed progress");
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}
