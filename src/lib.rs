pub mod catalog;
pub mod config;
pub mod db;
pub mod feedback;
pub mod logging;
pub mod mastery;
pub mod recommend;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{CatalogError, TopicCatalog};
use crate::config::Config;
use crate::db::{ProgressStore, StoreError};
use crate::recommend::BaselineConfig;
use crate::service::RecommendationService;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),
    #[error("progress store: {0}")]
    Store(#[from] StoreError),
}

pub fn create_app(state: AppState) -> Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Loads `CATALOG_PATH` when set, the built-in catalog otherwise.
pub fn load_catalog(config: &Config) -> Result<TopicCatalog, CatalogError> {
    match &config.catalog_path {
        Some(path) => {
            let catalog = TopicCatalog::from_json_file(path)?;
            tracing::info!(path = %path.display(), courses = catalog.courses().len(), "catalog loaded");
            Ok(catalog)
        }
        None => TopicCatalog::builtin(),
    }
}

pub async fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let catalog = load_catalog(config)?;
    let store = ProgressStore::open(&config.progress_db_path).await?;
    let service = RecommendationService::new(Arc::new(catalog), store, BaselineConfig::default());
    Ok(AppState::new(service, config.recommend.clone()))
}
