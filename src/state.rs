use std::sync::Arc;
use std::time::Instant;

use crate::config::RecommendDefaults;
use crate::service::RecommendationService;

#[derive(Clone)]
pub struct AppState {
    service: RecommendationService,
    defaults: Arc<RecommendDefaults>,
    started_at: Instant,
}

impl AppState {
    pub fn new(service: RecommendationService, defaults: RecommendDefaults) -> Self {
        Self {
            service,
            defaults: Arc::new(defaults),
            started_at: Instant::now(),
        }
    }

    pub fn service(&self) -> &RecommendationService {
        &self.service
    }

    pub fn defaults(&self) -> &RecommendDefaults {
        &self.defaults
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
