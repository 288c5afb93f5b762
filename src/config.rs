use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::recommend::{DEFAULT_CF_WEIGHT, DEFAULT_TOP_K};

const DEFAULT_BASELINE_POOL: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub progress_db_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub recommend: RecommendDefaults,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendDefaults {
    pub top_k: usize,
    /// How many baseline candidates the hybrid ranking re-weights.
    pub baseline_pool: usize,
    pub cf_weight: f64,
}

impl Default for RecommendDefaults {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            baseline_pool: DEFAULT_BASELINE_POOL,
            cf_weight: DEFAULT_CF_WEIGHT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let progress_db_path = std::env::var("PROGRESS_DB_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_progress_db_path);

        let catalog_path = std::env::var("CATALOG_PATH")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            host,
            port,
            log_level,
            progress_db_path,
            catalog_path,
            recommend: RecommendDefaults::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RecommendDefaults {
    fn from_env() -> Self {
        let defaults = Self::default();
        let top_k = env_usize("RECOMMEND_TOP_K").unwrap_or(defaults.top_k);
        let baseline_pool = env_usize("RECOMMEND_BASELINE_POOL")
            .unwrap_or(defaults.baseline_pool)
            .max(top_k);
        let cf_weight = std::env::var("RECOMMEND_CF_WEIGHT")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|w| (0.0..=1.0).contains(w))
            .unwrap_or(defaults.cf_weight);

        Self {
            top_k,
            baseline_pool,
            cf_weight,
        }
    }
}

pub fn default_progress_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mastery-recommender")
        .join("progress.db")
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<usize>().ok())
}
