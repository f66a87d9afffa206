pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;

use std::sync::Arc;

use config::Config;
use metrics::MetricsStore;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,

    /// Central metrics engine — the tracking middleware records into it,
    /// the metrics endpoints read snapshots out of it.
    pub metrics: Arc<MetricsStore>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsStore::new()),
        }
    }
}
