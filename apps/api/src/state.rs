use std::sync::Arc;

use sqlx::PgPool;

use crate::career_ai::CareerAiClient;
use crate::config::Config;
use crate::jobs::JobSearchClient;
use crate::timeline::generator::PlanGenerator;
use crate::timeline::store::PlanStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable plan generator. Default: the Python subprocess runner.
    pub generator: Arc<dyn PlanGenerator>,
    pub plans: Arc<dyn PlanStore>,
    pub career_ai: CareerAiClient,
    pub jobs: JobSearchClient,
}
