mod activity;
mod admin;
mod auth;
mod career_ai;
mod config;
mod db;
mod errors;
mod jobs;
mod models;
mod routes;
mod skills;
mod state;
mod timeline;
mod users;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::career_ai::CareerAiClient;
use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::jobs::JobSearchClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::timeline::generator::ProcessGenerator;
use crate::timeline::store::PgPlanStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Ascent API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    init_schema(&db).await?;

    // Timeline generator (Python subprocess runner)
    let generator = Arc::new(ProcessGenerator::new(&config));
    info!(
        "Timeline generator initialized ({} / {})",
        config.timeline_script, config.plan_script
    );

    // Plan persistence
    let plans = Arc::new(PgPlanStore::new(db.clone()));

    // External service clients
    let career_ai = CareerAiClient::new(&config);
    info!("Career analysis client initialized ({})", config.career_ai_url);
    let jobs = JobSearchClient::new(&config);
    info!("Job search client initialized ({})", config.jobs_api_host);

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        generator,
        plans,
        career_ai,
        jobs,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
