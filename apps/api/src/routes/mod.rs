pub mod health;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::activity::logger::activity_logging_middleware;
use crate::auth::auth_context_middleware;
use crate::state::AppState;
use crate::{activity, admin, career_ai, jobs, skills, timeline, users};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Timeline
        .route(
            "/api/timeline/generate-timeline",
            post(timeline::handlers::generate_timeline),
        )
        .route(
            "/api/timeline/generate-plan",
            post(timeline::handlers::generate_plan),
        )
        .route("/api/timeline/history", get(timeline::handlers::history))
        .route(
            "/api/timeline/complete-phase",
            post(timeline::handlers::complete_phase),
        )
        .route("/api/timeline/:id", get(timeline::handlers::get_plan))
        .route(
            "/api/timeline/:id/regenerate",
            post(timeline::handlers::regenerate),
        )
        // Skills
        .route(
            "/api/skills",
            get(skills::handlers::list_skills).post(skills::handlers::add_skill),
        )
        .route("/api/skills/extract", post(skills::handlers::extract_skills))
        .route(
            "/api/skills/:name",
            put(skills::handlers::update_skill).delete(skills::handlers::remove_skill),
        )
        // Profile
        .route(
            "/api/users/profile",
            get(users::handlers::get_profile).put(users::handlers::update_profile),
        )
        // Career analysis
        .route(
            "/api/ai/analyze-existing",
            post(career_ai::handlers::analyze_existing),
        )
        .route(
            "/api/ai/skill-suggestions",
            post(career_ai::handlers::skill_suggestions),
        )
        // Jobs
        .route(
            "/api/jobs/jobs-by-skills",
            post(jobs::handlers::jobs_by_skills),
        )
        // Activity log, user-facing
        .route(
            "/api/activity-logs",
            get(activity::handlers::list_own_logs).delete(activity::handlers::clear_own_logs),
        )
        .route(
            "/api/activity-logs/stats",
            get(activity::handlers::own_stats),
        )
        // Admin log browsing
        .route("/api/admin/logs", get(admin::handlers::list_logs))
        .route("/api/admin/logs/export", get(admin::handlers::export_csv))
        .route(
            "/api/admin/logs/cleanup",
            delete(admin::handlers::cleanup_logs),
        )
        .route(
            "/api/admin/logs/analytics/stats",
            get(admin::handlers::analytics_stats),
        )
        .route(
            "/api/admin/logs/action/:action",
            get(admin::handlers::logs_by_action),
        )
        .route("/api/admin/logs/:id", get(admin::handlers::get_log))
        // Auth resolution runs first (outermost), the activity logger right
        // after it, so the logger can attribute the finished request.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            activity_logging_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_context_middleware,
        ))
        .with_state(state)
}
