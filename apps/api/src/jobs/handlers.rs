use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::jobs::dedup_listings;
use crate::state::AppState;

/// Number of skills queried individually before the generic fallback.
const MAX_SKILL_QUERIES: usize = 5;

#[derive(Debug, Deserialize)]
pub struct JobsBySkillsRequest {
    #[serde(default)]
    pub skills: Vec<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// POST /api/jobs/jobs-by-skills
///
/// Searches per skill (request skills first, profile skills as fallback),
/// then flattens the batches into a deduplicated, capped listing. A single
/// failed upstream query is logged and skipped, not fatal.
pub async fn jobs_by_skills(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<JobsBySkillsRequest>,
) -> Result<Json<Value>, AppError> {
    let mut skills = body.skills;
    skills.retain(|skill| !skill.trim().is_empty());
    if skills.is_empty() {
        skills = user.skill_names();
    }
    if skills.is_empty() {
        return Err(AppError::Validation(
            "No skills provided and none found on your profile".to_string(),
        ));
    }

    let city = body.city.as_deref();
    let country = body.country.as_deref();

    let mut hits = Vec::new();
    for skill in skills.iter().take(MAX_SKILL_QUERIES) {
        let query = format!("{skill} jobs");
        match state.jobs.search(&query, city, country).await {
            Ok(batch) => hits.extend(batch),
            Err(e) => warn!("job search for {skill:?} failed: {e}"),
        }
    }

    // One generic query when the per-skill searches came up empty.
    if hits.is_empty() {
        match state.jobs.search("developer jobs", city, country).await {
            Ok(batch) => hits.extend(batch),
            Err(e) => warn!("fallback job search failed: {e}"),
        }
    }

    let listings = dedup_listings(hits);
    if listings.is_empty() {
        return Ok(Json(json!({
            "skills": skills,
            "message": "No jobs found for your profile/location.",
        })));
    }

    Ok(Json(json!({ "skills": skills, "jobs": listings })))
}
