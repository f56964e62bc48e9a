use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::{Skill, DEFAULT_SKILL_CATEGORY, DEFAULT_SKILL_LEVEL};
use crate::skills::{merge_skills, IncomingSkill};
use crate::state::AppState;

/// GET /api/skills
pub async fn list_skills(CurrentUser(user): CurrentUser) -> Json<Value> {
    Json(json!({ "skills": user.skills.0 }))
}

#[derive(Debug, Deserialize)]
pub struct AddSkillRequest {
    pub name: String,
    pub level: Option<String>,
    pub category: Option<String>,
}

/// POST /api/skills
pub async fn add_skill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AddSkillRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let mut skills = user.skills.0.clone();
    if skills
        .iter()
        .any(|skill| skill.name.eq_ignore_ascii_case(&name))
    {
        return Err(AppError::Validation("Skill already exists".to_string()));
    }

    skills.push(Skill {
        name,
        level: body
            .level
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SKILL_LEVEL.to_string()),
        category: body
            .category
            .filter(|category| !category.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SKILL_CATEGORY.to_string()),
        verified: false,
    });
    save_skills(&state.db, user.id, &skills).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Skill added", "skills": skills })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub skills: Vec<IncomingSkill>,
}

/// POST /api/skills/extract
///
/// Bulk merge of skills extracted from a resume upstream.
pub async fn extract_skills(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<ExtractRequest>,
) -> Result<Json<Value>, AppError> {
    if body.skills.is_empty() {
        return Err(AppError::Validation("No skills provided".to_string()));
    }

    let mut skills = user.skills.0.clone();
    let outcome = merge_skills(&mut skills, body.skills);
    save_skills(&state.db, user.id, &skills).await?;

    Ok(Json(json!({
        "message": "Skills added successfully",
        "added": outcome.added,
        "updated": outcome.updated,
        "skills": skills,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateSkillRequest {
    pub level: Option<String>,
    pub category: Option<String>,
    pub verified: Option<bool>,
}

/// PUT /api/skills/:name
pub async fn update_skill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Json(body): Json<UpdateSkillRequest>,
) -> Result<Json<Value>, AppError> {
    let mut skills = user.skills.0.clone();
    let skill = skills
        .iter_mut()
        .find(|skill| skill.name.eq_ignore_ascii_case(&name))
        .ok_or_else(|| AppError::NotFound(format!("Skill {name} not found")))?;

    if let Some(level) = body.level {
        skill.level = level;
    }
    if let Some(category) = body.category {
        skill.category = category;
    }
    if let Some(verified) = body.verified {
        skill.verified = verified;
    }
    save_skills(&state.db, user.id, &skills).await?;

    Ok(Json(json!({ "message": "Skill updated", "skills": skills })))
}

/// DELETE /api/skills/:name
pub async fn remove_skill(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<Value>, AppError> {
    let mut skills = user.skills.0.clone();
    let before = skills.len();
    skills.retain(|skill| !skill.name.eq_ignore_ascii_case(&name));
    if skills.len() == before {
        return Err(AppError::NotFound(format!("Skill {name} not found")));
    }
    save_skills(&state.db, user.id, &skills).await?;

    Ok(Json(json!({ "message": "Skill removed", "skills": skills })))
}

async fn save_skills(db: &PgPool, user_id: Uuid, skills: &[Skill]) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET skills = $1, updated_at = NOW() WHERE id = $2")
        .bind(sqlx::types::Json(skills))
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}
