use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::Skill;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub industry: Option<String>,
    pub goals: Option<String>,
    pub experience_level: Option<String>,
}

/// POST /api/ai/analyze-existing
///
/// Sends the caller's profile skills, grouped by category, to the analysis
/// service together with the request's career framing.
pub async fn analyze_existing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<Value>, AppError> {
    let payload = json!({
        "skills": skills_by_category(&user.skills.0),
        "industry": body.industry,
        "goals": body.goals,
        "experience_level": body.experience_level,
    });
    let analysis = state.career_ai.career_recommendations(&payload).await?;
    Ok(Json(analysis))
}

fn skills_by_category(skills: &[Skill]) -> Map<String, Value> {
    let mut grouped = Map::new();
    for skill in skills {
        let entry = grouped
            .entry(skill.category.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Some(list) = entry.as_array_mut() {
            list.push(Value::String(skill.name.clone()));
        }
    }
    grouped
}

#[derive(Debug, Deserialize)]
pub struct SkillSuggestionsRequest {
    pub target_role: Option<String>,
}

/// POST /api/ai/skill-suggestions
pub async fn skill_suggestions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<SkillSuggestionsRequest>,
) -> Result<Json<Value>, AppError> {
    let target_role = body
        .target_role
        .as_deref()
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .ok_or_else(|| AppError::Validation("target_role is required".to_string()))?;

    let payload = json!({
        "current_skills": user.skill_names(),
        "target_role": target_role,
    });
    let suggestions = state.career_ai.skill_suggestions(&payload).await?;
    Ok(Json(suggestions))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, category: &str) -> Skill {
        Skill {
            name: name.to_string(),
            level: "Intermediate".to_string(),
            category: category.to_string(),
            verified: false,
        }
    }

    #[test]
    fn test_skills_grouped_by_category() {
        let skills = vec![
            skill("Python", "Programming"),
            skill("SQL", "Data"),
            skill("Rust", "Programming"),
        ];
        let grouped = skills_by_category(&skills);
        assert_eq!(grouped["Programming"], json!(["Python", "Rust"]));
        assert_eq!(grouped["Data"], json!(["SQL"]));
    }
}
