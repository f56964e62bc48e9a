use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;

/// GET /api/users/profile
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Json<UserRow> {
    Json(user)
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub preferences: Option<Value>,
}

/// PUT /api/users/profile
///
/// Partial update: absent fields keep their stored values.
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let name = match body.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::Validation("name must not be empty".to_string())),
        Some(name) => name.to_string(),
        None => user.name.clone(),
    };
    let avatar = body.avatar.or_else(|| user.avatar.clone());
    let preferences = body.preferences.or_else(|| user.preferences.clone());

    let updated = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET name = $1, avatar = $2, preferences = $3, updated_at = NOW() \
         WHERE id = $4 RETURNING *",
    )
    .bind(&name)
    .bind(&avatar)
    .bind(&preferences)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(json!({ "message": "Profile updated", "user": updated })))
}
