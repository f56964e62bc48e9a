//! HTTP surface of the timeline module.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{CurrentUser, OptionalUser};
use crate::errors::AppError;
use crate::models::plan::TimelinePlan;
use crate::state::AppState;
use crate::timeline::service;

/// POST /api/timeline/generate-timeline
///
/// Public endpoint with optional identity: an authenticated caller becomes
/// the owner of the persisted plan, an anonymous one leaves it ownerless.
pub async fn generate_timeline(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let inputs = service::parse_inputs(&body)?;
    let owner = user.map(|user| user.id);
    let payload = service::generate_timeline(
        state.generator.as_ref(),
        state.plans.as_ref(),
        inputs,
        owner,
    )
    .await?;
    Ok(Json(payload))
}

/// POST /api/timeline/generate-plan
pub async fn generate_plan(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let inputs = service::parse_inputs(&body)?;
    let payload = service::generate_plan(state.generator.as_ref(), inputs).await?;
    Ok(Json(payload))
}

/// GET /api/timeline/history
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, AppError> {
    let plans = state.plans.history_for(user.id).await?;
    let count = plans.len();
    Ok(Json(json!({ "plans": plans, "count": count })))
}

/// GET /api/timeline/:id
pub async fn get_plan(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimelinePlan>, AppError> {
    let plan = state
        .plans
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Timeline plan {id} not found")))?;
    service::ensure_readable(&plan, user.id)?;
    Ok(Json(plan))
}

/// POST /api/timeline/:id/regenerate
pub async fn regenerate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let payload =
        service::regenerate(state.generator.as_ref(), state.plans.as_ref(), id, user.id).await?;
    Ok(Json(payload))
}

#[derive(Debug, Deserialize)]
pub struct CompletePhaseRequest {
    pub plan_id: Uuid,
    // Clients have sent both spellings; `order` wins when both are present.
    pub order: Option<i64>,
    pub phase_order: Option<i64>,
}

/// POST /api/timeline/complete-phase
pub async fn complete_phase(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CompletePhaseRequest>,
) -> Result<Json<Value>, AppError> {
    let order = body
        .order
        .or(body.phase_order)
        .ok_or_else(|| AppError::Validation("order is required".to_string()))?;
    let plan = service::complete_phase(state.plans.as_ref(), body.plan_id, order, user.id).await?;
    Ok(Json(json!({ "message": "Phase marked as completed", "plan": plan })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_phase_request_accepts_either_order_key() {
        let body: CompletePhaseRequest = serde_json::from_value(json!({
            "plan_id": "7f2c1b4e-9a3d-4f6b-8c1e-2d5a7b9c0e1f",
            "phase_order": 3
        }))
        .unwrap();
        assert_eq!(body.order.or(body.phase_order), Some(3));

        let body: CompletePhaseRequest = serde_json::from_value(json!({
            "plan_id": "7f2c1b4e-9a3d-4f6b-8c1e-2d5a7b9c0e1f",
            "order": 1,
            "phase_order": 9
        }))
        .unwrap();
        assert_eq!(body.order.or(body.phase_order), Some(1));
    }
}
