//! Timeline orchestration: request validation, generator invocation, payload
//! coercion, persistence, and the ownership rules around plan mutation.

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::types::Json;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::TimelinePlan;
use crate::timeline::generator::{GenerationMode, GenerationRequest, PlanGenerator};
use crate::timeline::normalize::{
    approx_months, coerce_number, extract_mermaid, extract_phases, is_truthy, normalize_list,
};
use crate::timeline::store::PlanStore;

/// Validated generation inputs, shared by the timeline and plan endpoints.
#[derive(Debug, Clone)]
pub struct GenerationInputs {
    pub current_skills: Vec<String>,
    pub target_job: String,
    pub timeframe_months: i64,
    pub additional_context: Option<Value>,
}

/// Validates a loose request body into [`GenerationInputs`].
///
/// Skill lists go through the shared list normalizer, so comma strings and
/// bulleted text are as welcome as arrays. Both snake_case and camelCase
/// spellings are accepted; clients have sent both.
pub fn parse_inputs(body: &Value) -> Result<GenerationInputs, AppError> {
    let current_skills = first_present(body, &["current_skills", "currentSkills", "skills"])
        .map(normalize_list)
        .unwrap_or_default();
    if current_skills.is_empty() {
        return Err(AppError::Validation(
            "current_skills must be a non-empty list".to_string(),
        ));
    }

    let target_job = first_present(body, &["target_job", "targetJob"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|job| !job.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("target_job is required".to_string()))?;

    let timeframe = first_present(body, &["timeframe_months", "timeframeMonths", "timeframe"])
        .and_then(coerce_number)
        .filter(|months| months.fract() == 0.0 && (1.0..=120.0).contains(months))
        .ok_or_else(|| {
            AppError::Validation("timeframe_months must be an integer between 1 and 120".to_string())
        })?;

    let additional_context =
        first_present(body, &["additional_context", "additionalContext"]).cloned();

    Ok(GenerationInputs {
        current_skills,
        target_job,
        timeframe_months: timeframe as i64,
        additional_context,
    })
}

fn first_present<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| body.get(*key))
        .find(|value| is_truthy(value))
}

/// Generates a timeline and persists it as a [`TimelinePlan`].
///
/// Persistence is best-effort: when the store is down the caller still gets
/// the generated payload, just without a `plan_id` to come back to.
pub async fn generate_timeline(
    generator: &dyn PlanGenerator,
    store: &dyn PlanStore,
    inputs: GenerationInputs,
    owner: Option<Uuid>,
) -> Result<Value, AppError> {
    // 1. Run the generator.
    let request = GenerationRequest {
        current_skills: inputs.current_skills.clone(),
        target_job: inputs.target_job.clone(),
        timeframe_months: inputs.timeframe_months,
        additional_context: inputs.additional_context.clone(),
        mode: GenerationMode::Timeline,
    };
    let payload = generator.generate(&request).await?;

    // 2. Coerce the loose payload into phases and summary metrics.
    let phases = extract_phases(&payload);
    let mermaid_code = extract_mermaid(&payload);
    let phase_count = phases.len() as i64;
    let months = approx_months(&phases, inputs.timeframe_months);

    // 3. Persist. Storage failure downgrades to a warning.
    let now = Utc::now();
    let plan = TimelinePlan {
        id: Uuid::new_v4(),
        owner_id: owner,
        current_skills: inputs.current_skills,
        target_job: inputs.target_job,
        timeframe_months: inputs.timeframe_months,
        additional_context: inputs.additional_context,
        phase_count,
        approx_months: months,
        mermaid_code,
        phases: Json(phases),
        created_at: now,
        updated_at: now,
    };
    let plan_id = match store.insert(&plan).await {
        Ok(()) => Some(plan.id),
        Err(e) => {
            warn!("failed to persist timeline plan: {e}");
            None
        }
    };

    // 4. Respond with the full generator payload, plus the plan id when we
    //    managed to keep it.
    Ok(augment_with_plan_id(payload, plan_id))
}

/// Plan-mode generation: no persistence, stricter payload contract.
pub async fn generate_plan(
    generator: &dyn PlanGenerator,
    inputs: GenerationInputs,
) -> Result<Value, AppError> {
    let request = GenerationRequest {
        current_skills: inputs.current_skills,
        target_job: inputs.target_job,
        timeframe_months: inputs.timeframe_months,
        additional_context: None,
        mode: GenerationMode::Plan,
    };
    let payload = generator.generate(&request).await?;

    // The script reports its own failures inside the payload.
    if let Some(error) = payload.get("error").filter(|e| is_truthy(e)) {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(AppError::GeneratorProcess(message));
    }

    let plan = payload.get("plan").filter(|v| is_truthy(v)).cloned();
    let mermaid = payload.get("mermaid_code").filter(|v| is_truthy(v)).cloned();
    match (plan, mermaid) {
        (Some(plan), Some(mermaid_code)) => Ok(json!({
            "plan": plan,
            "mermaid_code": mermaid_code,
            "full_response": payload,
        })),
        _ => Err(AppError::GeneratorContract {
            message: "Incomplete response from plan generator".to_string(),
            payload: payload.to_string(),
        }),
    }
}

/// Re-runs generation with a plan's stored inputs and overwrites its phases,
/// chart, and metrics. Mutation, so the ownership rules apply.
pub async fn regenerate(
    generator: &dyn PlanGenerator,
    store: &dyn PlanStore,
    plan_id: Uuid,
    caller: Uuid,
) -> Result<Value, AppError> {
    let mut plan = store
        .find_by_id(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Timeline plan {plan_id} not found")))?;
    ensure_owner_or_claim(store, &mut plan, caller).await?;

    let request = GenerationRequest {
        current_skills: plan.current_skills.clone(),
        target_job: plan.target_job.clone(),
        timeframe_months: plan.timeframe_months,
        additional_context: plan.additional_context.clone(),
        mode: GenerationMode::Timeline,
    };
    let payload = generator.generate(&request).await?;

    let phases = extract_phases(&payload);
    plan.phase_count = phases.len() as i64;
    plan.approx_months = approx_months(&phases, plan.timeframe_months);
    plan.mermaid_code = extract_mermaid(&payload);
    plan.phases = Json(phases);
    plan.updated_at = Utc::now();
    store.save(&plan).await?;

    Ok(augment_with_plan_id(payload, Some(plan.id)))
}

/// Marks one phase of a plan completed, leaving every other phase alone.
pub async fn complete_phase(
    store: &dyn PlanStore,
    plan_id: Uuid,
    order: i64,
    caller: Uuid,
) -> Result<TimelinePlan, AppError> {
    let mut plan = store
        .find_by_id(plan_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Timeline plan {plan_id} not found")))?;
    ensure_owner_or_claim(store, &mut plan, caller).await?;

    let phase = plan
        .phases
        .0
        .iter_mut()
        .find(|phase| phase.order == order)
        .ok_or_else(|| AppError::NotFound(format!("Phase {order} not found in plan")))?;
    phase.completed = true;
    phase.completed_at = Some(Utc::now());
    plan.updated_at = Utc::now();

    store.save(&plan).await?;
    Ok(plan)
}

/// Read rule: an owned plan is visible only to its owner; an ownerless plan
/// is visible to any authenticated caller. Reads never claim.
pub fn ensure_readable(plan: &TimelinePlan, caller: Uuid) -> Result<(), AppError> {
    match plan.owner_id {
        Some(owner) if owner != caller => Err(AppError::Forbidden(
            "You do not have access to this timeline plan".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Mutation rule: the owner may proceed; a non-owner is rejected; an
/// ownerless plan is claimed by the caller first, then treated as theirs.
async fn ensure_owner_or_claim(
    store: &dyn PlanStore,
    plan: &mut TimelinePlan,
    caller: Uuid,
) -> Result<(), AppError> {
    match plan.owner_id {
        Some(owner) if owner == caller => Ok(()),
        Some(_) => Err(AppError::Forbidden(
            "You do not have permission to update this timeline plan".to_string(),
        )),
        None => {
            store.claim_owner(plan.id, caller).await?;
            plan.owner_id = Some(caller);
            Ok(())
        }
    }
}

fn augment_with_plan_id(mut payload: Value, plan_id: Option<Uuid>) -> Value {
    if let (Some(id), Some(object)) = (plan_id, payload.as_object_mut()) {
        object.insert("plan_id".to_string(), json!(id));
    }
    payload
}
