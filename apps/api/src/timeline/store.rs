//! Plan persistence behind a repository trait, so the orchestrator can run
//! against Postgres in production and an in-memory map in tests.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::plan::TimelinePlan;

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn insert(&self, plan: &TimelinePlan) -> Result<(), AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimelinePlan>, AppError>;

    /// Writes back the mutable parts of a plan (phases, chart, metrics).
    /// Last writer wins; there is no version token.
    async fn save(&self, plan: &TimelinePlan) -> Result<(), AppError>;

    /// Sets the owner of a still-ownerless plan. A plan that already has an
    /// owner is left untouched.
    async fn claim_owner(&self, id: Uuid, owner: Uuid) -> Result<(), AppError>;

    /// All plans owned by a user, newest first.
    async fn history_for(&self, owner: Uuid) -> Result<Vec<TimelinePlan>, AppError>;
}

pub struct PgPlanStore {
    pool: PgPool,
}

impl PgPlanStore {
    pub fn new(pool: PgPool) -> Self {
        PgPlanStore { pool }
    }
}

#[async_trait]
impl PlanStore for PgPlanStore {
    async fn insert(&self, plan: &TimelinePlan) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO timeline_plans
                (id, owner_id, current_skills, target_job, timeframe_months,
                 additional_context, phase_count, approx_months, mermaid_code,
                 phases, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(plan.id)
        .bind(plan.owner_id)
        .bind(&plan.current_skills)
        .bind(&plan.target_job)
        .bind(plan.timeframe_months)
        .bind(&plan.additional_context)
        .bind(plan.phase_count)
        .bind(plan.approx_months)
        .bind(&plan.mermaid_code)
        .bind(&plan.phases)
        .bind(plan.created_at)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TimelinePlan>, AppError> {
        Ok(
            sqlx::query_as::<_, TimelinePlan>("SELECT * FROM timeline_plans WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn save(&self, plan: &TimelinePlan) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE timeline_plans
            SET phases = $2, phase_count = $3, approx_months = $4,
                mermaid_code = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(plan.id)
        .bind(&plan.phases)
        .bind(plan.phase_count)
        .bind(plan.approx_months)
        .bind(&plan.mermaid_code)
        .bind(plan.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn claim_owner(&self, id: Uuid, owner: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE timeline_plans SET owner_id = $2, updated_at = now()
             WHERE id = $1 AND owner_id IS NULL",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn history_for(&self, owner: Uuid) -> Result<Vec<TimelinePlan>, AppError> {
        Ok(sqlx::query_as::<_, TimelinePlan>(
            "SELECT * FROM timeline_plans WHERE owner_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory stand-in for `PgPlanStore`.
    #[derive(Default)]
    pub struct MemoryPlanStore {
        plans: Mutex<HashMap<Uuid, TimelinePlan>>,
    }

    impl MemoryPlanStore {
        pub fn with_plan(plan: TimelinePlan) -> Self {
            let store = MemoryPlanStore::default();
            store.plans.lock().unwrap().insert(plan.id, plan);
            store
        }

        pub fn get(&self, id: Uuid) -> Option<TimelinePlan> {
            self.plans.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl PlanStore for MemoryPlanStore {
        async fn insert(&self, plan: &TimelinePlan) -> Result<(), AppError> {
            self.plans.lock().unwrap().insert(plan.id, plan.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<TimelinePlan>, AppError> {
            Ok(self.plans.lock().unwrap().get(&id).cloned())
        }

        async fn save(&self, plan: &TimelinePlan) -> Result<(), AppError> {
            self.plans.lock().unwrap().insert(plan.id, plan.clone());
            Ok(())
        }

        async fn claim_owner(&self, id: Uuid, owner: Uuid) -> Result<(), AppError> {
            let mut plans = self.plans.lock().unwrap();
            if let Some(plan) = plans.get_mut(&id) {
                if plan.owner_id.is_none() {
                    plan.owner_id = Some(owner);
                }
            }
            Ok(())
        }

        async fn history_for(&self, owner: Uuid) -> Result<Vec<TimelinePlan>, AppError> {
            let mut plans: Vec<TimelinePlan> = self
                .plans
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.owner_id == Some(owner))
                .cloned()
                .collect();
            plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(plans)
        }
    }

    /// Store whose writes always fail, for exercising the
    /// degraded-persistence path.
    pub struct FailingPlanStore;

    #[async_trait]
    impl PlanStore for FailingPlanStore {
        async fn insert(&self, _plan: &TimelinePlan) -> Result<(), AppError> {
            Err(AppError::Internal(anyhow::anyhow!("store offline")))
        }

        async fn find_by_id(&self, _id: Uuid) -> Result<Option<TimelinePlan>, AppError> {
            Err(AppError::Internal(anyhow::anyhow!("store offline")))
        }

        async fn save(&self, _plan: &TimelinePlan) -> Result<(), AppError> {
            Err(AppError::Internal(anyhow::anyhow!("store offline")))
        }

        async fn claim_owner(&self, _id: Uuid, _owner: Uuid) -> Result<(), AppError> {
            Err(AppError::Internal(anyhow::anyhow!("store offline")))
        }

        async fn history_for(&self, _owner: Uuid) -> Result<Vec<TimelinePlan>, AppError> {
            Err(AppError::Internal(anyhow::anyhow!("store offline")))
        }
    }
}
