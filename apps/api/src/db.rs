use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Schema statements applied on every boot. All idempotent, so a fresh
/// database and a returning one take the same path.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        avatar TEXT,
        skills JSONB NOT NULL DEFAULT '[]'::jsonb,
        preferences JSONB,
        api_token TEXT UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role TEXT NOT NULL DEFAULT 'admin',
        status TEXT NOT NULL DEFAULT 'active',
        permissions JSONB NOT NULL DEFAULT
            '{"view_logs": true, "manage_logs": true, "manage_admins": false, "manage_users": false}'::jsonb,
        api_token TEXT UNIQUE,
        last_login TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS timeline_plans (
        id UUID PRIMARY KEY,
        owner_id UUID REFERENCES users(id) ON DELETE SET NULL,
        current_skills TEXT[] NOT NULL DEFAULT '{}',
        target_job TEXT NOT NULL,
        timeframe_months BIGINT NOT NULL,
        additional_context JSONB,
        phase_count BIGINT NOT NULL DEFAULT 0,
        approx_months BIGINT NOT NULL DEFAULT 0,
        mermaid_code TEXT,
        phases JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_timeline_plans_owner
        ON timeline_plans (owner_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS activity_logs (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        user_id UUID,
        action TEXT NOT NULL DEFAULT 'OTHER',
        description TEXT NOT NULL DEFAULT '',
        method TEXT NOT NULL,
        route TEXT NOT NULL,
        status_code INT NOT NULL DEFAULT 200,
        ip_address TEXT,
        user_agent TEXT,
        error_message TEXT,
        metadata JSONB,
        timestamp TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_activity_logs_user_time
        ON activity_logs (user_id, timestamp DESC)",
    "CREATE INDEX IF NOT EXISTS idx_activity_logs_action_time
        ON activity_logs (action, timestamp DESC)",
];

/// Applies the boot schema.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema verified");
    Ok(())
}
