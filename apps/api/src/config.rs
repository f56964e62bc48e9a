use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Panics at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Interpreter used to run the generator scripts.
    pub python_bin: String,
    pub timeline_script: String,
    pub plan_script: String,
    /// Base URL of the Python career-analysis service.
    pub career_ai_url: String,
    pub jobs_api_url: String,
    pub jobs_api_host: String,
    pub jobs_api_key: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            python_bin: env_or("PYTHON_BIN", "python3"),
            timeline_script: env_or("TIMELINE_SCRIPT", "scripts/generate_timeline.py"),
            plan_script: env_or("PLAN_SCRIPT", "scripts/generate_plan.py"),
            career_ai_url: env_or("CAREER_AI_URL", "http://127.0.0.1:5000"),
            jobs_api_url: env_or("JOBS_API_URL", "https://jsearch.p.rapidapi.com/search"),
            jobs_api_host: env_or("JOBS_API_HOST", "jsearch.p.rapidapi.com"),
            jobs_api_key: require_env("JOBS_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
