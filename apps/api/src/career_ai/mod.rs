//! Client for the Python career-analysis service.

use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::errors::AppError;

pub mod handlers;

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct CareerAiClient {
    client: Client,
    base_url: String,
}

impl CareerAiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: config.career_ai_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn career_recommendations(&self, body: &Value) -> Result<Value, AppError> {
        self.post("/ai/career-recommendations", body).await
    }

    pub async fn skill_suggestions(&self, body: &Value) -> Result<Value, AppError> {
        self.post("/ai/skill-suggestions", body).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("career analysis request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "career analysis service returned {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("career analysis returned invalid JSON: {e}")))
    }
}
