//! Client for the hosted job-search API and the shaping of its results.

use std::collections::HashSet;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::errors::AppError;

pub mod handlers;

const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Hard cap on the listings returned to a client, across all skill queries.
pub const MAX_LISTINGS: usize = 30;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<JobHit>,
}

/// One hit as the upstream returns it. The API omits fields freely, so
/// everything is optional.
#[derive(Debug, Deserialize)]
pub struct JobHit {
    pub job_title: Option<String>,
    pub employer_name: Option<String>,
    pub job_city: Option<String>,
    pub job_country: Option<String>,
    pub job_salary: Option<Value>,
    pub job_apply_link: Option<String>,
}

/// The listing shape this API exposes to its own clients.
#[derive(Debug, Clone, Serialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub apply_link: String,
}

impl JobHit {
    fn into_listing(self) -> JobListing {
        let location = [self.job_city, self.job_country]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        JobListing {
            title: self.job_title.unwrap_or_else(|| "Untitled role".to_string()),
            company: self.employer_name.unwrap_or_else(|| "Unknown".to_string()),
            location,
            salary: salary_text(self.job_salary),
            apply_link: self.job_apply_link.unwrap_or_default(),
        }
    }
}

fn salary_text(salary: Option<Value>) -> String {
    match salary {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::Number(amount)) => amount.to_string(),
        _ => "Not specified".to_string(),
    }
}

/// Collapses duplicate titles (case-insensitive, first one wins) and caps
/// the list at [`MAX_LISTINGS`].
pub fn dedup_listings(hits: Vec<JobHit>) -> Vec<JobListing> {
    let mut seen = HashSet::new();
    let mut listings = Vec::new();
    for hit in hits {
        let listing = hit.into_listing();
        if seen.insert(listing.title.to_ascii_lowercase()) {
            listings.push(listing);
            if listings.len() == MAX_LISTINGS {
                break;
            }
        }
    }
    listings
}

#[derive(Clone)]
pub struct JobSearchClient {
    client: Client,
    api_url: String,
    api_host: String,
    api_key: String,
}

impl JobSearchClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_url: config.jobs_api_url.clone(),
            api_host: config.jobs_api_host.clone(),
            api_key: config.jobs_api_key.clone(),
        }
    }

    /// One upstream search. `query` is free text, e.g. "rust developer jobs".
    pub async fn search(
        &self,
        query: &str,
        city: Option<&str>,
        country: Option<&str>,
    ) -> Result<Vec<JobHit>, AppError> {
        let mut params: Vec<(&str, String)> = vec![
            ("query", query.to_string()),
            ("page", "1".to_string()),
            ("num_pages", "3".to_string()),
            ("date_posted", "all".to_string()),
        ];
        if let Some(country) = country {
            params.push(("country", country.to_string()));
        }
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.api_host)
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("job search request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "job search returned {status}: {body}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("job search returned invalid JSON: {e}")))?;
        debug!("job search for {query:?} returned {} hits", parsed.data.len());
        Ok(parsed.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(title: &str) -> JobHit {
        JobHit {
            job_title: Some(title.to_string()),
            employer_name: Some("Acme".to_string()),
            job_city: Some("Berlin".to_string()),
            job_country: Some("DE".to_string()),
            job_salary: None,
            job_apply_link: Some("https://example.com/apply".to_string()),
        }
    }

    #[test]
    fn test_dedup_is_case_insensitive_and_keeps_first() {
        let hits = vec![hit("Rust Developer"), hit("rust developer"), hit("Go Developer")];
        let listings = dedup_listings(hits);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Rust Developer");
        assert_eq!(listings[1].title, "Go Developer");
    }

    #[test]
    fn test_listing_cap() {
        let hits = (0..100).map(|n| hit(&format!("Role {n}"))).collect();
        assert_eq!(dedup_listings(hits).len(), MAX_LISTINGS);
    }

    #[test]
    fn test_listing_shaping() {
        let listing = JobHit {
            job_title: None,
            employer_name: None,
            job_city: Some("Pune".to_string()),
            job_country: None,
            job_salary: Some(json!("")),
            job_apply_link: None,
        }
        .into_listing();
        assert_eq!(listing.title, "Untitled role");
        assert_eq!(listing.company, "Unknown");
        assert_eq!(listing.location, "Pune");
        assert_eq!(listing.salary, "Not specified");
        assert_eq!(listing.apply_link, "");
    }

    #[test]
    fn test_salary_text_accepts_numbers_and_strings() {
        assert_eq!(salary_text(Some(json!("$90k-$120k"))), "$90k-$120k");
        assert_eq!(salary_text(Some(json!(90000))), "90000");
        assert_eq!(salary_text(Some(json!(null))), "Not specified");
        assert_eq!(salary_text(None), "Not specified");
    }

    #[test]
    fn test_search_response_tolerates_missing_data() {
        let parsed: SearchResponse = serde_json::from_value(json!({"status": "OK"})).unwrap();
        assert!(parsed.data.is_empty());
    }
}
