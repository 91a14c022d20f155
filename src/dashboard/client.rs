use crate::config::DashboardConfig;
use crate::error::{AppError, Result};
use crate::store::Service;
use serde::Deserialize;
use serde_json::Value;

/// Client for the homedash service API
#[derive(Clone)]
pub struct DashboardClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl DashboardClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds,
            ))
            .no_proxy()
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn services_url(&self) -> String {
        format!("{}/api/services", self.base_url)
    }

    /// Fetch the whole collection in on-disk order
    ///
    /// Records that do not decode as a service (hand-edited entries without a
    /// `url`, non-string fields) are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns error if the API is unreachable or answers with a failure
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let response = self.client.get(self.services_url()).send().await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "Failed to fetch services").await);
        }

        let records: Vec<Value> = response.json().await?;
        let total = records.len();
        let services: Vec<Service> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::warn!("Skipping service record #{}: {}", index, e);
                    None
                }
            })
            .collect();

        if services.len() < total {
            tracing::warn!(
                "Showing {} of {} stored services",
                services.len(),
                total
            );
        }
        Ok(services)
    }

    /// Submit one service to be appended to the collection
    ///
    /// # Errors
    ///
    /// Returns error if the API is unreachable or rejects the service
    pub async fn add_service(&self, service: &Service) -> Result<()> {
        let response = self
            .client
            .post(self.services_url())
            .json(service)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response, "Failed to add service").await);
        }

        Ok(())
    }

    async fn api_error(response: reqwest::Response, context: &str) -> AppError {
        let status = response.status();
        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());

        AppError::Api(format!("{} ({}): {}", context, status, detail))
    }
}
