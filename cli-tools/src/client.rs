//! Native HTTP client implementation using reqwest

use reqwest::Client;
use shared::api::{endpoints, ApiClientConfig, ApiError, EnvironmentApi};
use shared::{
    ActionResponse, ContainerStatusResponse, CostResponse, CreateEnvironmentRequest, EnvAction,
    EnvironmentId, EnvironmentRecord,
};

/// Native API client using reqwest
pub struct NativeApiClient {
    client: Client,
    config: ApiClientConfig,
}

impl NativeApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self, ApiError> {
        let config = if let Some(t) = token {
            ApiClientConfig::new(base_url).with_token(t)
        } else {
            ApiClientConfig::new(base_url)
        };

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn add_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.config.auth_token {
            req.header("Authorization", format!("Bearer {}", token))
        } else {
            req
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        self.add_auth(req)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Turn a non-2xx response into an [`ApiError`], preferring the backend's
    /// `detail` over `context`.
    async fn check_status(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or("Unknown error");
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(
            status.as_u16(),
            &body,
            format!("{}: {}", context, reason),
        ))
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, ApiError> {
        let response = self.check_status(response, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl EnvironmentApi for NativeApiClient {
    async fn list_environments(&self) -> Result<Vec<EnvironmentRecord>, ApiError> {
        let url = self.config.url(endpoints::ENVIRONMENTS);
        let response = self.send(self.client.get(&url)).await?;
        self.handle_response(response, "Failed to load environments")
            .await
    }

    async fn create_environment(
        &self,
        req: &CreateEnvironmentRequest,
    ) -> Result<EnvironmentRecord, ApiError> {
        let url = self.config.url(endpoints::ENVIRONMENTS);
        let response = self.send(self.client.post(&url).json(req)).await?;
        self.handle_response(response, "Failed to create environment")
            .await
    }

    async fn delete_environment(&self, id: EnvironmentId) -> Result<(), ApiError> {
        let url = self.config.url(&endpoints::environment(id));
        let response = self.send(self.client.delete(&url)).await?;
        self.check_status(response, "Failed to delete environment")
            .await?;
        Ok(())
    }

    async fn environment_status(
        &self,
        id: EnvironmentId,
    ) -> Result<ContainerStatusResponse, ApiError> {
        let url = self.config.url(&endpoints::environment_status(id));
        let response = self.send(self.client.get(&url)).await?;
        self.handle_response(response, "Failed to fetch status")
            .await
    }

    async fn run_action(
        &self,
        id: EnvironmentId,
        action: EnvAction,
    ) -> Result<ActionResponse, ApiError> {
        let url = self.config.url(&endpoints::environment_action(id, action));
        let response = self.send(self.client.post(&url)).await?;
        let response = self
            .check_status(response, &format!("Failed to {} environment", action))
            .await?;

        // The body is informational only; tolerate anything
        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or(ActionResponse { status: text }))
    }

    async fn environment_cost(
        &self,
        id: EnvironmentId,
        days: u32,
    ) -> Result<CostResponse, ApiError> {
        let url = self.config.url(&endpoints::app_cost(id, days));
        let response = self.send(self.client.get(&url)).await?;
        self.handle_response(response, "Failed to fetch cost data")
            .await
    }

    async fn resource_groups(&self) -> Result<Vec<String>, ApiError> {
        let url = self.config.url(endpoints::RESOURCE_GROUPS);
        let response = self.send(self.client.get(&url)).await?;
        self.handle_response(response, "Failed to list resource groups")
            .await
    }

    async fn container_apps(&self, resource_group: &str) -> Result<Vec<String>, ApiError> {
        let url = self.config.url(&endpoints::container_apps(resource_group));
        let response = self.send(self.client.get(&url)).await?;
        self.handle_response(response, "Failed to list container apps")
            .await
    }
}
