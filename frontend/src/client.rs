//! Browser HTTP client implementation using gloo-net

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::api::{endpoints, ApiClientConfig, ApiError, EnvironmentApi};
use shared::{
    ActionResponse, ContainerStatusResponse, CostResponse, CreateEnvironmentRequest, EnvAction,
    EnvironmentId, EnvironmentRecord,
};

/// API client used by the dashboard
pub struct WasmApiClient {
    config: ApiClientConfig,
}

impl WasmApiClient {
    pub fn new(config: ApiClientConfig) -> Self {
        Self { config }
    }

    fn add_auth(&self, req: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.config.auth_token {
            req.header("Authorization", &format!("Bearer {}", token))
        } else {
            req
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        self.add_auth(req)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn check_status(&self, response: Response, context: &str) -> Result<Response, ApiError> {
        if response.ok() {
            return Ok(response);
        }
        let fallback = format!("{}: {}", context, response.status_text());
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(response.status(), &body, fallback))
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        context: &str,
    ) -> Result<T, ApiError> {
        let response = self.check_status(response, context).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

impl EnvironmentApi for WasmApiClient {
    async fn list_environments(&self) -> Result<Vec<EnvironmentRecord>, ApiError> {
        let url = self.config.url(endpoints::ENVIRONMENTS);
        let response = self.send(Request::get(&url)).await?;
        self.handle_response(response, "Failed to load environments")
            .await
    }

    async fn create_environment(
        &self,
        req: &CreateEnvironmentRequest,
    ) -> Result<EnvironmentRecord, ApiError> {
        let url = self.config.url(endpoints::ENVIRONMENTS);
        let request = self
            .add_auth(Request::post(&url))
            .json(req)
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        self.handle_response(response, "Failed to create environment")
            .await
    }

    async fn delete_environment(&self, id: EnvironmentId) -> Result<(), ApiError> {
        let url = self.config.url(&endpoints::environment(id));
        let response = self.send(Request::delete(&url)).await?;
        self.check_status(response, "Failed to delete environment")
            .await?;
        Ok(())
    }

    async fn environment_status(
        &self,
        id: EnvironmentId,
    ) -> Result<ContainerStatusResponse, ApiError> {
        let url = self.config.url(&endpoints::environment_status(id));
        let response = self.send(Request::get(&url)).await?;
        self.handle_response(response, "Failed to fetch status")
            .await
    }

    async fn run_action(
        &self,
        id: EnvironmentId,
        action: EnvAction,
    ) -> Result<ActionResponse, ApiError> {
        let url = self.config.url(&endpoints::environment_action(id, action));
        let response = self.send(Request::post(&url)).await?;
        let response = self
            .check_status(response, &format!("Failed to {} environment", action))
            .await?;

        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str(&text).unwrap_or(ActionResponse { status: text }))
    }

    async fn environment_cost(
        &self,
        id: EnvironmentId,
        days: u32,
    ) -> Result<CostResponse, ApiError> {
        let url = self.config.url(&endpoints::app_cost(id, days));
        let response = self.send(Request::get(&url)).await?;
        self.handle_response(response, "Failed to fetch cost data")
            .await
    }

    async fn resource_groups(&self) -> Result<Vec<String>, ApiError> {
        let url = self.config.url(endpoints::RESOURCE_GROUPS);
        let response = self.send(Request::get(&url)).await?;
        self.handle_response(response, "Failed to list resource groups")
            .await
    }

    async fn container_apps(&self, resource_group: &str) -> Result<Vec<String>, ApiError> {
        let url = self.config.url(&endpoints::container_apps(resource_group));
        let response = self.send(Request::get(&url)).await?;
        self.handle_response(response, "Failed to list container apps")
            .await
    }
}
