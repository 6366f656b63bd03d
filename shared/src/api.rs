//! API client types and trait definitions
//!
//! This module defines the contract with the environment backend. It is
//! implemented by both the native (reqwest) and WASM (gloo-net) HTTP clients.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{
    ActionResponse, ContainerStatusResponse, CostResponse, CreateEnvironmentRequest, EnvAction,
    EnvironmentId, EnvironmentRecord,
};

/// Base URL of the backend when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/v1";

/// API error types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ApiError {
    /// Network or connection error
    Network(String),
    /// Server returned an error status
    Server { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Authentication required or failed
    Auth(String),
    /// Resource not found
    NotFound(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
            ApiError::Server { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            ApiError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ApiError::Auth(msg) => write!(f, "Auth error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error body the backend attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Build an error for a non-2xx response.
    ///
    /// The backend's `{"detail": ...}` is preferred as the message; otherwise
    /// `fallback` is used (e.g. "Failed to create environment: Bad Request").
    pub fn from_status(status: u16, body: &str, fallback: impl Into<String>) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|b| match b.detail {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| fallback.into());

        match status {
            401 | 403 => ApiError::Auth(message),
            404 => ApiError::NotFound(message),
            _ => ApiError::Server { status, message },
        }
    }

    /// The message a user should see in a toast.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::Network(msg)
            | ApiError::Parse(msg)
            | ApiError::Auth(msg)
            | ApiError::NotFound(msg) => msg,
            ApiError::Server { message, .. } => message,
        }
    }
}

/// API endpoint definitions, relative to the `/api/v1` base URL
pub mod endpoints {
    use crate::{EnvAction, EnvironmentId};

    pub const ENVIRONMENTS: &str = "/environments/";
    pub const RESOURCE_GROUPS: &str = "/azure/resource-groups";

    pub fn environment(id: EnvironmentId) -> String {
        format!("/environments/{}", id)
    }

    pub fn environment_status(id: EnvironmentId) -> String {
        format!("/environments/{}/status", id)
    }

    pub fn environment_action(id: EnvironmentId, action: EnvAction) -> String {
        format!("/environments/{}/{}", id, action.as_str())
    }

    pub fn app_cost(id: EnvironmentId, days: u32) -> String {
        format!("/cost/app/{}?days={}", id, days)
    }

    pub fn container_apps(resource_group: &str) -> String {
        format!(
            "/azure/resource-groups/{}/container-apps",
            url::form_urlencoded::byte_serialize(resource_group.as_bytes()).collect::<String>()
        )
    }
}

/// Trait defining the environment backend API
///
/// This trait can be implemented by both native and WASM HTTP clients.
/// All methods are async and return Result<T, ApiError>.
#[allow(async_fn_in_trait)]
pub trait EnvironmentApi {
    /// List all registered environments
    async fn list_environments(&self) -> Result<Vec<EnvironmentRecord>, ApiError>;

    /// Register a new environment
    async fn create_environment(
        &self,
        req: &CreateEnvironmentRequest,
    ) -> Result<EnvironmentRecord, ApiError>;

    /// Delete an environment
    async fn delete_environment(&self, id: EnvironmentId) -> Result<(), ApiError>;

    /// Fetch raw frontend/backend container statuses
    async fn environment_status(
        &self,
        id: EnvironmentId,
    ) -> Result<ContainerStatusResponse, ApiError>;

    /// Start, stop or restart both containers of an environment
    async fn run_action(
        &self,
        id: EnvironmentId,
        action: EnvAction,
    ) -> Result<ActionResponse, ApiError>;

    /// Daily cost data for the last `days` days
    async fn environment_cost(&self, id: EnvironmentId, days: u32)
        -> Result<CostResponse, ApiError>;

    /// Resource groups visible to the backend's Azure credentials
    async fn resource_groups(&self) -> Result<Vec<String>, ApiError>;

    /// Container apps inside a resource group
    async fn container_apps(&self, resource_group: &str) -> Result<Vec<String>, ApiError>;
}

/// Configuration for creating an API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the backend API (e.g., "http://127.0.0.1:8000/api/v1")
    pub base_url: String,
    /// Optional bearer token for authenticated requests
    pub auth_token: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

/// Wraps an [`EnvironmentApi`] and memoizes the Azure discovery lookups.
///
/// Resource groups and container apps are cached for the lifetime of the
/// wrapper with no expiry; everything else passes straight through. Failed
/// lookups are not cached.
pub struct CachedDiscovery<A> {
    inner: A,
    resource_groups: Mutex<Option<Vec<String>>>,
    container_apps: Mutex<HashMap<String, Vec<String>>>,
}

impl<A> CachedDiscovery<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            resource_groups: Mutex::new(None),
            container_apps: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: EnvironmentApi> EnvironmentApi for CachedDiscovery<A> {
    async fn list_environments(&self) -> Result<Vec<EnvironmentRecord>, ApiError> {
        self.inner.list_environments().await
    }

    async fn create_environment(
        &self,
        req: &CreateEnvironmentRequest,
    ) -> Result<EnvironmentRecord, ApiError> {
        self.inner.create_environment(req).await
    }

    async fn delete_environment(&self, id: EnvironmentId) -> Result<(), ApiError> {
        self.inner.delete_environment(id).await
    }

    async fn environment_status(
        &self,
        id: EnvironmentId,
    ) -> Result<ContainerStatusResponse, ApiError> {
        self.inner.environment_status(id).await
    }

    async fn run_action(
        &self,
        id: EnvironmentId,
        action: EnvAction,
    ) -> Result<ActionResponse, ApiError> {
        self.inner.run_action(id, action).await
    }

    async fn environment_cost(
        &self,
        id: EnvironmentId,
        days: u32,
    ) -> Result<CostResponse, ApiError> {
        self.inner.environment_cost(id, days).await
    }

    async fn resource_groups(&self) -> Result<Vec<String>, ApiError> {
        if let Some(cached) = self
            .resource_groups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            return Ok(cached);
        }

        let groups = self.inner.resource_groups().await?;
        *self
            .resource_groups
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(groups.clone());
        Ok(groups)
    }

    async fn container_apps(&self, resource_group: &str) -> Result<Vec<String>, ApiError> {
        if let Some(cached) = self
            .container_apps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(resource_group)
            .cloned()
        {
            return Ok(cached);
        }

        let apps = self.inner.container_apps(resource_group).await?;
        self.container_apps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(resource_group.to_string(), apps.clone());
        Ok(apps)
    }
}
