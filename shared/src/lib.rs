//! Types and client-side services shared by the KPortal dashboard and CLI.
//!
//! Everything in this crate compiles for both native targets and
//! `wasm32-unknown-unknown`, so it stays free of runtime-specific code:
//! timers and HTTP transports are supplied by the callers.

use serde::{Deserialize, Serialize};

// Environment records, view models and the dashboard board
pub mod environment;
pub use environment::{
    ContainerApp, CreateEnvironmentRequest, Environment, EnvironmentBoard, EnvironmentId,
    EnvironmentRecord, EnvironmentType, FormError, NewEnvironment,
};

// Display status classification and per-card action state
pub mod status;
pub use status::{classify, CardState, Controls, DisplayStatus, EnvAction, StatusPair};

// Status polling service
pub mod poller;
pub use poller::{PageVisibility, PollHandle, PollOutcome, StatusFeed, StatusPoller};

// Session guard and identity redirect contract
pub mod session;
pub use session::{
    AuthResolution, AuthSessionProvider, GuardDecision, GuardView, InteractionStatus,
    LoginRedirectState, SessionGuard, SessionSnapshot,
};

// Cost analytics data
pub mod cost;
pub use cost::{CostResponse, CostSummary, DailyCost};

// API client types and trait
pub mod api;
pub use api::{ApiClientConfig, ApiError, CachedDiscovery, EnvironmentApi};

/// Raw container statuses as reported by `GET /environments/{id}/status`.
///
/// The strings come straight from Azure and have no fixed vocabulary; see
/// [`classify`] for how they map onto [`DisplayStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStatusResponse {
    pub frontend_status: String,
    pub backend_status: String,
}

/// Response body of the start/stop/restart endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_response_parses_backend_payload() {
        let parsed: ContainerStatusResponse = serde_json::from_value(serde_json::json!({
            "frontend_status": "Running",
            "backend_status": "Provisioning"
        }))
        .unwrap();

        assert_eq!(StatusPair::from(&parsed).frontend, DisplayStatus::Running);
        assert_eq!(StatusPair::from(&parsed).backend, DisplayStatus::Starting);
    }

    #[test]
    fn action_response_tolerates_empty_body_object() {
        let parsed: ActionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.status, "");

        let parsed: ActionResponse =
            serde_json::from_str(r#"{"status": "Restart initiated successfully"}"#).unwrap();
        assert_eq!(parsed.status, "Restart initiated successfully");
    }
}
