//! Build-time configuration, read from the environment when the WASM bundle
//! is compiled (e.g. `KPORTAL_API_URL=https://... trunk build`).

use shared::api::{ApiClientConfig, DEFAULT_API_URL};
use shared::session::AuthorityConfig;

use crate::utils;

pub fn api_base_url() -> &'static str {
    option_env!("KPORTAL_API_URL").unwrap_or(DEFAULT_API_URL)
}

pub fn api_client_config() -> ApiClientConfig {
    ApiClientConfig::new(api_base_url())
}

pub fn azure_client_id() -> &'static str {
    option_env!("KPORTAL_AZURE_CLIENT_ID").unwrap_or("")
}

pub fn azure_tenant_id() -> &'static str {
    option_env!("KPORTAL_AZURE_TENANT_ID").unwrap_or("common")
}

/// App registration for the sign-in redirect; Azure sends the user back to
/// the page origin.
pub fn authority_config() -> AuthorityConfig {
    AuthorityConfig {
        client_id: azure_client_id().to_string(),
        tenant_id: azure_tenant_id().to_string(),
        redirect_uri: utils::get_base_url(),
    }
}
