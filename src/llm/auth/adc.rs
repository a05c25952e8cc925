//! Application Default Credentials (ADC) wrapper for Vertex AI access

use gcp_auth::AuthenticationManager as GcpAuthManager;

use crate::llm::core::error::LlmError;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Supplies bearer tokens for Vertex AI calls
///
/// Credentials are discovered from `GOOGLE_APPLICATION_CREDENTIALS`,
/// `gcloud auth application-default login`, or the metadata server.
/// Tokens are cached and refreshed by `gcp_auth`.
pub struct AuthenticationManager {
    inner: GcpAuthManager,
}

impl AuthenticationManager {
    /// Discover credentials using the standard ADC flow
    ///
    /// # Errors
    /// Returns an error if no valid credentials can be found.
    pub async fn new() -> Result<Self, LlmError> {
        let inner = GcpAuthManager::new()
            .await
            .map_err(|e| {
                LlmError::AuthenticationError(format!("Failed to initialize ADC: {}", e))
            })?;

        Ok(Self { inner })
    }

    /// Access token for the cloud-platform scope
    pub async fn get_token(&self) -> Result<String, LlmError> {
        let token = self
            .inner
            .get_token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| LlmError::AuthenticationError(format!("Failed to get token: {}", e)))?;

        Ok(token.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Needs ADC credentials on the host
    async fn test_token_for_cloud_platform_scope() {
        let auth = AuthenticationManager::new()
            .await
            .expect("Failed to initialize AuthenticationManager");

        let token = auth
            .get_token()
            .await
            .expect("Failed to retrieve access token");

        assert!(token.len() > 20, "Token seems too short: {} characters", token.len());
    }
}
