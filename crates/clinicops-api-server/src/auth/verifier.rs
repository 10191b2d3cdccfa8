use crate::config::AuthConfig;
use crate::utils::error::ApiError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Identity attached to a request after bearer verification.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Serialize)]
struct IntrospectRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct IntrospectResponse {
    active: bool,
    user_id: Option<Uuid>,
    tenant_id: Option<Uuid>,
    email: Option<String>,
    role: Option<String>,
}

/// Client for the hosted auth provider's token introspection endpoint.
#[derive(Clone)]
pub struct AuthVerifier {
    client: Client,
    base_url: String,
}

impl AuthVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.clone(),
        }
    }

    pub async fn verify(&self, token: &str) -> Result<AuthUser, ApiError> {
        let url = format!("{}/v1/introspect", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&IntrospectRequest { token })
            .send()
            .await
            .map_err(|e| ApiError::Upstream(format!("auth provider unreachable: {}", e)))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(ApiError::Unauthorized("invalid token".to_string()));
        }
        if !status.is_success() {
            return Err(ApiError::Upstream(format!(
                "auth provider returned {}",
                status
            )));
        }

        let body: IntrospectResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("bad introspection response: {}", e)))?;

        if !body.active {
            return Err(ApiError::Unauthorized("token not active".to_string()));
        }

        match (body.user_id, body.tenant_id) {
            (Some(user_id), Some(tenant_id)) => {
                debug!("Token verified for user {}", user_id);
                Ok(AuthUser {
                    user_id,
                    tenant_id,
                    email: body.email.unwrap_or_default(),
                    role: body.role.unwrap_or_else(|| "staff".to_string()),
                })
            }
            _ => Err(ApiError::Unauthorized(
                "introspection response missing identity".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AuthConfig {
        AuthConfig {
            base_url: server.uri(),
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_active_token_maps_to_auth_user() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/v1/introspect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "active": true,
                "user_id": user_id,
                "tenant_id": tenant_id,
                "email": "staff@example.com",
                "role": "admin",
            })))
            .mount(&server)
            .await;

        let verifier = AuthVerifier::new(&config_for(&server));
        let user = verifier.verify("sometoken").await.unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.tenant_id, tenant_id);
        assert!(user.is_admin());
    }

    #[tokio::test]
    async fn test_inactive_token_is_unauthorized() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/introspect"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "active": false })),
            )
            .mount(&server)
            .await;

        let verifier = AuthVerifier::new(&config_for(&server));
        let err = verifier.verify("expired").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_provider_5xx_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/introspect"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let verifier = AuthVerifier::new(&config_for(&server));
        let err = verifier.verify("token").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
