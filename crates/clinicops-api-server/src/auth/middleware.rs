use crate::auth::verifier::AuthVerifier;
use crate::utils::error::ApiError;
use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::Arc;

/// Verifies the Authorization header against the hosted auth provider and
/// injects the resulting `AuthUser` into request extensions.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let verifier = request
        .extensions()
        .get::<Arc<AuthVerifier>>()
        .ok_or_else(|| ApiError::Internal("auth verifier not configured".to_string()))?
        .clone();

    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?
        .to_string();

    let user = verifier.verify(&token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verifier::AuthUser;
    use crate::config::AuthConfig;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::util::ServiceExt;
    use uuid::Uuid;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn whoami(Extension(user): Extension<AuthUser>) -> String {
        user.user_id.to_string()
    }

    fn test_router(verifier: Arc<AuthVerifier>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn(auth_middleware))
            .layer(Extension(verifier))
    }

    #[tokio::test]
    async fn test_missing_header_is_401() {
        let server = MockServer::start().await;
        let verifier = Arc::new(AuthVerifier::new(&AuthConfig {
            base_url: server.uri(),
            timeout_seconds: 2,
        }));

        let response = test_router(verifier)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let server = MockServer::start().await;
        let user_id = Uuid::new_v4();

        Mock::given(method("POST"))
            .and(path("/v1/introspect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "active": true,
                "user_id": user_id,
                "tenant_id": Uuid::new_v4(),
                "email": "a@b.c",
                "role": "staff",
            })))
            .mount(&server)
            .await;

        let verifier = Arc::new(AuthVerifier::new(&AuthConfig {
            base_url: server.uri(),
            timeout_seconds: 2,
        }));

        let response = test_router(verifier)
            .oneshot(
                axum::http::Request::builder()
                    .uri("/whoami")
                    .header("Authorization", "Bearer tok")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let body = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        assert_eq!(body, user_id.to_string().as_bytes());
    }
}
