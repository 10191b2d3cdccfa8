use crate::config::MailConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Mail SaaS client: one POST per send, response mapped to Result.
pub struct MailClient {
    client: Client,
    base_url: String,
    api_key: String,
    from_address: String,
}

impl MailClient {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        debug!("Sending mail to {}: {}", to, subject);

        let url = format!("{}/v1/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SendRequest {
                from: &self.from_address,
                to,
                subject,
                body,
            })
            .send()
            .await
            .context("Failed to connect to mail provider")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Mail API error ({}): {}", status, text);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> MailConfig {
        MailConfig {
            base_url: server.uri(),
            api_key: "k".to_string(),
            from_address: "noreply@example.com".to_string(),
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn test_send_posts_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("authorization", "Bearer k"))
            .and(body_json_string(
                r#"{"from":"noreply@example.com","to":"ana@example.com","subject":"s","body":"b"}"#,
            ))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = MailClient::new(&config_for(&server));
        mailer.send("ana@example.com", "s", "b").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_maps_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad address"))
            .mount(&server)
            .await;

        let mailer = MailClient::new(&config_for(&server));
        let err = mailer.send("x", "s", "b").await.unwrap_err();
        assert!(err.to_string().contains("422"));
    }
}
