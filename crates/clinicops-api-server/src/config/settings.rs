use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Hosted auth provider (token introspection endpoint).
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Mail SaaS used for workflow email sends.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub base_url: String,
    pub api_key: String,
    pub from_address: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    /// Upper bound on repeat_count expansion per action.
    pub max_occurrences: u32,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.timeout_seconds", 5)?
            .set_default("mail.timeout_seconds", 10)?
            .set_default("workflow.max_occurrences", 10)?
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}
