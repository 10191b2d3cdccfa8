pub mod settings;

pub use settings::{AuthConfig, DatabaseConfig, MailConfig, ServerConfig, Settings, WorkflowConfig};
