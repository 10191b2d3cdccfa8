pub mod mailer;
pub mod template;
pub mod workflow_engine;

pub use mailer::MailClient;
pub use template::TemplateRenderer;
pub use workflow_engine::{WorkflowEngine, WorkflowRunSummary};
