//! Shared application context: pool, repositories and services.

use crate::auth::AuthVerifier;
use crate::config::Settings;
use crate::database::repositories::{
    ChatRepository, DealRepository, InvoiceRepository, LeaveRepository, PatientRepository,
    ProjectRepository, ReportRepository, TicketRepository, UserRepository, WorkflowRepository,
};
use crate::database::DbPool;
use crate::handlers::workflows::WorkflowLimits;
use crate::services::{MailClient, WorkflowEngine};
use std::sync::Arc;

pub struct AppContext {
    pub pool: Arc<DbPool>,
    pub users: Arc<UserRepository>,
    pub patients: Arc<PatientRepository>,
    pub deals: Arc<DealRepository>,
    pub workflows: Arc<WorkflowRepository>,
    pub projects: Arc<ProjectRepository>,
    pub invoices: Arc<InvoiceRepository>,
    pub leave: Arc<LeaveRepository>,
    pub chat: Arc<ChatRepository>,
    pub reports: Arc<ReportRepository>,
    pub tickets: Arc<TicketRepository>,
    pub verifier: Arc<AuthVerifier>,
    pub engine: Arc<WorkflowEngine>,
    pub limits: WorkflowLimits,
}

impl AppContext {
    pub fn new(settings: &Settings, pool: DbPool) -> Self {
        let pg = pool.get_pool().clone();
        let pool = Arc::new(pool);

        let workflows = Arc::new(WorkflowRepository::new(pg.clone()));
        let mailer = Arc::new(MailClient::new(&settings.mail));
        let engine = Arc::new(WorkflowEngine::new(
            workflows.clone(),
            mailer,
            settings.workflow.max_occurrences,
        ));

        Self {
            pool,
            users: Arc::new(UserRepository::new(pg.clone())),
            patients: Arc::new(PatientRepository::new(pg.clone())),
            deals: Arc::new(DealRepository::new(pg.clone())),
            workflows,
            projects: Arc::new(ProjectRepository::new(pg.clone())),
            invoices: Arc::new(InvoiceRepository::new(pg.clone())),
            leave: Arc::new(LeaveRepository::new(pg.clone())),
            chat: Arc::new(ChatRepository::new(pg.clone())),
            reports: Arc::new(ReportRepository::new(pg.clone())),
            tickets: Arc::new(TicketRepository::new(pg)),
            verifier: Arc::new(AuthVerifier::new(&settings.auth)),
            engine,
            limits: WorkflowLimits {
                max_occurrences: settings.workflow.max_occurrences,
            },
        }
    }
}
