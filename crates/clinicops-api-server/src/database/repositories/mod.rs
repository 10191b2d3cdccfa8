pub mod chat;
pub mod deals;
pub mod invoices;
pub mod leave;
pub mod patients;
pub mod projects;
pub mod reports;
pub mod tickets;
pub mod users;
pub mod workflows;

pub use chat::ChatRepository;
pub use deals::DealRepository;
pub use invoices::InvoiceRepository;
pub use leave::LeaveRepository;
pub use patients::PatientRepository;
pub use projects::ProjectRepository;
pub use reports::ReportRepository;
pub use tickets::TicketRepository;
pub use users::UserRepository;
pub use workflows::WorkflowRepository;
