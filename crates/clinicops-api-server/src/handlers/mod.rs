pub mod chat;
pub mod deals;
pub mod health;
pub mod invoices;
pub mod leave;
pub mod patients;
pub mod projects;
pub mod reports;
pub mod tickets;
pub mod workflows;
