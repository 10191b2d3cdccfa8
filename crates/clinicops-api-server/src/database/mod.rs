pub mod models;
pub mod pool;
pub mod repositories;

pub use models::*;
pub use pool::DbPool;
