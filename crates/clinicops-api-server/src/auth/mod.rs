pub mod middleware;
pub mod verifier;

pub use verifier::{AuthUser, AuthVerifier};
