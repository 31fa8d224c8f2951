pub mod auth;
pub mod health;
pub mod metrics;

pub use auth::{login, verify};
pub use health::health_check;
