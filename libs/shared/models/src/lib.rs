pub mod auth;
pub mod error;

pub use auth::{Actor, User, UserLevel};
pub use error::AppError;
