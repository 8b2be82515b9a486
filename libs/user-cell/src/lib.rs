pub mod handlers;
pub mod models;
pub mod policy;
pub mod router;
pub mod services;
pub mod validation;

pub use models::*;
pub use policy::{user_field_policy, FieldPolicy};
pub use services::*;
