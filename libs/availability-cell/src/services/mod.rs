pub mod rules;
pub mod store;
pub mod validator;

pub use store::{AvailabilityStore, SupabaseAvailabilityStore};
pub use validator::AvailabilityValidator;
