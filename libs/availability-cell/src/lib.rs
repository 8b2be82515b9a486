pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::AvailabilityError;
pub use models::*;
pub use services::{
    store::{AvailabilityStore, ScheduleQuery, SupabaseAvailabilityStore, TimeRange, VisitQuery},
    validator::{supabase_validator, AvailabilityValidator},
};
