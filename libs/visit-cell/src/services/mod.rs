pub mod visit;

pub use visit::VisitService;
