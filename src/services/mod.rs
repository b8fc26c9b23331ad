pub mod auto_assignment;
pub mod availability;
pub mod catalog;
pub mod diagnostic;
pub mod generation;
pub mod schedule_service;

pub use auto_assignment::{AutoAssignmentReport, AutoAssignmentService, MAX_COURSES_PER_TEACHER};
pub use availability::AvailabilityService;
pub use catalog::CatalogService;
pub use diagnostic::Diagnostic;
pub use generation::{GenerationRequest, GenerationSummary, Period, ScheduleGenerationService};
pub use schedule_service::{ScheduleService, SLOT_DURATION_MINUTES};
