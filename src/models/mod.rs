pub mod assignment;
pub mod availability;
pub mod course;
pub mod day;
pub mod history;
pub mod schedule;
pub mod subject;
pub mod teacher;

pub use assignment::{NewAssignmentRequest, TeacherSubject};
pub use availability::{Availability, AvailabilityRequest};
pub use course::{Course, NewCourseRequest};
pub use day::DayOfWeek;
pub use history::{GenerationHistory, GenerationStatus};
pub use schedule::{Schedule, TimeSlot};
pub use subject::{NewSubjectRequest, Subject};
pub use teacher::{NewTeacherRequest, Teacher};

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
