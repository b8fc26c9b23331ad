use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub name: String,
    /// `None` means the course is unassigned and skipped by generation.
    pub teacher_subject_id: Option<String>,
    pub created_at: String,
}

impl Course {
    pub fn is_assigned(&self) -> bool {
        self.teacher_subject_id.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCourseRequest {
    pub name: String,
    #[serde(default)]
    pub teacher_subject_id: Option<String>,
}
