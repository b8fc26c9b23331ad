use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Link between a teacher and the subject it teaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeacherSubject {
    pub id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAssignmentRequest {
    pub teacher_id: String,
    pub subject_id: String,
}
