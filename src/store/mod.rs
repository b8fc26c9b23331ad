//! Collaborator contracts consumed by the scheduling services.
//!
//! Each store is an object-safe async trait so services can hold
//! `Arc<dyn ...>` handles; the SQLite implementation lives in
//! [`crate::db::repository`].

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::db::repository::SqliteStore;
use crate::error::AppError;
use crate::models::{
    Availability, Course, DayOfWeek, GenerationHistory, Schedule, Subject, Teacher, TeacherSubject,
};

#[async_trait]
pub trait TeacherStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Teacher>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Teacher>, AppError>;
    async fn save(&self, teacher: &Teacher) -> Result<Teacher, AppError>;
}

#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// Catalog order (insertion order).
    async fn find_all(&self) -> Result<Vec<Subject>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Subject>, AppError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Subject>, AppError>;
    async fn save(&self, subject: &Subject) -> Result<Subject, AppError>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Stored order (insertion order).
    async fn find_all(&self) -> Result<Vec<Course>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, AppError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Course>, AppError>;
    async fn save(&self, course: &Course) -> Result<Course, AppError>;
}

#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn find_by_teacher(&self, teacher_id: &str) -> Result<Vec<Availability>, AppError>;
    async fn find_by_teacher_and_day(
        &self,
        teacher_id: &str,
        day: DayOfWeek,
    ) -> Result<Vec<Availability>, AppError>;
    /// Insert or replace the row for `(teacher_id, day)`.
    async fn save(&self, availability: &Availability) -> Result<Availability, AppError>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<TeacherSubject>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<TeacherSubject>, AppError>;
    async fn find_by_teacher(&self, teacher_id: &str) -> Result<Vec<TeacherSubject>, AppError>;
    async fn find_by_subject(&self, subject_id: &str) -> Result<Vec<TeacherSubject>, AppError>;
    async fn find_by_teacher_and_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<Option<TeacherSubject>, AppError>;
    async fn exists_by_teacher_and_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .find_by_teacher_and_subject(teacher_id, subject_id)
            .await?
            .is_some())
    }
    async fn save(&self, assignment: &TeacherSubject) -> Result<TeacherSubject, AppError>;
}

/// Everything a successful generation run persists.
pub struct RunCommit<'a> {
    /// Delete every existing slot before inserting `schedules`.
    pub replace_existing: bool,
    pub schedules: &'a [Schedule],
    /// Terminal state of the run; its RUNNING row must already exist.
    pub record: &'a GenerationHistory,
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Schedule>, AppError>;
    async fn find_by_course(&self, course_id: &str) -> Result<Vec<Schedule>, AppError>;
    async fn find_by_teacher(&self, teacher_id: &str) -> Result<Vec<Schedule>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    /// Writes a run's slots and its terminal history row in one
    /// transaction. Returns the number of slots deleted when
    /// `replace_existing` is set.
    async fn commit_run(&self, run: RunCommit<'_>) -> Result<u64, AppError>;
    async fn delete_by_id(&self, id: &str) -> Result<bool, AppError>;
    async fn delete_by_day(&self, day: DayOfWeek) -> Result<u64, AppError>;
    async fn delete_all(&self) -> Result<u64, AppError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert or update a run record.
    async fn save(&self, record: &GenerationHistory) -> Result<GenerationHistory, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<GenerationHistory>, AppError>;
    /// Newest first.
    async fn find_recent(&self, limit: i64) -> Result<Vec<GenerationHistory>, AppError>;
}

/// Every store the services need, as shared trait objects.
#[derive(Clone)]
pub struct Stores {
    pub teachers: Arc<dyn TeacherStore>,
    pub subjects: Arc<dyn SubjectStore>,
    pub courses: Arc<dyn CourseStore>,
    pub availabilities: Arc<dyn AvailabilityStore>,
    pub assignments: Arc<dyn AssignmentStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub history: Arc<dyn HistoryStore>,
}

impl Stores {
    pub fn sqlite(db: SqlitePool) -> Self {
        let store = Arc::new(SqliteStore::new(db));
        Self {
            teachers: store.clone(),
            subjects: store.clone(),
            courses: store.clone(),
            availabilities: store.clone(),
            assignments: store.clone(),
            schedules: store.clone(),
            history: store,
        }
    }
}
