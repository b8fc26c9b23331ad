use tracing::info;

use crate::error::AppError;
use crate::models::{
    new_id, now, Course, NewAssignmentRequest, NewCourseRequest, NewSubjectRequest,
    NewTeacherRequest, Subject, Teacher, TeacherSubject,
};
use crate::store::Stores;

/// Admin-side creation of teachers, subjects, courses and assignments.
pub struct CatalogService {
    stores: Stores,
}

impl CatalogService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn list_teachers(&self) -> Result<Vec<Teacher>, AppError> {
        self.stores.teachers.find_all().await
    }

    pub async fn create_teacher(&self, req: NewTeacherRequest) -> Result<Teacher, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("teacher name is required".to_string()));
        }
        self.stores
            .teachers
            .save(&Teacher {
                id: new_id(),
                name: name.to_string(),
                created_at: now(),
            })
            .await
    }

    pub async fn list_subjects(&self) -> Result<Vec<Subject>, AppError> {
        self.stores.subjects.find_all().await
    }

    pub async fn create_subject(&self, req: NewSubjectRequest) -> Result<Subject, AppError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("subject name is required".to_string()));
        }
        if self.stores.subjects.find_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("subject {} already exists", name)));
        }
        self.stores
            .subjects
            .save(&Subject {
                id: new_id(),
                name: name.to_string(),
                created_at: now(),
            })
            .await
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        self.stores.courses.find_all().await
    }

    pub async fn create_course(&self, req: NewCourseRequest) -> Result<Course, AppError> {
        validate_course_name(&req.name)?;
        if self.stores.courses.find_by_name(&req.name).await?.is_some() {
            return Err(AppError::Conflict(format!("course {} already exists", req.name)));
        }
        if let Some(link) = &req.teacher_subject_id {
            if self.stores.assignments.find_by_id(link).await?.is_none() {
                return Err(AppError::BadRequest(format!("unknown assignment {}", link)));
            }
        }

        self.stores
            .courses
            .save(&Course {
                id: new_id(),
                name: req.name,
                teacher_subject_id: req.teacher_subject_id,
                created_at: now(),
            })
            .await
    }

    /// Link a teacher to a subject. A teacher keeps a single subject, so a
    /// different one is refused; repeating the same pair returns the
    /// existing link.
    pub async fn assign(&self, req: NewAssignmentRequest) -> Result<TeacherSubject, AppError> {
        if self.stores.teachers.find_by_id(&req.teacher_id).await?.is_none()
            || self.stores.subjects.find_by_id(&req.subject_id).await?.is_none()
        {
            return Err(AppError::NotFound);
        }

        let current = self.stores.assignments.find_by_teacher(&req.teacher_id).await?;
        if let Some(same) = current.iter().find(|a| a.subject_id == req.subject_id) {
            return Ok(same.clone());
        }
        if !current.is_empty() {
            return Err(AppError::Conflict(format!(
                "teacher {} already teaches another subject",
                req.teacher_id
            )));
        }

        let link = self
            .stores
            .assignments
            .save(&TeacherSubject {
                id: new_id(),
                teacher_id: req.teacher_id,
                subject_id: req.subject_id,
                created_at: now(),
            })
            .await?;
        info!("teacher {} now teaches subject {}", link.teacher_id, link.subject_id);
        Ok(link)
    }
}

/// Course names are non-empty and ASCII alphanumeric.
pub fn validate_course_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(format!(
            "course name must be alphanumeric: {:?}",
            name
        )));
    }
    Ok(())
}
