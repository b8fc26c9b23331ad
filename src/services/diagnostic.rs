//! Read-only snapshot of the data the generator depends on.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::AppError;
use crate::store::Stores;

#[derive(Debug, Serialize)]
pub struct CourseStatus {
    pub course_id: String,
    pub name: String,
    pub has_schedule: bool,
    pub has_teacher_subject: bool,
    pub teacher_id: Option<String>,
    pub subject_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeacherStats {
    pub teacher_id: String,
    pub name: String,
    pub subject_count: usize,
    pub availability_count: usize,
    pub has_multiple_subjects: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct DiagnosticTotals {
    pub courses: usize,
    pub courses_with_schedule: usize,
    pub courses_without_schedule: usize,
    pub courses_with_teacher_subject: usize,
    pub teachers: usize,
    pub teachers_with_multiple_subjects: usize,
    pub teachers_without_availability: usize,
    pub subjects: usize,
    pub schedules: usize,
}

#[derive(Debug, Serialize)]
pub struct Diagnostic {
    pub courses: Vec<CourseStatus>,
    pub teachers: Vec<TeacherStats>,
    pub totals: DiagnosticTotals,
}

pub async fn collect(stores: &Stores) -> Result<Diagnostic, AppError> {
    let courses = stores.courses.find_all().await?;
    let teachers = stores.teachers.find_all().await?;
    let subjects = stores.subjects.find_all().await?;
    let assignments = stores.assignments.find_all().await?;
    let schedules = stores.schedules.find_all().await?;

    let scheduled: HashSet<&str> = schedules.iter().map(|s| s.course_id.as_str()).collect();
    let links: HashMap<&str, (&str, &str)> = assignments
        .iter()
        .map(|a| (a.id.as_str(), (a.teacher_id.as_str(), a.subject_id.as_str())))
        .collect();

    let course_status: Vec<CourseStatus> = courses
        .iter()
        .map(|c| {
            let link = c.teacher_subject_id.as_deref().and_then(|id| links.get(id));
            CourseStatus {
                course_id: c.id.clone(),
                name: c.name.clone(),
                has_schedule: scheduled.contains(c.id.as_str()),
                has_teacher_subject: link.is_some(),
                teacher_id: link.map(|(t, _)| t.to_string()),
                subject_id: link.map(|(_, s)| s.to_string()),
            }
        })
        .collect();

    let mut teacher_stats = Vec::with_capacity(teachers.len());
    for teacher in &teachers {
        let subject_count = assignments
            .iter()
            .filter(|a| a.teacher_id == teacher.id)
            .count();
        let availability_count = stores.availabilities.find_by_teacher(&teacher.id).await?.len();
        teacher_stats.push(TeacherStats {
            teacher_id: teacher.id.clone(),
            name: teacher.name.clone(),
            subject_count,
            availability_count,
            has_multiple_subjects: subject_count > 1,
        });
    }

    let courses_with_schedule = course_status.iter().filter(|c| c.has_schedule).count();
    let totals = DiagnosticTotals {
        courses: course_status.len(),
        courses_with_schedule,
        courses_without_schedule: course_status.len() - courses_with_schedule,
        courses_with_teacher_subject: course_status.iter().filter(|c| c.has_teacher_subject).count(),
        teachers: teacher_stats.len(),
        teachers_with_multiple_subjects: teacher_stats.iter().filter(|t| t.has_multiple_subjects).count(),
        teachers_without_availability: teacher_stats.iter().filter(|t| t.availability_count == 0).count(),
        subjects: subjects.len(),
        schedules: schedules.len(),
    };

    Ok(Diagnostic {
        courses: course_status,
        teachers: teacher_stats,
        totals,
    })
}
