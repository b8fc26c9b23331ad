use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{new_id, now, Course, Subject, Teacher, TeacherSubject};
use crate::store::Stores;

/// A teacher driving this many courses takes no new one.
pub const MAX_COURSES_PER_TEACHER: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct CourseAssignment {
    pub course_id: String,
    pub course_name: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub teacher_subject_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedCourse {
    pub course_id: String,
    pub course_name: String,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct AutoAssignmentReport {
    pub assigned: Vec<CourseAssignment>,
    pub skipped: Vec<SkippedCourse>,
    pub summary: String,
}

/// Fills in missing teacher/subject links on courses.
pub struct AutoAssignmentService {
    stores: Stores,
}

impl AutoAssignmentService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// 未割り当てのコースに教師と科目を割り当てる (1 パス)
    ///
    /// Teachers are picked round-robin from the list of teachers under the
    /// load cap when the pass starts. A course that cannot be resolved is
    /// reported and skipped; it never aborts the pass.
    pub async fn assign_unassigned_courses(&self) -> Result<AutoAssignmentReport, AppError> {
        let courses = self.stores.courses.find_all().await?;
        let teachers = self.stores.teachers.find_all().await?;
        let subjects = self.stores.subjects.find_all().await?;
        let assignments = self.stores.assignments.find_all().await?;

        let mut load = course_load(&courses, &assignments);
        let eligible: Vec<Teacher> = teachers
            .into_iter()
            .filter(|t| load.get(&t.id).copied().unwrap_or(0) < MAX_COURSES_PER_TEACHER)
            .collect();

        info!(
            "auto-assignment: {} unassigned courses, {} eligible teachers, {} subjects",
            courses.iter().filter(|c| !c.is_assigned()).count(),
            eligible.len(),
            subjects.len()
        );

        let mut assigned = Vec::new();
        let mut skipped = Vec::new();
        let mut cursor = 0usize;

        for course in courses.into_iter().filter(|c| !c.is_assigned()) {
            let Some(teacher) = next_teacher(&eligible, &mut cursor, &load) else {
                skipped.push(skip(&course, "no teacher under the course limit"));
                continue;
            };

            match self.assign(course.clone(), teacher, &subjects).await {
                Ok(Some(result)) => {
                    *load.entry(teacher.id.clone()).or_insert(0) += 1;
                    assigned.push(result);
                }
                Ok(None) => skipped.push(skip(&course, "no subject available")),
                Err(e) => {
                    warn!("failed to assign course {}: {}", course.name, e);
                    skipped.push(skip(&course, &e.to_string()));
                }
            }
        }

        let summary = summarize(&assigned, &skipped);
        info!("{}", summary);

        Ok(AutoAssignmentReport {
            assigned,
            skipped,
            summary,
        })
    }

    async fn assign(
        &self,
        mut course: Course,
        teacher: &Teacher,
        subjects: &[Subject],
    ) -> Result<Option<CourseAssignment>, AppError> {
        let Some(subject_id) = self.choose_subject(teacher, subjects).await? else {
            return Ok(None);
        };

        let link = match self
            .stores
            .assignments
            .find_by_teacher_and_subject(&teacher.id, &subject_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                self.stores
                    .assignments
                    .save(&TeacherSubject {
                        id: new_id(),
                        teacher_id: teacher.id.clone(),
                        subject_id: subject_id.clone(),
                        created_at: now(),
                    })
                    .await?
            }
        };

        course.teacher_subject_id = Some(link.id.clone());
        let course = self.stores.courses.save(&course).await?;

        info!("assigned course {} to teacher {}", course.name, teacher.name);
        Ok(Some(CourseAssignment {
            course_id: course.id,
            course_name: course.name,
            teacher_id: teacher.id.clone(),
            subject_id,
            teacher_subject_id: link.id,
        }))
    }

    /// The teacher's current subject, else the first unclaimed subject,
    /// else the first subject in the catalog.
    async fn choose_subject(
        &self,
        teacher: &Teacher,
        subjects: &[Subject],
    ) -> Result<Option<String>, AppError> {
        if let Some(existing) = self
            .stores
            .assignments
            .find_by_teacher(&teacher.id)
            .await?
            .into_iter()
            .next()
        {
            return Ok(Some(existing.subject_id));
        }

        for subject in subjects {
            if self
                .stores
                .assignments
                .find_by_subject(&subject.id)
                .await?
                .is_empty()
            {
                return Ok(Some(subject.id.clone()));
            }
        }

        Ok(subjects.first().map(|s| s.id.clone()))
    }
}

/// Courses per teacher, counted through each course's assignment.
fn course_load(courses: &[Course], assignments: &[TeacherSubject]) -> HashMap<String, usize> {
    let teacher_of: HashMap<&str, &str> = assignments
        .iter()
        .map(|a| (a.id.as_str(), a.teacher_id.as_str()))
        .collect();

    let mut load = HashMap::new();
    for link in courses.iter().filter_map(|c| c.teacher_subject_id.as_deref()) {
        if let Some(teacher_id) = teacher_of.get(link) {
            *load.entry(teacher_id.to_string()).or_insert(0) += 1;
        }
    }
    load
}

/// Advance the round-robin cursor to the next teacher still under the cap.
fn next_teacher<'a>(
    eligible: &'a [Teacher],
    cursor: &mut usize,
    load: &HashMap<String, usize>,
) -> Option<&'a Teacher> {
    for _ in 0..eligible.len() {
        let teacher = &eligible[*cursor % eligible.len()];
        *cursor = (*cursor + 1) % eligible.len();
        if load.get(&teacher.id).copied().unwrap_or(0) < MAX_COURSES_PER_TEACHER {
            return Some(teacher);
        }
    }
    None
}

fn skip(course: &Course, reason: &str) -> SkippedCourse {
    SkippedCourse {
        course_id: course.id.clone(),
        course_name: course.name.clone(),
        reason: reason.to_string(),
    }
}

fn summarize(assigned: &[CourseAssignment], skipped: &[SkippedCourse]) -> String {
    let mut summary = format!(
        "Assigned {} course(s), skipped {}",
        assigned.len(),
        skipped.len()
    );
    if !skipped.is_empty() {
        let details: Vec<String> = skipped
            .iter()
            .map(|s| format!("{} ({})", s.course_name, s.reason))
            .collect();
        summary.push_str(": ");
        summary.push_str(&details.join("; "));
    }
    summary
}
