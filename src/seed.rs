//! Bootstrap fixtures for a fresh database.
//!
//! Loading is idempotent: rows are matched by name and only missing ones
//! are created. Nothing else in the crate relies on these names.

use tracing::info;

use crate::error::AppError;
use crate::models::{new_id, now, Course, Subject, Teacher, TeacherSubject};
use crate::services::AvailabilityService;
use crate::store::Stores;

/// (teacher, subject, courses)
const FIXTURES: &[(&str, &str, &[&str])] = &[
    ("Ana Torres", "Mathematics", &["Math1A", "Math1B"]),
    ("Luis Romero", "Physics", &["Phys2A"]),
    ("Maria Vega", "Literature", &["Lit1A", "Lit2A"]),
    ("Jorge Salas", "History", &["Hist3A"]),
];

#[derive(Debug, Default)]
pub struct SeedStats {
    pub teachers: usize,
    pub subjects: usize,
    pub courses: usize,
}

pub async fn load_fixtures(stores: &Stores) -> Result<SeedStats, AppError> {
    let mut stats = SeedStats::default();
    let availability = AvailabilityService::new(stores.teachers.clone(), stores.availabilities.clone());

    for (teacher_name, subject_name, course_names) in FIXTURES {
        let teacher = match stores
            .teachers
            .find_all()
            .await?
            .into_iter()
            .find(|t| t.name == *teacher_name)
        {
            Some(t) => t,
            None => {
                stats.teachers += 1;
                stores
                    .teachers
                    .save(&Teacher {
                        id: new_id(),
                        name: teacher_name.to_string(),
                        created_at: now(),
                    })
                    .await?
            }
        };

        let subject = match stores.subjects.find_by_name(subject_name).await? {
            Some(s) => s,
            None => {
                stats.subjects += 1;
                stores
                    .subjects
                    .save(&Subject {
                        id: new_id(),
                        name: subject_name.to_string(),
                        created_at: now(),
                    })
                    .await?
            }
        };

        let link = match stores
            .assignments
            .find_by_teacher_and_subject(&teacher.id, &subject.id)
            .await?
        {
            Some(l) => l,
            None => {
                stores
                    .assignments
                    .save(&TeacherSubject {
                        id: new_id(),
                        teacher_id: teacher.id.clone(),
                        subject_id: subject.id.clone(),
                        created_at: now(),
                    })
                    .await?
            }
        };

        for course_name in course_names.iter() {
            if stores.courses.find_by_name(course_name).await?.is_none() {
                stores
                    .courses
                    .save(&Course {
                        id: new_id(),
                        name: course_name.to_string(),
                        teacher_subject_id: Some(link.id.clone()),
                        created_at: now(),
                    })
                    .await?;
                stats.courses += 1;
            }
        }

        availability.ensure_default(&teacher.id).await?;
    }

    info!(
        "fixtures loaded: {} teachers, {} subjects, {} courses created",
        stats.teachers, stats.subjects, stats.courses
    );
    Ok(stats)
}
