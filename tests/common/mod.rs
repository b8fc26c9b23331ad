#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tokio::sync::Mutex;

use schedule_backend::db;
use schedule_backend::models::{
    new_id, now, Availability, Course, DayOfWeek, GenerationHistory, GenerationStatus, Schedule,
    Subject, Teacher, TeacherSubject,
};
use schedule_backend::services::ScheduleGenerationService;
use schedule_backend::store::{RunCommit, Stores};

pub async fn setup() -> Stores {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create test db");
    Stores::sqlite(pool)
}

pub fn generation(stores: &Stores) -> ScheduleGenerationService {
    ScheduleGenerationService::new(stores.clone(), Arc::new(Mutex::new(())))
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 2025-09-01, a Monday.
pub fn monday() -> NaiveDate {
    date(2025, 9, 1)
}

pub fn friday() -> NaiveDate {
    date(2025, 9, 5)
}

pub async fn teacher(stores: &Stores, name: &str) -> Teacher {
    stores
        .teachers
        .save(&Teacher {
            id: new_id(),
            name: name.to_string(),
            created_at: now(),
        })
        .await
        .expect("Failed to insert teacher")
}

pub async fn subject(stores: &Stores, name: &str) -> Subject {
    stores
        .subjects
        .save(&Subject {
            id: new_id(),
            name: name.to_string(),
            created_at: now(),
        })
        .await
        .expect("Failed to insert subject")
}

pub async fn link(stores: &Stores, teacher: &Teacher, subject: &Subject) -> TeacherSubject {
    stores
        .assignments
        .save(&TeacherSubject {
            id: new_id(),
            teacher_id: teacher.id.clone(),
            subject_id: subject.id.clone(),
            created_at: now(),
        })
        .await
        .expect("Failed to insert assignment")
}

pub async fn course(stores: &Stores, name: &str, link: Option<&TeacherSubject>) -> Course {
    stores
        .courses
        .save(&Course {
            id: new_id(),
            name: name.to_string(),
            teacher_subject_id: link.map(|l| l.id.clone()),
            created_at: now(),
        })
        .await
        .expect("Failed to insert course")
}

pub async fn availability(
    stores: &Stores,
    teacher: &Teacher,
    day: DayOfWeek,
    am: Option<(u32, u32)>,
    pm: Option<(u32, u32)>,
) -> Availability {
    stores
        .availabilities
        .save(&Availability {
            id: new_id(),
            teacher_id: teacher.id.clone(),
            day,
            am_start: am.map(|(s, _)| time(s, 0)),
            am_end: am.map(|(_, e)| time(e, 0)),
            pm_start: pm.map(|(s, _)| time(s, 0)),
            pm_end: pm.map(|(_, e)| time(e, 0)),
        })
        .await
        .expect("Failed to insert availability")
}

/// A slot left behind by an earlier successful run.
pub async fn persisted_slot(
    stores: &Stores,
    course: &Course,
    link: &TeacherSubject,
    day: DayOfWeek,
    start: u32,
    end: u32,
) -> Schedule {
    let schedule = Schedule {
        id: new_id(),
        course_id: course.id.clone(),
        teacher_id: link.teacher_id.clone(),
        subject_id: link.subject_id.clone(),
        day,
        start_time: time(start, 0),
        end_time: time(end, 0),
        name: None,
        created_at: now(),
    };
    let mut record = stores
        .history
        .save(&GenerationHistory {
            id: new_id(),
            requested_by: "fixture".to_string(),
            created_at: now(),
            status: GenerationStatus::Running,
            total_generated: 0,
            message: None,
            period_start: None,
            period_end: None,
            dry_run: false,
            force: false,
            params: None,
        })
        .await
        .expect("Failed to insert history");
    record.status = GenerationStatus::Success;
    record.total_generated = 1;

    stores
        .schedules
        .commit_run(RunCommit {
            replace_existing: false,
            schedules: std::slice::from_ref(&schedule),
            record: &record,
        })
        .await
        .expect("Failed to insert schedule");
    schedule
}

/// Teacher + subject + link in one go.
pub async fn staffed(stores: &Stores, teacher_name: &str, subject_name: &str) -> (Teacher, TeacherSubject) {
    let t = teacher(stores, teacher_name).await;
    let s = subject(stores, subject_name).await;
    let l = link(stores, &t, &s).await;
    (t, l)
}
