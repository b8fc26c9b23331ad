use async_trait::async_trait;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::AppError;
use crate::models::{
    Availability, Course, DayOfWeek, GenerationHistory, Schedule, Subject, Teacher, TeacherSubject,
};
use crate::store::{
    AssignmentStore, AvailabilityStore, CourseStore, HistoryStore, RunCommit, ScheduleStore,
    SubjectStore, TeacherStore,
};

/// SQLite-backed implementation of every store contract.
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

async fn insert_schedule(
    tx: &mut Transaction<'_, Sqlite>,
    schedule: &Schedule,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO schedules
            (id, course_id, teacher_id, subject_id, day, start_time, end_time, name, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&schedule.id)
    .bind(&schedule.course_id)
    .bind(&schedule.teacher_id)
    .bind(&schedule.subject_id)
    .bind(schedule.day)
    .bind(schedule.start_time)
    .bind(schedule.end_time)
    .bind(&schedule.name)
    .bind(&schedule.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl TeacherStore for SqliteStore {
    async fn find_all(&self) -> Result<Vec<Teacher>, AppError> {
        let teachers = sqlx::query_as::<_, Teacher>(
            "SELECT id, name, created_at FROM teachers ORDER BY rowid",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(teachers)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Teacher>, AppError> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT id, name, created_at FROM teachers WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(teacher)
    }

    async fn save(&self, teacher: &Teacher) -> Result<Teacher, AppError> {
        sqlx::query(
            r#"
            INSERT INTO teachers (id, name, created_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&teacher.id)
        .bind(&teacher.name)
        .bind(&teacher.created_at)
        .execute(&self.db)
        .await?;

        TeacherStore::find_by_id(self, &teacher.id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl SubjectStore for SqliteStore {
    async fn find_all(&self) -> Result<Vec<Subject>, AppError> {
        let subjects = sqlx::query_as::<_, Subject>(
            "SELECT id, name, created_at FROM subjects ORDER BY rowid",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(subjects)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, name, created_at FROM subjects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(subject)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Subject>, AppError> {
        let subject = sqlx::query_as::<_, Subject>(
            "SELECT id, name, created_at FROM subjects WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(subject)
    }

    async fn save(&self, subject: &Subject) -> Result<Subject, AppError> {
        sqlx::query(
            r#"
            INSERT INTO subjects (id, name, created_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(&subject.created_at)
        .execute(&self.db)
        .await?;

        SubjectStore::find_by_id(self, &subject.id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl CourseStore for SqliteStore {
    async fn find_all(&self) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, name, teacher_subject_id, created_at FROM courses ORDER BY rowid",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(courses)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, name, teacher_subject_id, created_at FROM courses WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(course)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Course>, AppError> {
        let course = sqlx::query_as::<_, Course>(
            "SELECT id, name, teacher_subject_id, created_at FROM courses WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(course)
    }

    async fn save(&self, course: &Course) -> Result<Course, AppError> {
        match CourseStore::find_by_id(self, &course.id).await? {
            Some(_) => {
                sqlx::query("UPDATE courses SET name = ?, teacher_subject_id = ? WHERE id = ?")
                    .bind(&course.name)
                    .bind(&course.teacher_subject_id)
                    .bind(&course.id)
                    .execute(&self.db)
                    .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO courses (id, name, teacher_subject_id, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&course.id)
                .bind(&course.name)
                .bind(&course.teacher_subject_id)
                .bind(&course.created_at)
                .execute(&self.db)
                .await?;
            }
        }

        CourseStore::find_by_id(self, &course.id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl AvailabilityStore for SqliteStore {
    async fn find_by_teacher(&self, teacher_id: &str) -> Result<Vec<Availability>, AppError> {
        let rows = sqlx::query_as::<_, Availability>(
            r#"
            SELECT id, teacher_id, day, am_start, am_end, pm_start, pm_end
            FROM availabilities
            WHERE teacher_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_teacher_and_day(
        &self,
        teacher_id: &str,
        day: DayOfWeek,
    ) -> Result<Vec<Availability>, AppError> {
        let rows = sqlx::query_as::<_, Availability>(
            r#"
            SELECT id, teacher_id, day, am_start, am_end, pm_start, pm_end
            FROM availabilities
            WHERE teacher_id = ? AND day = ?
            ORDER BY rowid
            "#,
        )
        .bind(teacher_id)
        .bind(day)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn save(&self, availability: &Availability) -> Result<Availability, AppError> {
        sqlx::query(
            r#"
            INSERT INTO availabilities (id, teacher_id, day, am_start, am_end, pm_start, pm_end)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(teacher_id, day) DO UPDATE SET
                am_start = excluded.am_start,
                am_end = excluded.am_end,
                pm_start = excluded.pm_start,
                pm_end = excluded.pm_end
            "#,
        )
        .bind(&availability.id)
        .bind(&availability.teacher_id)
        .bind(availability.day)
        .bind(availability.am_start)
        .bind(availability.am_end)
        .bind(availability.pm_start)
        .bind(availability.pm_end)
        .execute(&self.db)
        .await?;

        // the row may have kept its original id on conflict
        self.find_by_teacher_and_day(&availability.teacher_id, availability.day)
            .await?
            .into_iter()
            .next()
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl AssignmentStore for SqliteStore {
    async fn find_all(&self) -> Result<Vec<TeacherSubject>, AppError> {
        let rows = sqlx::query_as::<_, TeacherSubject>(
            "SELECT id, teacher_id, subject_id, created_at FROM teacher_subjects ORDER BY rowid",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TeacherSubject>, AppError> {
        let row = sqlx::query_as::<_, TeacherSubject>(
            "SELECT id, teacher_id, subject_id, created_at FROM teacher_subjects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_by_teacher(&self, teacher_id: &str) -> Result<Vec<TeacherSubject>, AppError> {
        let rows = sqlx::query_as::<_, TeacherSubject>(
            r#"
            SELECT id, teacher_id, subject_id, created_at
            FROM teacher_subjects
            WHERE teacher_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_subject(&self, subject_id: &str) -> Result<Vec<TeacherSubject>, AppError> {
        let rows = sqlx::query_as::<_, TeacherSubject>(
            r#"
            SELECT id, teacher_id, subject_id, created_at
            FROM teacher_subjects
            WHERE subject_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_teacher_and_subject(
        &self,
        teacher_id: &str,
        subject_id: &str,
    ) -> Result<Option<TeacherSubject>, AppError> {
        let row = sqlx::query_as::<_, TeacherSubject>(
            r#"
            SELECT id, teacher_id, subject_id, created_at
            FROM teacher_subjects
            WHERE teacher_id = ? AND subject_id = ?
            "#,
        )
        .bind(teacher_id)
        .bind(subject_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn save(&self, assignment: &TeacherSubject) -> Result<TeacherSubject, AppError> {
        sqlx::query(
            r#"
            INSERT INTO teacher_subjects (id, teacher_id, subject_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(teacher_id, subject_id) DO NOTHING
            "#,
        )
        .bind(&assignment.id)
        .bind(&assignment.teacher_id)
        .bind(&assignment.subject_id)
        .bind(&assignment.created_at)
        .execute(&self.db)
        .await?;

        self.find_by_teacher_and_subject(&assignment.teacher_id, &assignment.subject_id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }
}

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn find_all(&self) -> Result<Vec<Schedule>, AppError> {
        let rows = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, course_id, teacher_id, subject_id, day, start_time, end_time, name, created_at
            FROM schedules
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_course(&self, course_id: &str) -> Result<Vec<Schedule>, AppError> {
        let rows = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, course_id, teacher_id, subject_id, day, start_time, end_time, name, created_at
            FROM schedules
            WHERE course_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find_by_teacher(&self, teacher_id: &str) -> Result<Vec<Schedule>, AppError> {
        let rows = sqlx::query_as::<_, Schedule>(
            r#"
            SELECT id, course_id, teacher_id, subject_id, day, start_time, end_time, name, created_at
            FROM schedules
            WHERE teacher_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedules")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn commit_run(&self, run: RunCommit<'_>) -> Result<u64, AppError> {
        if !run.record.status.is_terminal() {
            return Err(AppError::InternalServerError);
        }

        // any early return drops `tx` and rolls everything back
        let mut tx = self.db.begin().await?;

        let cleared = if run.replace_existing {
            sqlx::query("DELETE FROM schedules")
                .execute(&mut *tx)
                .await?
                .rows_affected()
        } else {
            0
        };

        for schedule in run.schedules {
            insert_schedule(&mut tx, schedule).await?;
        }

        let finalized = sqlx::query(
            r#"
            UPDATE generation_history
            SET status = ?, total_generated = ?, message = ?
            WHERE id = ?
            "#,
        )
        .bind(run.record.status)
        .bind(run.record.total_generated)
        .bind(&run.record.message)
        .bind(&run.record.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if finalized != 1 {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }

        tx.commit().await?;
        debug!(
            "run {} committed: {} inserted, {} cleared",
            run.record.id,
            run.schedules.len(),
            cleared
        );
        Ok(cleared)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result > 0)
    }

    async fn delete_by_day(&self, day: DayOfWeek) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM schedules WHERE day = ?")
            .bind(day)
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM schedules")
            .execute(&self.db)
            .await?
            .rows_affected();
        Ok(result)
    }
}

#[async_trait]
impl HistoryStore for SqliteStore {
    async fn save(&self, record: &GenerationHistory) -> Result<GenerationHistory, AppError> {
        sqlx::query(
            r#"
            INSERT INTO generation_history
                (id, requested_by, created_at, status, total_generated, message,
                 period_start, period_end, dry_run, force, params)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                total_generated = excluded.total_generated,
                message = excluded.message
            "#,
        )
        .bind(&record.id)
        .bind(&record.requested_by)
        .bind(&record.created_at)
        .bind(record.status)
        .bind(record.total_generated)
        .bind(&record.message)
        .bind(record.period_start)
        .bind(record.period_end)
        .bind(record.dry_run)
        .bind(record.force)
        .bind(&record.params)
        .execute(&self.db)
        .await?;

        HistoryStore::find_by_id(self, &record.id)
            .await?
            .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<GenerationHistory>, AppError> {
        let row = sqlx::query_as::<_, GenerationHistory>(
            r#"
            SELECT id, requested_by, created_at, status, total_generated, message,
                   period_start, period_end, dry_run, force, params
            FROM generation_history
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn find_recent(&self, limit: i64) -> Result<Vec<GenerationHistory>, AppError> {
        let rows = sqlx::query_as::<_, GenerationHistory>(
            r#"
            SELECT id, requested_by, created_at, status, total_generated, message,
                   period_start, period_end, dry_run, force, params
            FROM generation_history
            ORDER BY rowid DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::db::connect_in_memory;
    use crate::models::{new_id, now, GenerationStatus};

    async fn setup_test_db() -> SqliteStore {
        let pool = connect_in_memory()
            .await
            .expect("Failed to create test db");
        SqliteStore::new(pool)
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    async fn insert_teacher(store: &SqliteStore, name: &str) -> Teacher {
        TeacherStore::save(
            store,
            &Teacher {
                id: new_id(),
                name: name.to_string(),
                created_at: now(),
            },
        )
        .await
        .expect("Failed to insert teacher")
    }

    /// Saves a RUNNING row and hands back its SUCCESS form.
    async fn started_run(store: &SqliteStore) -> GenerationHistory {
        let mut record = HistoryStore::save(
            store,
            &GenerationHistory {
                id: new_id(),
                requested_by: "test".to_string(),
                created_at: now(),
                status: GenerationStatus::Running,
                total_generated: 0,
                message: None,
                period_start: None,
                period_end: None,
                dry_run: false,
                force: false,
                params: None,
            },
        )
        .await
        .expect("Failed to insert history");
        record.status = GenerationStatus::Success;
        record
    }

    /// Teacher, subject and course ready to own schedules.
    async fn schedule_fixture(store: &SqliteStore) -> impl Fn(DayOfWeek, u32) -> Schedule {
        let teacher = insert_teacher(store, "Sato").await;
        let subject = SubjectStore::save(
            store,
            &Subject {
                id: new_id(),
                name: "Math".to_string(),
                created_at: now(),
            },
        )
        .await
        .unwrap();
        let course = CourseStore::save(
            store,
            &Course {
                id: new_id(),
                name: "Math1A".to_string(),
                teacher_subject_id: None,
                created_at: now(),
            },
        )
        .await
        .unwrap();

        move |day: DayOfWeek, h: u32| Schedule {
            id: new_id(),
            course_id: course.id.clone(),
            teacher_id: teacher.id.clone(),
            subject_id: subject.id.clone(),
            day,
            start_time: time(h, 0),
            end_time: time(h + 1, 0),
            name: None,
            created_at: now(),
        }
    }

    #[tokio::test]
    async fn test_course_upsert_keeps_stored_order() {
        let store = setup_test_db().await;

        for name in ["Math1A", "Bio2B", "Art3C"] {
            CourseStore::save(
                &store,
                &Course {
                    id: new_id(),
                    name: name.to_string(),
                    teacher_subject_id: None,
                    created_at: now(),
                },
            )
            .await
            .expect("Failed to insert course");
        }

        let mut first = CourseStore::find_all(&store).await.unwrap()[0].clone();
        first.name = "Math1Z".to_string();
        CourseStore::save(&store, &first).await.expect("Failed to update course");

        let names: Vec<String> = CourseStore::find_all(&store)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Math1Z", "Bio2B", "Art3C"]);
    }

    #[tokio::test]
    async fn test_availability_upsert_per_day() {
        let store = setup_test_db().await;
        let teacher = insert_teacher(&store, "Tanaka").await;

        let mut row = Availability {
            id: new_id(),
            teacher_id: teacher.id.clone(),
            day: DayOfWeek::Monday,
            am_start: Some(time(8, 0)),
            am_end: Some(time(12, 0)),
            pm_start: None,
            pm_end: None,
        };
        let saved = AvailabilityStore::save(&store, &row).await.unwrap();
        assert_eq!(saved.am_window(), Some((time(8, 0), time(12, 0))));

        // 同じ曜日は上書きされる
        row.id = new_id();
        row.pm_start = Some(time(13, 0));
        row.pm_end = Some(time(15, 0));
        AvailabilityStore::save(&store, &row).await.unwrap();

        let rows = store
            .find_by_teacher_and_day(&teacher.id, DayOfWeek::Monday)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, saved.id);
        assert_eq!(rows[0].pm_window(), Some((time(13, 0), time(15, 0))));
        assert!(
            store
                .find_by_teacher_and_day(&teacher.id, DayOfWeek::Tuesday)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_run_commit_and_deletes() {
        let store = setup_test_db().await;
        let slot = schedule_fixture(&store).await;
        let mut record = started_run(&store).await;
        record.total_generated = 3;

        let batch = [
            slot(DayOfWeek::Monday, 8),
            slot(DayOfWeek::Monday, 9),
            slot(DayOfWeek::Tuesday, 8),
        ];
        let cleared = store
            .commit_run(RunCommit {
                replace_existing: false,
                schedules: &batch,
                record: &record,
            })
            .await
            .expect("Failed to commit run");
        assert_eq!(cleared, 0);
        assert_eq!(store.count().await.unwrap(), 3);

        let finalized = HistoryStore::find_by_id(&store, &record.id).await.unwrap().unwrap();
        assert_eq!(finalized.status, GenerationStatus::Success);
        assert_eq!(finalized.total_generated, 3);

        let by_teacher = ScheduleStore::find_by_teacher(&store, &batch[0].teacher_id)
            .await
            .unwrap();
        assert_eq!(by_teacher.len(), 3);
        assert_eq!(by_teacher[1].start_time, time(9, 0));

        assert_eq!(store.delete_by_day(DayOfWeek::Monday).await.unwrap(), 2);
        assert_eq!(store.count().await.unwrap(), 1);

        assert_eq!(store.delete_all().await.unwrap(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replacing_run_swaps_slots() {
        let store = setup_test_db().await;
        let slot = schedule_fixture(&store).await;
        let first = started_run(&store).await;
        store
            .commit_run(RunCommit {
                replace_existing: false,
                schedules: &[slot(DayOfWeek::Monday, 8), slot(DayOfWeek::Monday, 9)],
                record: &first,
            })
            .await
            .unwrap();

        let second = started_run(&store).await;
        let fresh = [slot(DayOfWeek::Friday, 10)];
        let cleared = store
            .commit_run(RunCommit {
                replace_existing: true,
                schedules: &fresh,
                record: &second,
            })
            .await
            .unwrap();

        assert_eq!(cleared, 2);
        let all = ScheduleStore::find_all(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, fresh[0].id);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_previous_slots() {
        let store = setup_test_db().await;
        let slot = schedule_fixture(&store).await;
        let first = started_run(&store).await;
        store
            .commit_run(RunCommit {
                replace_existing: false,
                schedules: &[slot(DayOfWeek::Monday, 8)],
                record: &first,
            })
            .await
            .unwrap();

        // unknown course/teacher ids violate the foreign keys
        let orphan = Schedule {
            id: new_id(),
            course_id: "missing".to_string(),
            teacher_id: "missing".to_string(),
            subject_id: "missing".to_string(),
            day: DayOfWeek::Monday,
            start_time: time(8, 0),
            end_time: time(9, 0),
            name: None,
            created_at: now(),
        };
        let second = started_run(&store).await;
        let result = store
            .commit_run(RunCommit {
                replace_existing: true,
                schedules: &[slot(DayOfWeek::Tuesday, 8), orphan],
                record: &second,
            })
            .await;
        assert!(result.is_err());

        let all = ScheduleStore::find_all(&store).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].day, DayOfWeek::Monday);
        let untouched = HistoryStore::find_by_id(&store, &second.id).await.unwrap().unwrap();
        assert_eq!(untouched.status, GenerationStatus::Running);
    }

    #[tokio::test]
    async fn test_commit_without_running_row_persists_nothing() {
        let store = setup_test_db().await;
        let slot = schedule_fixture(&store).await;
        let mut record = started_run(&store).await;
        record.id = new_id();

        let result = store
            .commit_run(RunCommit {
                replace_existing: false,
                schedules: &[slot(DayOfWeek::Monday, 8)],
                record: &record,
            })
            .await;
        assert!(matches!(result, Err(AppError::Database(sqlx::Error::RowNotFound))));
        assert_eq!(store.count().await.unwrap(), 0);

        record.status = GenerationStatus::Running;
        assert!(matches!(
            store
                .commit_run(RunCommit {
                    replace_existing: false,
                    schedules: &[],
                    record: &record,
                })
                .await,
            Err(AppError::InternalServerError)
        ));
    }
}
