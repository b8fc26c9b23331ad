use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::models::{
    new_id, now, Course, DayOfWeek, GenerationHistory, GenerationStatus, Schedule,
};
use crate::services::diagnostic::{self, Diagnostic};
use crate::services::schedule_service::{candidate_slots, ScheduleService};
use crate::store::{RunCommit, Stores};

/// Longest period a single run may cover.
pub const MAX_PERIOD_DAYS: i64 = 366;

const SYSTEM_REQUESTER: &str = "system";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub requested_by: Option<String>,
    #[serde(default)]
    pub params: Option<String>,
}

impl GenerationRequest {
    pub fn for_period(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            period_start: Some(start),
            period_end: Some(end),
            ..Self::default()
        }
    }
}

/// Outcome of one generation run as reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub history_id: String,
    pub status: GenerationStatus,
    pub total_generated: usize,
    /// Courses still lacking a schedule; filled for dry runs.
    pub courses_pending: Option<usize>,
    pub message: String,
    pub dry_run: bool,
    pub force: bool,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub schedules: Vec<Schedule>,
}

/// Validated, inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn validate(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AppError> {
        let (Some(start), Some(end)) = (start, end) else {
            return Err(AppError::Validation(
                "period start and end dates are required".to_string(),
            ));
        };
        if end < start {
            return Err(AppError::Validation(format!(
                "period end {} is before start {}",
                end, start
            )));
        }
        if (end - start).num_days() > MAX_PERIOD_DAYS {
            return Err(AppError::Validation(format!(
                "period may not exceed {} days",
                MAX_PERIOD_DAYS
            )));
        }
        Ok(Self { start, end })
    }

    /// Monday to Friday of the week containing `today`.
    pub fn week_of(today: NaiveDate) -> Self {
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        Self {
            start: monday,
            end: monday + Duration::days(4),
        }
    }

    /// Distinct working days in the period, in order of first occurrence.
    pub fn weekdays(&self) -> Vec<DayOfWeek> {
        let mut days = Vec::new();
        for date in self.start.iter_days().take_while(|d| *d <= self.end) {
            let day = DayOfWeek::of(date);
            if !day.is_weekend() && !days.contains(&day) {
                days.push(day);
            }
            if days.len() == DayOfWeek::WORKING_DAYS.len() {
                break;
            }
        }
        days
    }
}

enum Scope {
    AllCourses,
    SingleCourse(Course),
}

struct RunOutcome {
    schedules: Vec<Schedule>,
    courses_pending: Option<usize>,
    message: String,
}

/// Drives generation runs and records each one in the history log.
pub struct ScheduleGenerationService {
    stores: Stores,
    run_lock: Arc<Mutex<()>>,
}

impl ScheduleGenerationService {
    pub fn new(stores: Stores, run_lock: Arc<Mutex<()>>) -> Self {
        Self { stores, run_lock }
    }

    /// Generate one class for every schedulable course in the period.
    pub async fn generate(&self, req: GenerationRequest) -> Result<GenerationSummary, AppError> {
        let period = Period::validate(req.period_start, req.period_end)?;
        self.run(req, period, Scope::AllCourses, false).await
    }

    /// Same as [`generate`](Self::generate), restricted to one course.
    pub async fn generate_for_course(
        &self,
        course_id: &str,
        req: GenerationRequest,
    ) -> Result<GenerationSummary, AppError> {
        let period = Period::validate(req.period_start, req.period_end)?;
        let course = self
            .stores
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or(AppError::NotFound)?;
        self.run(req, period, Scope::SingleCourse(course), false).await
    }

    /// Generate over the current calendar week.
    pub async fn auto_generate(&self) -> Result<GenerationSummary, AppError> {
        self.auto_generate_on(Local::now().date_naive()).await
    }

    pub async fn auto_generate_on(&self, today: NaiveDate) -> Result<GenerationSummary, AppError> {
        let period = Period::week_of(today);
        let req = system_request(period, "auto-generate");
        self.run(req, period, Scope::AllCourses, false).await
    }

    /// Delete every schedule, then generate over the current calendar week.
    pub async fn regenerate(&self) -> Result<GenerationSummary, AppError> {
        self.regenerate_on(Local::now().date_naive()).await
    }

    pub async fn regenerate_on(&self, today: NaiveDate) -> Result<GenerationSummary, AppError> {
        let period = Period::week_of(today);
        let req = system_request(period, "regenerate");
        self.run(req, period, Scope::AllCourses, true).await
    }

    pub async fn diagnostic(&self) -> Result<Diagnostic, AppError> {
        diagnostic::collect(&self.stores).await
    }

    pub async fn clear_all(&self) -> Result<u64, AppError> {
        let _guard = self.run_lock.lock().await;
        ScheduleService::new(self.stores.schedules.clone())
            .clear_all()
            .await
    }

    async fn run(
        &self,
        req: GenerationRequest,
        period: Period,
        scope: Scope,
        clear_first: bool,
    ) -> Result<GenerationSummary, AppError> {
        let _guard = self.run_lock.lock().await;

        // RUNNING は先に保存しておく (途中で落ちても追跡できるように)
        let mut record = self
            .stores
            .history
            .save(&GenerationHistory {
                id: new_id(),
                requested_by: req
                    .requested_by
                    .clone()
                    .unwrap_or_else(|| SYSTEM_REQUESTER.to_string()),
                created_at: now(),
                status: GenerationStatus::Running,
                total_generated: 0,
                message: None,
                period_start: Some(period.start),
                period_end: Some(period.end),
                dry_run: req.dry_run,
                force: req.force,
                params: req.params.clone(),
            })
            .await?;

        info!(
            "generation run {} started: {}..{} dry_run={} force={}",
            record.id, period.start, period.end, req.dry_run, req.force
        );

        let outcome = if req.dry_run {
            self.preview(&scope).await
        } else {
            self.execute(&period, &scope, clear_first).await
        };

        let committed = match outcome {
            Ok(outcome) => self
                .finish(&mut record, &req, clear_first, &outcome)
                .await
                .map(|()| outcome),
            Err(e) => Err(e),
        };

        match committed {
            Ok(outcome) => {
                info!("generation run {} succeeded: {}", record.id, outcome.message);
                Ok(summarize(&record, &req, period, outcome))
            }
            Err(e) => {
                error!("generation run {} failed: {}", record.id, e);
                record.status = GenerationStatus::Failed;
                record.total_generated = 0;
                record.message = Some(e.to_string());
                self.stores.history.save(&record).await?;
                Ok(summarize(
                    &record,
                    &req,
                    period,
                    RunOutcome {
                        schedules: Vec::new(),
                        courses_pending: None,
                        message: e.to_string(),
                    },
                ))
            }
        }
    }

    /// Marks the run SUCCESS and persists it. Slots and the terminal
    /// history row commit together or not at all.
    async fn finish(
        &self,
        record: &mut GenerationHistory,
        req: &GenerationRequest,
        clear_first: bool,
        outcome: &RunOutcome,
    ) -> Result<(), AppError> {
        record.status = GenerationStatus::Success;
        record.total_generated = outcome.schedules.len() as i64;
        record.message = Some(outcome.message.clone());

        if req.dry_run {
            self.stores.history.save(record).await?;
            return Ok(());
        }

        let cleared = self
            .stores
            .schedules
            .commit_run(RunCommit {
                replace_existing: clear_first,
                schedules: &outcome.schedules,
                record: &*record,
            })
            .await?;
        if clear_first {
            info!("generation run {} replaced {} schedule(s)", record.id, cleared);
        }
        Ok(())
    }

    async fn preview(&self, scope: &Scope) -> Result<RunOutcome, AppError> {
        let courses = self.courses_in_scope(scope).await?;
        let mut pending = 0usize;
        for course in &courses {
            if self.stores.schedules.find_by_course(&course.id).await?.is_empty() {
                pending += 1;
            }
        }

        Ok(RunOutcome {
            schedules: Vec::new(),
            courses_pending: Some(pending),
            message: format!("Dry run: {} course(s) without a schedule would be processed", pending),
        })
    }

    async fn execute(
        &self,
        period: &Period,
        scope: &Scope,
        clear_first: bool,
    ) -> Result<RunOutcome, AppError> {
        let schedule_service = ScheduleService::new(self.stores.schedules.clone());

        // regenerate deletes these only when the run commits
        let cleared = if clear_first {
            Some(self.stores.schedules.count().await?)
        } else {
            None
        };

        let weekdays = period.weekdays();
        let courses = self.courses_in_scope(scope).await?;
        let mut accepted: Vec<Schedule> = Vec::new();

        for course in &courses {
            if let Some(schedule) = self
                .place_course(&schedule_service, course, &weekdays, &accepted, clear_first)
                .await?
            {
                accepted.push(schedule);
            }
        }

        let mut message = format!(
            "Generated {} schedule(s) for {} course(s) over {} weekday(s)",
            accepted.len(),
            courses.len(),
            weekdays.len()
        );
        if let Some(cleared) = cleared {
            message = format!("Cleared {} schedule(s). {}", cleared, message);
        }

        Ok(RunOutcome {
            schedules: accepted,
            courses_pending: None,
            message,
        })
    }

    /// First conflict-free slot for the course, walking the weekdays in
    /// order. `None` leaves the course unscheduled. When `replacing`, the
    /// persisted schedule is about to be deleted and is ignored.
    async fn place_course(
        &self,
        schedule_service: &ScheduleService,
        course: &Course,
        weekdays: &[DayOfWeek],
        accepted: &[Schedule],
        replacing: bool,
    ) -> Result<Option<Schedule>, AppError> {
        let Some(link_id) = course.teacher_subject_id.as_deref() else {
            debug!("course {} has no teacher/subject, skipped", course.name);
            return Ok(None);
        };
        if !replacing && !self.stores.schedules.find_by_course(&course.id).await?.is_empty() {
            return Ok(None);
        }

        let Some(link) = self.stores.assignments.find_by_id(link_id).await? else {
            warn!("course {} points to missing assignment {}", course.name, link_id);
            return Ok(None);
        };

        self.ensure_single_subject(&link.teacher_id).await?;

        for &day in weekdays {
            let rows = self
                .stores
                .availabilities
                .find_by_teacher_and_day(&link.teacher_id, day)
                .await?;

            for row in rows.iter().filter(|r| r.has_valid_schedule()) {
                let free = schedule_service
                    .conflict_free_slots(&link.teacher_id, candidate_slots(row), accepted, replacing)
                    .await?;

                if let Some(slot) = free.into_iter().next() {
                    debug!(
                        "course {} placed on {} {}-{}",
                        course.name, slot.day, slot.start, slot.end
                    );
                    return Ok(Some(Schedule {
                        id: new_id(),
                        course_id: course.id.clone(),
                        teacher_id: link.teacher_id.clone(),
                        subject_id: link.subject_id.clone(),
                        day: slot.day,
                        start_time: slot.start,
                        end_time: slot.end,
                        name: Some(course.name.clone()),
                        created_at: now(),
                    }));
                }
            }
        }

        debug!("no free slot for course {}", course.name);
        Ok(None)
    }

    async fn ensure_single_subject(&self, teacher_id: &str) -> Result<(), AppError> {
        let links = self.stores.assignments.find_by_teacher(teacher_id).await?;
        if links.len() <= 1 {
            return Ok(());
        }

        let name = self
            .stores
            .teachers
            .find_by_id(teacher_id)
            .await?
            .map(|t| t.name)
            .unwrap_or_else(|| teacher_id.to_string());
        Err(AppError::Configuration(format!(
            "teacher {} ({}) is linked to {} subjects; a teacher may teach only one subject",
            name,
            teacher_id,
            links.len()
        )))
    }

    async fn courses_in_scope(&self, scope: &Scope) -> Result<Vec<Course>, AppError> {
        match scope {
            Scope::AllCourses => self.stores.courses.find_all().await,
            Scope::SingleCourse(course) => Ok(vec![course.clone()]),
        }
    }
}

fn system_request(period: Period, params: &str) -> GenerationRequest {
    GenerationRequest {
        period_start: Some(period.start),
        period_end: Some(period.end),
        dry_run: false,
        force: false,
        requested_by: Some(SYSTEM_REQUESTER.to_string()),
        params: Some(params.to_string()),
    }
}

fn summarize(
    record: &GenerationHistory,
    req: &GenerationRequest,
    period: Period,
    outcome: RunOutcome,
) -> GenerationSummary {
    GenerationSummary {
        history_id: record.id.clone(),
        status: record.status,
        total_generated: outcome.schedules.len(),
        courses_pending: outcome.courses_pending,
        message: outcome.message,
        dry_run: req.dry_run,
        force: req.force,
        period_start: period.start,
        period_end: period.end,
        schedules: outcome.schedules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_period_requires_both_dates() {
        assert!(matches!(
            Period::validate(None, Some(date(2025, 9, 1))),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            Period::validate(Some(date(2025, 9, 1)), None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_period_end_before_start_rejected() {
        assert!(matches!(
            Period::validate(Some(date(2025, 9, 5)), Some(date(2025, 9, 1))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_period_span_limit() {
        let start = date(2024, 1, 1);
        assert!(Period::validate(Some(start), Some(start + Duration::days(366))).is_ok());
        assert!(matches!(
            Period::validate(Some(start), Some(start + Duration::days(367))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_weekdays_first_occurrence_order() {
        // 2025-09-03 は水曜日
        let period = Period::validate(Some(date(2025, 9, 3)), Some(date(2025, 9, 12))).unwrap();
        assert_eq!(
            period.weekdays(),
            vec![
                DayOfWeek::Wednesday,
                DayOfWeek::Thursday,
                DayOfWeek::Friday,
                DayOfWeek::Monday,
                DayOfWeek::Tuesday,
            ]
        );
    }

    #[test]
    fn test_weekend_only_period_has_no_weekdays() {
        let period = Period::validate(Some(date(2025, 9, 6)), Some(date(2025, 9, 7))).unwrap();
        assert!(period.weekdays().is_empty());
    }

    #[test]
    fn test_week_of() {
        let week = Period::week_of(date(2025, 9, 4));
        assert_eq!(week.start, date(2025, 9, 1));
        assert_eq!(week.end, date(2025, 9, 5));

        let from_sunday = Period::week_of(date(2025, 9, 7));
        assert_eq!(from_sunday.start, date(2025, 9, 1));
    }
}
