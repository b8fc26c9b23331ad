use std::sync::Arc;

use chrono::{Duration, NaiveTime};
use tracing::info;

use crate::error::AppError;
use crate::models::{new_id, Availability, AvailabilityRequest, DayOfWeek};
use crate::store::{AvailabilityStore, TeacherStore};

/// Default morning window, in hours, handed to teachers that never
/// declared availability.
pub const DEFAULT_AM_START_HOUR: i64 = 6;
pub const DEFAULT_AM_END_HOUR: i64 = 12;

pub struct AvailabilityService {
    teachers: Arc<dyn TeacherStore>,
    availabilities: Arc<dyn AvailabilityStore>,
}

impl AvailabilityService {
    pub fn new(teachers: Arc<dyn TeacherStore>, availabilities: Arc<dyn AvailabilityStore>) -> Self {
        Self {
            teachers,
            availabilities,
        }
    }

    pub async fn list(&self, teacher_id: &str) -> Result<Vec<Availability>, AppError> {
        self.require_teacher(teacher_id).await?;
        self.availabilities.find_by_teacher(teacher_id).await
    }

    /// Create or replace the teacher's row for `req.day`.
    pub async fn upsert(
        &self,
        teacher_id: &str,
        req: AvailabilityRequest,
    ) -> Result<Availability, AppError> {
        self.require_teacher(teacher_id).await?;

        let row = Availability {
            id: new_id(),
            teacher_id: teacher_id.to_string(),
            day: req.day,
            am_start: req.am_start,
            am_end: req.am_end,
            pm_start: req.pm_start,
            pm_end: req.pm_end,
        };
        validate(&row)?;

        self.availabilities.save(&row).await
    }

    /// Give a teacher without any availability the default weekday mornings.
    /// Teachers that already have rows are left untouched.
    pub async fn ensure_default(&self, teacher_id: &str) -> Result<Vec<Availability>, AppError> {
        self.require_teacher(teacher_id).await?;

        let existing = self.availabilities.find_by_teacher(teacher_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let (start, end) = default_window();
        let mut created = Vec::with_capacity(DayOfWeek::WORKING_DAYS.len());
        for day in DayOfWeek::WORKING_DAYS {
            let row = Availability {
                id: new_id(),
                teacher_id: teacher_id.to_string(),
                day,
                am_start: Some(start),
                am_end: Some(end),
                pm_start: None,
                pm_end: None,
            };
            created.push(self.availabilities.save(&row).await?);
        }

        info!("created default availability for teacher {}", teacher_id);
        Ok(created)
    }

    async fn require_teacher(&self, teacher_id: &str) -> Result<(), AppError> {
        self.teachers
            .find_by_id(teacher_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::NotFound)
    }
}

fn default_window() -> (NaiveTime, NaiveTime) {
    let at = |hour: i64| NaiveTime::MIN + Duration::hours(hour);
    (at(DEFAULT_AM_START_HOUR), at(DEFAULT_AM_END_HOUR))
}

/// A row needs at least one complete window, and every given window must be
/// well formed.
pub fn validate(row: &Availability) -> Result<(), AppError> {
    let halves = [
        ("AM", row.am_start, row.am_end),
        ("PM", row.pm_start, row.pm_end),
    ];
    for (label, start, end) in halves {
        match (start, end) {
            (Some(start), Some(end)) if start >= end => {
                return Err(AppError::Validation(format!(
                    "{} window on {} must start before it ends",
                    label, row.day
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(AppError::Validation(format!(
                    "{} window on {} needs both start and end",
                    label, row.day
                )));
            }
            _ => {}
        }
    }

    if !row.has_valid_schedule() {
        return Err(AppError::Validation(format!(
            "availability on {} needs an AM or PM window",
            row.day
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(am: Option<(u32, u32)>, pm: Option<(u32, u32)>) -> Availability {
        let t = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        Availability {
            id: "a".to_string(),
            teacher_id: "t".to_string(),
            day: DayOfWeek::Wednesday,
            am_start: am.map(|(s, _)| t(s)),
            am_end: am.map(|(_, e)| t(e)),
            pm_start: pm.map(|(s, _)| t(s)),
            pm_end: pm.map(|(_, e)| t(e)),
        }
    }

    #[test]
    fn test_validate_windows() {
        assert!(validate(&row(Some((8, 12)), None)).is_ok());
        assert!(validate(&row(None, Some((13, 17)))).is_ok());
        assert!(validate(&row(None, None)).is_err());
        assert!(validate(&row(Some((12, 8)), None)).is_err());
    }

    #[test]
    fn test_half_window_rejected() {
        let mut r = row(Some((8, 12)), None);
        r.pm_start = NaiveTime::from_hms_opt(13, 0, 0);
        assert!(matches!(validate(&r), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_default_window() {
        let (start, end) = default_window();
        assert_eq!(start, NaiveTime::from_hms_opt(6, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }
}
