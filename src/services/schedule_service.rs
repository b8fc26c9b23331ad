use std::sync::Arc;

use chrono::{Duration, NaiveTime};
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{Availability, DayOfWeek, Schedule, TimeSlot};
use crate::store::ScheduleStore;

/// Length of every generated class meeting.
pub const SLOT_DURATION_MINUTES: i64 = 60;

/// Split `[start, end)` into consecutive full-length slots.
///
/// No partial slot is emitted, so a window shorter than one slot yields
/// nothing.
pub fn generate_time_slots(day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> Vec<TimeSlot> {
    let step = Duration::minutes(SLOT_DURATION_MINUTES);
    let mut slots = Vec::new();
    let mut cursor = start;

    loop {
        let (next, wrapped) = cursor.overflowing_add_signed(step);
        if wrapped != 0 || next > end {
            break;
        }
        slots.push(TimeSlot::new(day, cursor, next));
        cursor = next;
    }

    slots
}

/// Candidates from one availability row, AM before PM.
pub fn candidate_slots(availability: &Availability) -> Vec<TimeSlot> {
    availability
        .windows()
        .flat_map(|(start, end)| generate_time_slots(availability.day, start, end))
        .collect()
}

/// Whether `candidate` overlaps any of `existing` on the same day.
pub fn conflicts_with<'a>(
    candidate: &TimeSlot,
    existing: impl IntoIterator<Item = &'a Schedule>,
) -> bool {
    existing
        .into_iter()
        .any(|s| candidate.overlaps(&s.slot()))
}

/// Schedule queries, conflict checks and deletions.
pub struct ScheduleService {
    schedules: Arc<dyn ScheduleStore>,
}

impl ScheduleService {
    pub fn new(schedules: Arc<dyn ScheduleStore>) -> Self {
        Self { schedules }
    }

    /// Checks `slot` against the teacher's persisted schedule.
    pub async fn has_conflict(&self, slot: &TimeSlot, teacher_id: &str) -> Result<bool, AppError> {
        let existing = self.schedules.find_by_teacher(teacher_id).await?;
        Ok(conflicts_with(slot, &existing))
    }

    /// Drops every candidate that collides with `pending` slots not yet
    /// written, or with the teacher's persisted slots unless the run is
    /// `replacing` them.
    pub async fn conflict_free_slots(
        &self,
        teacher_id: &str,
        candidates: Vec<TimeSlot>,
        pending: &[Schedule],
        replacing: bool,
    ) -> Result<Vec<TimeSlot>, AppError> {
        let pending: Vec<&Schedule> = pending.iter().filter(|s| s.teacher_id == teacher_id).collect();

        let mut free = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if conflicts_with(&candidate, pending.iter().copied()) {
                continue;
            }
            if !replacing && self.has_conflict(&candidate, teacher_id).await? {
                continue;
            }
            free.push(candidate);
        }

        debug!("teacher {}: {} conflict-free candidates", teacher_id, free.len());
        Ok(free)
    }

    pub async fn list(&self) -> Result<Vec<Schedule>, AppError> {
        self.schedules.find_all().await
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.schedules.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }

    pub async fn delete_by_day(&self, day: DayOfWeek) -> Result<u64, AppError> {
        let deleted = self.schedules.delete_by_day(day).await?;
        info!("deleted {} schedules on {}", deleted, day);
        Ok(deleted)
    }

    pub async fn clear_all(&self) -> Result<u64, AppError> {
        let deleted = self.schedules.delete_all().await?;
        info!("cleared all schedules ({} rows)", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn persisted(day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> Schedule {
        Schedule {
            id: "s1".to_string(),
            course_id: "c1".to_string(),
            teacher_id: "t1".to_string(),
            subject_id: "sub1".to_string(),
            day,
            start_time: start,
            end_time: end,
            name: None,
            created_at: "2025-09-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_four_hour_window_yields_four_slots() {
        let slots = generate_time_slots(DayOfWeek::Monday, time(8, 0), time(12, 0));
        let bounds: Vec<(NaiveTime, NaiveTime)> = slots.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(
            bounds,
            vec![
                (time(8, 0), time(9, 0)),
                (time(9, 0), time(10, 0)),
                (time(10, 0), time(11, 0)),
                (time(11, 0), time(12, 0)),
            ]
        );
    }

    #[test]
    fn test_short_window_yields_nothing() {
        assert!(generate_time_slots(DayOfWeek::Monday, time(8, 0), time(8, 30)).is_empty());
        assert!(generate_time_slots(DayOfWeek::Monday, time(10, 0), time(9, 0)).is_empty());
    }

    #[test]
    fn test_partial_tail_is_dropped() {
        let slots = generate_time_slots(DayOfWeek::Friday, time(13, 0), time(15, 45));
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].end, time(15, 0));
    }

    #[test]
    fn test_window_near_midnight_does_not_wrap() {
        let slots = generate_time_slots(DayOfWeek::Monday, time(22, 30), time(23, 59));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end, time(23, 30));
    }

    #[test]
    fn test_candidates_am_before_pm() {
        let row = Availability {
            id: "a1".to_string(),
            teacher_id: "t1".to_string(),
            day: DayOfWeek::Tuesday,
            am_start: Some(time(9, 0)),
            am_end: Some(time(11, 0)),
            pm_start: Some(time(14, 0)),
            pm_end: Some(time(15, 0)),
        };
        let starts: Vec<NaiveTime> = candidate_slots(&row).iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![time(9, 0), time(10, 0), time(14, 0)]);
    }

    #[test]
    fn test_incomplete_window_is_skipped() {
        let row = Availability {
            id: "a1".to_string(),
            teacher_id: "t1".to_string(),
            day: DayOfWeek::Tuesday,
            am_start: Some(time(9, 0)),
            am_end: None,
            pm_start: Some(time(14, 0)),
            pm_end: Some(time(16, 0)),
        };
        assert_eq!(candidate_slots(&row).len(), 2);
    }

    #[test]
    fn test_overlap_is_half_open() {
        let existing = vec![persisted(DayOfWeek::Monday, time(8, 0), time(9, 0))];

        let touching = TimeSlot::new(DayOfWeek::Monday, time(9, 0), time(10, 0));
        assert!(!conflicts_with(&touching, &existing));

        let before = TimeSlot::new(DayOfWeek::Monday, time(7, 0), time(8, 0));
        assert!(!conflicts_with(&before, &existing));

        let inside = TimeSlot::new(DayOfWeek::Monday, time(8, 30), time(9, 30));
        assert!(conflicts_with(&inside, &existing));

        let same = TimeSlot::new(DayOfWeek::Monday, time(8, 0), time(9, 0));
        assert!(conflicts_with(&same, &existing));

        let other_day = TimeSlot::new(DayOfWeek::Tuesday, time(8, 0), time(9, 0));
        assert!(!conflicts_with(&other_day, &existing));
    }
}
