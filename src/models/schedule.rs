use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DayOfWeek;

/// One persisted weekly class meeting.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: String,
    pub course_id: String,
    pub teacher_id: String,
    pub subject_id: String,
    pub day: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub name: Option<String>,
    pub created_at: String,
}

/// A candidate meeting produced from an availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    pub day: DayOfWeek,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> Self {
        Self { day, start, end }
    }

    /// Half-open overlap on the same day; touching boundaries do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.day == other.day && self.start < other.end && self.end > other.start
    }
}

impl Schedule {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.day, self.start_time, self.end_time)
    }
}
