use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DayOfWeek;

/// A teacher's AM/PM windows for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Availability {
    pub id: String,
    pub teacher_id: String,
    pub day: DayOfWeek,
    pub am_start: Option<NaiveTime>,
    pub am_end: Option<NaiveTime>,
    pub pm_start: Option<NaiveTime>,
    pub pm_end: Option<NaiveTime>,
}

impl Availability {
    pub fn am_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.am_start.zip(self.am_end)
    }

    pub fn pm_window(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.pm_start.zip(self.pm_end)
    }

    /// At least one complete window.
    pub fn has_valid_schedule(&self) -> bool {
        self.am_window().is_some() || self.pm_window().is_some()
    }

    /// Complete windows in AM, PM order.
    pub fn windows(&self) -> impl Iterator<Item = (NaiveTime, NaiveTime)> {
        self.am_window().into_iter().chain(self.pm_window())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRequest {
    pub day: DayOfWeek,
    #[serde(default)]
    pub am_start: Option<NaiveTime>,
    #[serde(default)]
    pub am_end: Option<NaiveTime>,
    #[serde(default)]
    pub pm_start: Option<NaiveTime>,
    #[serde(default)]
    pub pm_end: Option<NaiveTime>,
}
