use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum GenerationStatus {
    Running,
    Success,
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GenerationStatus::Running)
    }
}

/// Audit row for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationHistory {
    pub id: String,
    pub requested_by: String,
    pub created_at: String,
    pub status: GenerationStatus,
    pub total_generated: i64,
    pub message: Option<String>,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub dry_run: bool,
    pub force: bool,
    pub params: Option<String>,
}
