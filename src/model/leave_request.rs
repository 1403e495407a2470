use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::model::day::{DayType, hhmm_opt};

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

/// A single-approval request to mark one date with a leave classification.
/// On approval the classification is merged into the requester's schedule.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = "f61e9d7a-33aa-4f9e-bd3e-6f1f2f0c9a44")]
    pub id: String,
    pub user_id: String,
    /// Display name captured at submission time.
    #[schema(example = "Jane Doe")]
    pub user_name: String,
    #[serde(rename = "type")]
    pub leave_type: DayType,
    #[schema(example = "2026-04-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(default, with = "hhmm_opt", skip_serializing_if = "Option::is_none")]
    #[schema(example = "15:00", value_type = String, nullable = true)]
    pub early_leave_time: Option<NaiveTime>,
    pub status: LeaveStatus,
    #[schema(example = "Acme Coffee", nullable = true)]
    pub company_name: Option<String>,
    pub manager_id: String,
    #[schema(example = "2026-03-01T08:30:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLeaveRequest {
    pub user_id: String,
    #[serde(rename = "type")]
    pub leave_type: DayType,
    #[schema(example = "2026-04-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[serde(default, with = "hhmm_opt")]
    #[schema(example = "15:00", value_type = String, nullable = true)]
    pub early_leave_time: Option<NaiveTime>,
    pub manager_id: String,
}
