use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapStatus {
    PendingTarget,
    PendingManager,
    Approved,
    Rejected,
}

impl SwapStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SwapStatus::Approved | SwapStatus::Rejected)
    }
}

/// A proposed exchange of two schedule slots between two employees. The two
/// dates may differ, which is what makes cross-day swaps possible.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SwapRequest {
    #[schema(example = "c2c1a9ce-9f6e-4c0a-8a57-2f12a3f4b9d0")]
    pub id: String,
    pub requester_id: String,
    pub target_id: String,
    #[schema(example = "2026-03-10", value_type = String, format = "date")]
    pub requester_date: NaiveDate,
    #[schema(example = "2026-03-12", value_type = String, format = "date")]
    pub target_date: NaiveDate,
    pub status: SwapStatus,
    #[schema(example = "2026-03-01T08:30:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSwapRequest {
    pub requester_id: String,
    pub target_id: String,
    #[schema(example = "2026-03-10", value_type = String, format = "date")]
    pub requester_date: NaiveDate,
    #[schema(example = "2026-03-12", value_type = String, format = "date")]
    pub target_date: NaiveDate,
}
