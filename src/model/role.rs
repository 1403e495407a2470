use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Supervisor,
    Manager,
    Employee,
}

impl Role {
    /// Managers and supervisors may edit schedules and adjudicate requests.
    pub fn is_management(self) -> bool {
        matches!(self, Role::Supervisor | Role::Manager)
    }
}
