use crate::api::leave::LeaveDecision;
use crate::api::swap::SwapDecision;
use crate::auth::handlers::LoginRequest;
use crate::model::day::{BreakWindow, DayPatch, DayType, ScheduleDay, Shift};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::role::Role;
use crate::model::swap_request::{NewSwapRequest, SwapRequest, SwapStatus};
use crate::model::user::User;
use crate::store::directory::{NewUser, UpdateUser};
use crate::store::events::ChangeEvent;
use utoipa::Modify;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "actor_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Actor-Id"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shiftdesk API",
        version = "1.0.0",
        description = r#"
## Staff Scheduling Service

This API powers a staff-scheduling system: managers and supervisors define
shift rosters, employees view their schedules, trade shifts and request
leave.

### Key Features
- **Schedules**
  - Per-day roster entries with shift windows and three fixed breaks
  - Single-day and whole-week merge-writes
- **Shift Swaps**
  - Two-stage approval: target employee first, then a manager
  - Approval exchanges the two calendar slots atomically
- **Leave Requests**
  - Single-stage approval stamping the requester's calendar
- **Live Updates**
  - Server-sent change events for rosters and request queues

### Identity
Clients log in once and send the returned user id as the **X-Actor-Id**
header. Role and company checks are enforced server-side on every
operation.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::schedule::all_schedules,
        crate::api::schedule::get_schedule,
        crate::api::schedule::update_day,
        crate::api::schedule::update_batch,

        crate::api::swap::list_swaps,
        crate::api::swap::create_swap,
        crate::api::swap::decide_swap,

        crate::api::leave::list_leaves,
        crate::api::leave::create_leave,
        crate::api::leave::decide_leave,

        crate::api::events::events
    ),
    components(
        schemas(
            LoginRequest,
            User,
            Role,
            NewUser,
            UpdateUser,
            DayType,
            BreakWindow,
            Shift,
            ScheduleDay,
            DayPatch,
            SwapStatus,
            SwapRequest,
            NewSwapRequest,
            SwapDecision,
            LeaveStatus,
            LeaveRequest,
            NewLeaveRequest,
            LeaveDecision,
            ChangeEvent
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "User", description = "Directory management APIs"),
        (name = "Schedule", description = "Roster read and merge-write APIs"),
        (name = "Swap", description = "Shift swap approval pipeline"),
        (name = "Leave", description = "Leave request approval"),
        (name = "Events", description = "Live change notifications"),
    )
)]
pub struct ApiDoc;
