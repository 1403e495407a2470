use std::collections::BTreeMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;

use crate::auth::auth::Actor;
use crate::model::day::DayPatch;
use crate::store::schedule::ScheduleStore;

/// Cross-user roster snapshot, company-scoped per the actor's role.
#[utoipa::path(
    get,
    path = "/api/v1/schedules",
    responses(
        (status = 200, description = "Schedules keyed by user id, then by date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("actor_id" = [])),
    tag = "Schedule"
)]
pub async fn all_schedules(
    actor: Actor,
    store: web::Data<ScheduleStore>,
) -> actix_web::Result<impl Responder> {
    let schedules = store.all_schedules(&actor.0).await?;
    Ok(HttpResponse::Ok().json(schedules))
}

/// One user's full schedule; empty object when nothing has been written yet.
#[utoipa::path(
    get,
    path = "/api/v1/schedules/{user_id}",
    params(
        ("user_id" = String, Path, description = "Schedule owner")
    ),
    responses(
        (status = 200, description = "Days keyed by date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("actor_id" = [])),
    tag = "Schedule"
)]
pub async fn get_schedule(
    actor: Actor,
    store: web::Data<ScheduleStore>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    let schedule = store.schedule_for(&actor.0, &user_id).await?;
    Ok(HttpResponse::Ok().json(schedule))
}

/// Merge-write of one day. Absent fields keep their stored value.
#[utoipa::path(
    put,
    path = "/api/v1/schedules/{user_id}/days/{date}",
    params(
        ("user_id" = String, Path, description = "Schedule owner"),
        ("date" = String, Path, description = "Day to write, YYYY-MM-DD")
    ),
    request_body = DayPatch,
    responses(
        (status = 200, description = "The merged day as persisted"),
        (status = 400, description = "Invalid patch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("actor_id" = [])),
    tag = "Schedule"
)]
pub async fn update_day(
    actor: Actor,
    store: web::Data<ScheduleStore>,
    path: web::Path<(String, NaiveDate)>,
    payload: web::Json<DayPatch>,
) -> actix_web::Result<impl Responder> {
    let (user_id, date) = path.into_inner();
    let day = store
        .upsert_day(&actor.0, &user_id, date, &payload)
        .await?;
    Ok(HttpResponse::Ok().json(day))
}

/// Merge-write of several days in one transaction (whole-week edits).
#[utoipa::path(
    put,
    path = "/api/v1/schedules/{user_id}/days",
    params(
        ("user_id" = String, Path, description = "Schedule owner")
    ),
    responses(
        (status = 200, description = "The merged days as persisted"),
        (status = 400, description = "Invalid patch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("actor_id" = [])),
    tag = "Schedule"
)]
pub async fn update_batch(
    actor: Actor,
    store: web::Data<ScheduleStore>,
    path: web::Path<String>,
    payload: web::Json<BTreeMap<NaiveDate, DayPatch>>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    let days = store
        .upsert_batch(&actor.0, &user_id, &payload)
        .await?;
    Ok(HttpResponse::Ok().json(days))
}
