use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::Actor;
use crate::model::leave_request::{LeaveStatus, NewLeaveRequest};
use crate::store::leave::LeaveEngine;

#[derive(Deserialize, ToSchema)]
pub struct LeaveDecision {
    pub status: LeaveStatus,
}

/// Leave requests visible to the actor: own history for employees,
/// company-wide for managers, everything for supervisors.
#[utoipa::path(
    get,
    path = "/api/v1/leaves",
    responses(
        (status = 200, description = "Leave requests, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("actor_id" = [])),
    tag = "Leave"
)]
pub async fn list_leaves(
    actor: Actor,
    engine: web::Data<LeaveEngine>,
) -> actix_web::Result<impl Responder> {
    let leaves = engine.list_visible_to(&actor.0).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

/// Submits a leave request in PENDING.
#[utoipa::path(
    post,
    path = "/api/v1/leaves",
    request_body = NewLeaveRequest,
    responses(
        (status = 200, description = "The created request"),
        (status = 400, description = "Invalid type, time or approver"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Approver not found")
    ),
    security(("actor_id" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    actor: Actor,
    engine: web::Data<LeaveEngine>,
    payload: web::Json<NewLeaveRequest>,
) -> actix_web::Result<impl Responder> {
    let leave = engine.create(&actor.0, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// Approves or rejects a pending request; approval stamps the requester's
/// schedule in the same transaction.
#[utoipa::path(
    put,
    path = "/api/v1/leaves/{id}/status",
    params(
        ("id" = String, Path, description = "Leave request id")
    ),
    request_body = LeaveDecision,
    responses(
        (status = 200, description = "The request after the decision"),
        (status = 400, description = "Invalid decision"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor not allowed to decide"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already resolved")
    ),
    security(("actor_id" = [])),
    tag = "Leave"
)]
pub async fn decide_leave(
    actor: Actor,
    engine: web::Data<LeaveEngine>,
    path: web::Path<String>,
    payload: web::Json<LeaveDecision>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let leave = engine.decide(&actor.0, &id, payload.status).await?;
    Ok(HttpResponse::Ok().json(leave))
}
