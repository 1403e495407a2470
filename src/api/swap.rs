use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::auth::Actor;
use crate::model::swap_request::{NewSwapRequest, SwapStatus};
use crate::store::swap::SwapEngine;

#[derive(Deserialize, ToSchema)]
pub struct SwapDecision {
    pub status: SwapStatus,
}

/// Swaps visible to the actor: own for employees, company-wide for managers,
/// everything for supervisors.
#[utoipa::path(
    get,
    path = "/api/v1/swaps",
    responses(
        (status = 200, description = "Swap requests, newest first"),
        (status = 401, description = "Unauthorized")
    ),
    security(("actor_id" = [])),
    tag = "Swap"
)]
pub async fn list_swaps(
    actor: Actor,
    engine: web::Data<SwapEngine>,
) -> actix_web::Result<impl Responder> {
    let swaps = engine.list_visible_to(&actor.0).await?;
    Ok(HttpResponse::Ok().json(swaps))
}

/// Opens a swap proposal in PENDING_TARGET.
#[utoipa::path(
    post,
    path = "/api/v1/swaps",
    request_body = NewSwapRequest,
    responses(
        (status = 200, description = "The created request"),
        (status = 400, description = "Invalid dates or parties"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Party not found")
    ),
    security(("actor_id" = [])),
    tag = "Swap"
)]
pub async fn create_swap(
    actor: Actor,
    engine: web::Data<SwapEngine>,
    payload: web::Json<NewSwapRequest>,
) -> actix_web::Result<impl Responder> {
    let swap = engine.create(&actor.0, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(swap))
}

/// Applies one transition of the approval pipeline. Who may trigger which
/// edge is enforced by the engine, not the client.
#[utoipa::path(
    put,
    path = "/api/v1/swaps/{id}/status",
    params(
        ("id" = String, Path, description = "Swap request id")
    ),
    request_body = SwapDecision,
    responses(
        (status = 200, description = "The request after the transition"),
        (status = 400, description = "Illegal transition"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Actor not allowed for this transition"),
        (status = 404, description = "Swap request not found"),
        (status = 409, description = "Request already resolved")
    ),
    security(("actor_id" = [])),
    tag = "Swap"
)]
pub async fn decide_swap(
    actor: Actor,
    engine: web::Data<SwapEngine>,
    path: web::Path<String>,
    payload: web::Json<SwapDecision>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let swap = engine.decide(&actor.0, &id, payload.status).await?;
    Ok(HttpResponse::Ok().json(swap))
}
