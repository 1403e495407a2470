use actix_web::{HttpResponse, Responder, web};

use crate::auth::auth::Actor;
use crate::store::directory::{Directory, NewUser, UpdateUser};

/// Directory listing; any authenticated user may read it (employees pick
/// their approver from it).
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "All user records, passwords omitted"),
        (status = 401, description = "Unauthorized")
    ),
    security(("actor_id" = [])),
    tag = "User"
)]
pub async fn list_users(
    _actor: Actor,
    directory: web::Data<Directory>,
) -> actix_web::Result<impl Responder> {
    let users = directory.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Create a user. Managers stay inside their own company; supervisors may
/// create anywhere.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = NewUser,
    responses(
        (status = 200, description = "The created user"),
        (status = 400, description = "Missing fields or username taken"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("actor_id" = [])),
    tag = "User"
)]
pub async fn create_user(
    actor: Actor,
    directory: web::Data<Directory>,
    payload: web::Json<NewUser>,
) -> actix_web::Result<impl Responder> {
    let user = directory.create(&actor.0, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Shallow update of a user record.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "The updated user"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("actor_id" = [])),
    tag = "User"
)]
pub async fn update_user(
    actor: Actor,
    directory: web::Data<Directory>,
    path: web::Path<String>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let user = directory
        .update(&actor.0, &id, payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Delete a user record. Schedule rows are left behind.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(("actor_id" = [])),
    tag = "User"
)]
pub async fn delete_user(
    actor: Actor,
    directory: web::Data<Directory>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    directory.delete(&actor.0, &id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Successfully deleted"
    })))
}
