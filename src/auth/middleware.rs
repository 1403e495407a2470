use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

use crate::auth::auth::Actor;
use crate::store::directory::Directory;

/// Resolves the `X-Actor-Id` header to a directory record and stores it in
/// the request extensions. Identity is taken at face value; credential
/// handling stays at the login boundary, the engines enforce what the actor
/// may actually do.
pub async fn actor_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let directory = req
        .app_data::<Data<Directory>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Directory missing"))?
        .clone();

    let header_value = match req.headers().get("X-Actor-Id") {
        Some(h) => h.to_str().map_err(|_| {
            actix_web::error::ErrorUnauthorized(json!({"error": "Invalid X-Actor-Id encoding"}))
        })?,
        None => {
            let resp =
                HttpResponse::Unauthorized().json(json!({"error": "Missing X-Actor-Id header"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    let user = match directory.user(header_value).await {
        Ok(user) => user,
        Err(crate::error::Error::NotFound(_)) => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": "Unknown actor"}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
        Err(e) => return Err(e.into()),
    };

    req.extensions_mut().insert(Actor(user));

    next.call(req).await
}
