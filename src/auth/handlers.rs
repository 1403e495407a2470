use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::model::user::User;
use crate::store::directory::Directory;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "jane.doe")]
    pub username: String,
    pub password: String,
}

/// Login handler. Credentials are compared verbatim against the stored
/// fields; the matched user record is the session identity the client sends
/// back as `X-Actor-Id`.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials matched", body = User),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(directory, payload), fields(username = %payload.username))]
pub async fn login(
    payload: web::Json<LoginRequest>,
    directory: web::Data<Directory>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Ok(HttpResponse::BadRequest().body("Username or password required"));
    }

    match directory.login(&payload.username, &payload.password).await? {
        Some(user) => {
            info!(user_id = %user.id, "Login successful");
            Ok(HttpResponse::Ok().json(user))
        }
        None => {
            info!("Invalid credentials");
            Ok(HttpResponse::Unauthorized().body("Invalid credentials"))
        }
    }
}
