use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::model::user::User;

/// The resolved caller, inserted into request extensions by
/// [`crate::auth::middleware::actor_middleware`]. Handlers take it as an
/// extractor and hand its user record to the engines' guards.
#[derive(Clone)]
pub struct Actor(pub User);

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<Actor>() {
            Some(actor) => ready(Ok(actor.clone())),
            None => ready(Err(ErrorUnauthorized("No actor resolved"))),
        }
    }
}
