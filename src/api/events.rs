use actix_web::{HttpResponse, Responder, web};
use futures_util::stream;
use tokio::sync::broadcast::error::RecvError;

use crate::auth::auth::Actor;
use crate::store::events::ChangeFeed;

/// Server-sent events carrying one change notification per committed write.
/// Events name the touched collection and id; clients refetch the snapshot
/// they display. A lagging client simply misses intermediate notifications
/// and resynchronizes on the next one.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    responses(
        (status = 200, description = "text/event-stream of change events"),
        (status = 401, description = "Unauthorized")
    ),
    security(("actor_id" = [])),
    tag = "Events"
)]
pub async fn events(_actor: Actor, feed: web::Data<ChangeFeed>) -> impl Responder {
    let rx = feed.subscribe();
    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(_) => continue,
                    };
                    let chunk = web::Bytes::from(format!("data: {payload}\n\n"));
                    return Some((Ok::<_, std::convert::Infallible>(chunk), rx));
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    HttpResponse::Ok()
        .insert_header(("Content-Type", "text/event-stream"))
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
