use crate::{
    api::{events, leave, schedule, swap, user},
    auth::{handlers, middleware::actor_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(login_limiter.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes: actor resolution + rate limiting
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(actor_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/schedules")
                    // /schedules
                    .service(web::resource("").route(web::get().to(schedule::all_schedules)))
                    // /schedules/{user_id}
                    .service(
                        web::resource("/{user_id}")
                            .route(web::get().to(schedule::get_schedule)),
                    )
                    // /schedules/{user_id}/days
                    .service(
                        web::resource("/{user_id}/days")
                            .route(web::put().to(schedule::update_batch)),
                    )
                    // /schedules/{user_id}/days/{date}
                    .service(
                        web::resource("/{user_id}/days/{date}")
                            .route(web::put().to(schedule::update_day)),
                    ),
            )
            .service(
                web::scope("/swaps")
                    // /swaps
                    .service(
                        web::resource("")
                            .route(web::get().to(swap::list_swaps))
                            .route(web::post().to(swap::create_swap)),
                    )
                    // /swaps/{id}/status
                    .service(
                        web::resource("/{id}/status").route(web::put().to(swap::decide_swap)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    // /leaves
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list_leaves))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // /leaves/{id}/status
                    .service(
                        web::resource("/{id}/status").route(web::put().to(leave::decide_leave)),
                    ),
            )
            .service(web::resource("/events").route(web::get().to(events::events))),
    );
}
