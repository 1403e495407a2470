use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;

use shiftdesk::config::Config;
use shiftdesk::db::init_db;
use shiftdesk::docs::ApiDoc;
use shiftdesk::routes;
use shiftdesk::store::directory::Directory;
use shiftdesk::store::events::ChangeFeed;
use shiftdesk::store::leave::LeaveEngine;
use shiftdesk::store::schedule::ScheduleStore;
use shiftdesk::store::swap::SwapEngine;
use shiftdesk::utils::user_cache;

use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Shiftdesk"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let feed = ChangeFeed::new(config.change_feed_capacity);
    let directory = Directory::new(pool.clone(), feed.clone());
    let schedules = ScheduleStore::new(pool.clone(), feed.clone());
    let swaps = SwapEngine::new(pool.clone(), feed.clone());
    let leaves = LeaveEngine::new(pool.clone(), feed.clone());

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    let pool_for_cache_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = user_cache::warmup_user_cache(&pool_for_cache_warmup, 250).await {
            eprintln!("Failed to warmup user cache: {:?}", e);
        }
    });

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                // wildcard {_:.*} so the UI's JS/CSS assets resolve
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(Data::new(feed.clone()))
            .app_data(Data::new(directory.clone()))
            .app_data(Data::new(schedules.clone()))
            .app_data(Data::new(swaps.clone()))
            .app_data(Data::new(leaves.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
