use std::collections::BTreeMap;
use std::net::SocketAddr;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::web::Data;
use actix_web::{App, test};
use chrono::NaiveDate;
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use shiftdesk::config::Config;
use shiftdesk::model::day::{DayType, ScheduleDay};
use shiftdesk::model::leave_request::LeaveRequest;
use shiftdesk::model::swap_request::SwapRequest;
use shiftdesk::model::user::User;
use shiftdesk::routes;
use shiftdesk::store::directory::Directory;
use shiftdesk::store::events::ChangeFeed;
use shiftdesk::store::leave::LeaveEngine;
use shiftdesk::store::schedule::ScheduleStore;
use shiftdesk::store::swap::SwapEngine;

fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        server_addr: "127.0.0.1:0".into(),
        rate_login_per_min: 60,
        rate_protected_per_min: 1000,
        change_feed_capacity: 16,
        api_prefix: "/api/v1".into(),
    }
}

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

async fn seed_user(pool: &SqlitePool, name: &str, role: &str, company: &str) -> String {
    let id = Uuid::new_v4().to_string();
    let username = format!("{}-{}", name.to_lowercase().replace(' ', "."), &id[..8]);
    sqlx::query(
        "INSERT INTO users (id, name, username, password, role, company_name) VALUES (?, ?, ?, 'secret', ?, ?)",
    )
    .bind(&id)
    .bind(name)
    .bind(&username)
    .bind(role)
    .bind(company)
    .execute(pool)
    .await
    .expect("failed to seed user");
    id
}

async fn test_app(
    pool: SqlitePool,
) -> impl Service<actix_http::Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>
{
    let config = test_config();
    let feed = ChangeFeed::new(config.change_feed_capacity);
    let config_for_routes = config.clone();
    test::init_service(
        App::new()
            .app_data(Data::new(config))
            .app_data(Data::new(feed.clone()))
            .app_data(Data::new(Directory::new(pool.clone(), feed.clone())))
            .app_data(Data::new(ScheduleStore::new(pool.clone(), feed.clone())))
            .app_data(Data::new(SwapEngine::new(pool.clone(), feed.clone())))
            .app_data(Data::new(LeaveEngine::new(pool.clone(), feed.clone())))
            .configure(move |cfg| routes::configure(cfg, config_for_routes.clone())),
    )
    .await
}

fn peer() -> SocketAddr {
    "127.0.0.1:43210".parse().unwrap()
}

fn shift_json() -> serde_json::Value {
    json!({
        "start_time": "09:00",
        "end_time": "17:30",
        "breaks": [
            {"start": "10:15", "end": "10:30"},
            {"start": "12:30", "end": "13:15"},
            {"start": "15:30", "end": "15:45"}
        ]
    })
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[actix_web::test]
async fn login_matches_stored_credentials() {
    let pool = memory_pool().await;
    let id = seed_user(&pool, "Sue Supervisor", "SUPERVISOR", "Acme").await;
    let app = test_app(pool.clone()).await;

    let username: String = sqlx::query_scalar("SELECT username FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(&pool)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(peer())
        .set_json(json!({"username": username, "password": "secret"}))
        .to_request();
    let user: User = test::call_and_read_body_json(&app, req).await;
    assert_eq!(user.id, id);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(peer())
        .set_json(json!({"username": username, "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn requests_without_an_actor_header_are_unauthorized() {
    let pool = memory_pool().await;
    let app = test_app(pool).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn swap_pipeline_exchanges_entries_over_http() {
    let pool = memory_pool().await;
    let manager = seed_user(&pool, "Mia Manager", "MANAGER", "Acme").await;
    let requester = seed_user(&pool, "Rae Requester", "EMPLOYEE", "Acme").await;
    let target = seed_user(&pool, "Tim Target", "EMPLOYEE", "Acme").await;
    let app = test_app(pool).await;

    // manager lays down the roster: requester works 03-10, target is off 03-12
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/schedules/{requester}/days/2099-03-10"))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({"type": "NORMAL_SHIFT", "shift": shift_json()}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/schedules/{target}/days/2099-03-12"))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({"type": "DAY_OFF"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // requester proposes the cross-day swap
    let req = test::TestRequest::post()
        .uri("/api/v1/swaps")
        .insert_header(("X-Actor-Id", requester.clone()))
        .peer_addr(peer())
        .set_json(json!({
            "requester_id": requester,
            "target_id": target,
            "requester_date": "2099-03-10",
            "target_date": "2099-03-12"
        }))
        .to_request();
    let swap: SwapRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(swap.status.to_string(), "PENDING_TARGET");

    // target accepts
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/swaps/{}/status", swap.id))
        .insert_header(("X-Actor-Id", target.clone()))
        .peer_addr(peer())
        .set_json(json!({"status": "PENDING_MANAGER"}))
        .to_request();
    let swap: SwapRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(swap.status.to_string(), "PENDING_MANAGER");

    // manager approves, the slots trade places
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/swaps/{}/status", swap.id))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({"status": "APPROVED"}))
        .to_request();
    let swap: SwapRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(swap.status.to_string(), "APPROVED");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/schedules/{requester}", requester = swap.requester_id))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .to_request();
    let schedule: BTreeMap<NaiveDate, ScheduleDay> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(schedule[&date("2099-03-10")].day_type, DayType::DayOff);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/schedules/{target}", target = swap.target_id))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .to_request();
    let schedule: BTreeMap<NaiveDate, ScheduleDay> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(schedule[&date("2099-03-12")].day_type, DayType::NormalShift);
    assert!(schedule[&date("2099-03-12")].shift.is_some());

    // terminal requests conflict, unknown ids are not found
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/swaps/{}/status", swap.id))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({"status": "APPROVED"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let req = test::TestRequest::put()
        .uri("/api/v1/swaps/nonexistent-id/status")
        .insert_header(("X-Actor-Id", manager))
        .peer_addr(peer())
        .set_json(json!({"status": "APPROVED"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn leave_pipeline_stamps_the_schedule_over_http() {
    let pool = memory_pool().await;
    let manager = seed_user(&pool, "Mia Manager", "MANAGER", "Acme").await;
    let employee = seed_user(&pool, "Eve Employee", "EMPLOYEE", "Acme").await;
    let app = test_app(pool).await;

    // existing shift on the requested date
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/schedules/{employee}/days/2099-04-01"))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({"type": "NORMAL_SHIFT", "shift": shift_json()}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // an early-leave request without the time of leaving is invalid
    let req = test::TestRequest::post()
        .uri("/api/v1/leaves")
        .insert_header(("X-Actor-Id", employee.clone()))
        .peer_addr(peer())
        .set_json(json!({
            "user_id": employee,
            "type": "EARLY_LEAVE",
            "date": "2099-04-01",
            "manager_id": manager
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/v1/leaves")
        .insert_header(("X-Actor-Id", employee.clone()))
        .peer_addr(peer())
        .set_json(json!({
            "user_id": employee,
            "type": "EARLY_LEAVE",
            "date": "2099-04-01",
            "early_leave_time": "15:00",
            "manager_id": manager
        }))
        .to_request();
    let leave: LeaveRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(leave.status.to_string(), "PENDING");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leaves/{}/status", leave.id))
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({"status": "APPROVED"}))
        .to_request();
    let leave: LeaveRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(leave.status.to_string(), "APPROVED");

    // classification changed, the underlying shift window survived
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/schedules/{employee}"))
        .insert_header(("X-Actor-Id", employee.clone()))
        .peer_addr(peer())
        .to_request();
    let schedule: BTreeMap<NaiveDate, ScheduleDay> = test::call_and_read_body_json(&app, req).await;
    let day = &schedule[&date("2099-04-01")];
    assert_eq!(day.day_type, DayType::EarlyLeave);
    let shift = day.shift.as_ref().expect("shift should survive approval");
    assert_eq!(shift.start_time.format("%H:%M").to_string(), "09:00");
    assert_eq!(shift.end_time.format("%H:%M").to_string(), "17:30");
}

#[actix_web::test]
async fn user_management_is_company_scoped_over_http() {
    let pool = memory_pool().await;
    let manager = seed_user(&pool, "Mia Manager", "MANAGER", "Acme").await;
    let app = test_app(pool).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({
            "name": "New Worker",
            "username": "new.worker",
            "password": "pw",
            "role": "EMPLOYEE",
            "company_name": "Acme"
        }))
        .to_request();
    let created: User = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(("X-Actor-Id", manager.clone()))
        .peer_addr(peer())
        .set_json(json!({
            "name": "Stranger",
            "username": "stranger",
            "password": "pw",
            "role": "EMPLOYEE",
            "company_name": "Globex"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    // the new employee cannot manage users
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{}", manager))
        .insert_header(("X-Actor-Id", created.id.clone()))
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}
